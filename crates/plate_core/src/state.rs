use std::collections::VecDeque;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::notice::Notification;
use crate::view_model::{AnalysisView, AppViewModel, CaptureView, LoginView, ResultsView};

/// Opaque identifier of the logged-in user.
pub type UserId = String;
/// Opaque identifier of one in-flight analysis job.
pub type EventId = String;
/// Identifies one poller instance; bumped on every analysis start.
pub type AnalysisRunId = u64;

/// MIME types accepted for a meal photo.
pub const ACCEPTED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];

pub fn is_accepted_image_type(mime_type: &str) -> bool {
    ACCEPTED_IMAGE_TYPES.contains(&mime_type)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Login,
    Capture,
    Analyzing,
    Results,
}

/// Identifiers mirrored from the persistent store.
///
/// Passed explicitly to whoever needs them instead of being looked up from
/// ambient storage.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionContext {
    pub user_id: Option<UserId>,
    pub event_id: Option<EventId>,
}

impl SessionContext {
    pub fn new(user_id: Option<UserId>, event_id: Option<EventId>) -> Self {
        Self { user_id, event_id }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn event_id(&self) -> Option<&str> {
        self.event_id.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSelection {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageSelection {
    /// Data URL used for display only; never uploaded.
    pub fn preview_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MealResult {
    pub name: String,
    pub calories: f64,
    pub proteins: f64,
    pub carbs: f64,
    pub fats: f64,
    pub ai_insights: String,
    pub tips: Vec<String>,
}

/// Opaque description of a failed backend request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFailure(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisPhase {
    Initializing,
    Polling,
    FetchingResults,
    Done,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisFailure {
    MissingAnalysisData,
    AnalysisFailed,
    Request(RequestFailure),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct LoginForm {
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) submitting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct CaptureForm {
    pub(crate) selection: Option<ImageSelection>,
    pub(crate) preview: Option<String>,
    pub(crate) uploading: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AnalysisRun {
    pub(crate) run_id: AnalysisRunId,
    pub(crate) phase: AnalysisPhase,
    pub(crate) progress: u8,
    pub(crate) failure: Option<AnalysisFailure>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    view: View,
    session: SessionContext,
    login: LoginForm,
    capture: CaptureForm,
    analysis: Option<AnalysisRun>,
    results: Option<Vec<MealResult>>,
    next_run_id: AnalysisRunId,
    notifications: VecDeque<Notification>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_view(&self) -> View {
        self.view
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            view: self.view,
            login: LoginView {
                name: self.login.name.clone(),
                email: self.login.email.clone(),
                submitting: self.login.submitting,
            },
            capture: CaptureView {
                file_name: self
                    .capture
                    .selection
                    .as_ref()
                    .map(|selection| selection.file_name.clone()),
                preview: self.capture.preview.clone(),
                uploading: self.capture.uploading,
            },
            analysis: self.analysis.as_ref().map(|run| AnalysisView {
                phase: run.phase,
                progress: run.progress,
                failed: run.failure.is_some(),
            }),
            results: ResultsView::from_meals(self.results.as_deref()),
        }
    }

    /// Returns whether the state changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Drains notifications queued since the last call, oldest first.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain(..).collect()
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn notify(&mut self, notification: Notification) {
        self.notifications.push_back(notification);
        self.mark_dirty();
    }

    pub(crate) fn set_view(&mut self, view: View) {
        if self.view != view {
            self.view = view;
            self.mark_dirty();
        }
    }

    pub(crate) fn session_mut(&mut self) -> &mut SessionContext {
        &mut self.session
    }

    pub(crate) fn login_mut(&mut self) -> &mut LoginForm {
        &mut self.login
    }

    pub(crate) fn login(&self) -> &LoginForm {
        &self.login
    }

    pub(crate) fn capture_mut(&mut self) -> &mut CaptureForm {
        &mut self.capture
    }

    pub(crate) fn capture(&self) -> &CaptureForm {
        &self.capture
    }

    /// Returns the active run if `run_id` is current; stale runs yield `None`.
    pub(crate) fn analysis_for(&mut self, run_id: AnalysisRunId) -> Option<&mut AnalysisRun> {
        self.analysis.as_mut().filter(|run| run.run_id == run_id)
    }

    pub(crate) fn begin_analysis(&mut self) -> AnalysisRunId {
        self.next_run_id += 1;
        let run_id = self.next_run_id;
        self.analysis = Some(AnalysisRun {
            run_id,
            phase: AnalysisPhase::Initializing,
            progress: 0,
            failure: None,
        });
        self.mark_dirty();
        run_id
    }

    /// Drops the active run; returns its id when one was still running.
    pub(crate) fn end_analysis(&mut self) -> Option<AnalysisRunId> {
        let run = self.analysis.take()?;
        self.mark_dirty();
        match run.phase {
            AnalysisPhase::Done | AnalysisPhase::Failed => None,
            _ => Some(run.run_id),
        }
    }

    pub(crate) fn set_results(&mut self, meals: Vec<MealResult>) {
        self.results = Some(meals);
        self.mark_dirty();
    }

    pub(crate) fn clear_results(&mut self) {
        if self.results.take().is_some() {
            self.mark_dirty();
        }
    }
}
