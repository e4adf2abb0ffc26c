use crate::{
    is_accepted_image_type, AnalysisFailure, AnalysisPhase, AppState, Effect, Msg, Notification,
    View,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::SessionLoaded(session) => {
            if state.current_view() != View::Login {
                return (state, Vec::new());
            }
            let logged_in = session.user_id().is_some();
            *state.session_mut() = session;
            state.mark_dirty();
            if logged_in {
                state.set_view(View::Capture);
            }
            Vec::new()
        }
        Msg::LoginNameChanged(name) => {
            if state.current_view() == View::Login && !state.login().submitting {
                state.login_mut().name = name;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::LoginEmailChanged(email) => {
            if state.current_view() == View::Login && !state.login().submitting {
                state.login_mut().email = email;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::LoginSubmitted => {
            if state.current_view() != View::Login || state.login().submitting {
                return (state, Vec::new());
            }
            let name = state.login().name.trim().to_owned();
            let email = state.login().email.trim().to_owned();
            if name.is_empty() || email.is_empty() {
                state.notify(Notification::MissingInformation);
                return (state, Vec::new());
            }
            state.login_mut().submitting = true;
            state.mark_dirty();
            vec![Effect::CreateUser { name, email }]
        }
        Msg::UserCreated(result) => {
            // A response only counts for the submission that is waiting on it.
            if state.current_view() != View::Login || !state.login().submitting {
                return (state, Vec::new());
            }
            state.login_mut().submitting = false;
            match result {
                Ok(user_id) => {
                    state.session_mut().user_id = Some(user_id.clone());
                    state.notify(Notification::Welcome);
                    state.set_view(View::Capture);
                    vec![Effect::StoreUserId(user_id)]
                }
                Err(_) => {
                    state.notify(Notification::LoginFailed);
                    Vec::new()
                }
            }
        }
        Msg::ImageSelected(selection) => {
            if state.current_view() != View::Capture || state.capture().uploading {
                return (state, Vec::new());
            }
            if !is_accepted_image_type(&selection.mime_type) {
                state.notify(Notification::InvalidFileType);
                return (state, Vec::new());
            }
            let capture = state.capture_mut();
            capture.preview = Some(selection.preview_data_url());
            capture.selection = Some(selection);
            state.mark_dirty();
            Vec::new()
        }
        Msg::UploadClicked => {
            if state.current_view() != View::Capture || state.capture().uploading {
                return (state, Vec::new());
            }
            let Some(image) = state.capture().selection.clone() else {
                return (state, Vec::new());
            };
            let Some(user_id) = state.session().user_id.clone() else {
                state.notify(Notification::UserIdNotFound);
                return (state, Vec::new());
            };
            state.capture_mut().uploading = true;
            state.mark_dirty();
            vec![Effect::UploadImage { user_id, image }]
        }
        Msg::UploadFinished(result) => {
            if state.current_view() != View::Capture || !state.capture().uploading {
                return (state, Vec::new());
            }
            state.capture_mut().uploading = false;
            state.mark_dirty();
            match result {
                Ok(event_id) => {
                    state.session_mut().event_id = Some(event_id.clone());
                    *state.capture_mut() = Default::default();
                    state.notify(Notification::ImageUploaded);
                    state.set_view(View::Analyzing);
                    let run_id = state.begin_analysis();
                    vec![
                        Effect::StoreEventId(event_id),
                        Effect::StartAnalysis {
                            run_id,
                            session: state.session().clone(),
                        },
                    ]
                }
                Err(_) => {
                    state.notify(Notification::UploadFailed);
                    Vec::new()
                }
            }
        }
        Msg::AnalysisPhaseChanged { run_id, phase } => {
            let changed = match state.analysis_for(run_id) {
                Some(run) if run.phase != phase => {
                    run.phase = phase;
                    true
                }
                _ => false,
            };
            if changed {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::AnalysisProgress { run_id, percent } => {
            let changed = match state.analysis_for(run_id) {
                Some(run) if run.progress != percent => {
                    run.progress = percent.min(100);
                    true
                }
                _ => false,
            };
            if changed {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::AnalysisFinished { run_id, outcome } => {
            if state.current_view() != View::Analyzing {
                return (state, Vec::new());
            }
            let Some(run) = state.analysis_for(run_id) else {
                return (state, Vec::new());
            };
            match outcome {
                Ok(meals) => {
                    run.phase = AnalysisPhase::Done;
                    run.progress = 100;
                    state.end_analysis();
                    state.set_results(meals);
                    state.set_view(View::Results);
                }
                Err(failure) => {
                    run.phase = AnalysisPhase::Failed;
                    let notification = match &failure {
                        AnalysisFailure::MissingAnalysisData => Notification::MissingAnalysisData,
                        AnalysisFailure::AnalysisFailed => Notification::AnalysisFailed,
                        AnalysisFailure::Request(_) => Notification::AnalysisError,
                    };
                    run.failure = Some(failure);
                    state.notify(notification);
                }
            }
            Vec::new()
        }
        Msg::RestartClicked => match state.current_view() {
            View::Analyzing => {
                let cancelled = state.end_analysis();
                state.set_view(View::Capture);
                cancelled
                    .map(|run_id| vec![Effect::CancelAnalysis { run_id }])
                    .unwrap_or_default()
            }
            View::Results => {
                state.clear_results();
                *state.capture_mut() = Default::default();
                state.set_view(View::Capture);
                Vec::new()
            }
            View::Login | View::Capture => Vec::new(),
        },
    };

    (state, effects)
}
