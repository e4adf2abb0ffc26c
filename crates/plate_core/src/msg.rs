use crate::{
    AnalysisFailure, AnalysisPhase, AnalysisRunId, EventId, ImageSelection, MealResult,
    RequestFailure, SessionContext, UserId,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Identifiers read from the persistent store at startup.
    SessionLoaded(SessionContext),
    /// User edited the name field of the login form.
    LoginNameChanged(String),
    /// User edited the email field of the login form.
    LoginEmailChanged(String),
    /// User submitted the login form.
    LoginSubmitted,
    /// Backend answered the user-creation request.
    UserCreated(Result<UserId, RequestFailure>),
    /// User picked an image file.
    ImageSelected(ImageSelection),
    /// User asked to analyze the selected image.
    UploadClicked,
    /// Backend answered the upload request.
    UploadFinished(Result<EventId, RequestFailure>),
    /// Poller moved to a new phase.
    AnalysisPhaseChanged {
        run_id: AnalysisRunId,
        phase: AnalysisPhase,
    },
    /// Pseudo-progress update, in percent.
    AnalysisProgress { run_id: AnalysisRunId, percent: u8 },
    /// Poller reached a terminal state.
    AnalysisFinished {
        run_id: AnalysisRunId,
        outcome: Result<Vec<MealResult>, AnalysisFailure>,
    },
    /// User asked to start over from the capture view.
    RestartClicked,
}
