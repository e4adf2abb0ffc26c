//! Plate core: pure view-state machine and view-model helpers.
mod effect;
mod msg;
mod notice;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use notice::{Notification, Severity};
pub use state::{
    is_accepted_image_type, AnalysisFailure, AnalysisPhase, AnalysisRunId, AppState, EventId,
    ImageSelection, MealResult, RequestFailure, SessionContext, UserId, View,
    ACCEPTED_IMAGE_TYPES,
};
pub use update::update;
pub use view_model::{
    AnalysisView, AppViewModel, CaptureView, LoginView, MealCard, NumberedTip, ResultsView,
};
