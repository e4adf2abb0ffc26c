use crate::{AnalysisRunId, EventId, ImageSelection, SessionContext, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    CreateUser { name: String, email: String },
    StoreUserId(UserId),
    UploadImage { user_id: UserId, image: ImageSelection },
    StoreEventId(EventId),
    StartAnalysis {
        run_id: AnalysisRunId,
        session: SessionContext,
    },
    CancelAnalysis { run_id: AnalysisRunId },
}
