//! Plate engine: backend client, identity storage and the analysis poller.
mod api;
mod engine;
mod persist;
mod poller;
mod progress;
mod store;
mod types;

pub use api::{ApiSettings, MealApi, ReqwestMealApi};
pub use engine::{EngineEvents, EngineHandle};
pub use persist::{ensure_state_dir, read_if_exists, AtomicFileWriter, PersistError};
pub use poller::{AnalysisPoller, AnalysisSink, ChannelAnalysisSink, PollOutcome, PollerTimings};
pub use progress::{PseudoProgress, MAX_STEP, PROGRESS_CAP};
pub use store::{
    IdentityStore, KeyValueStore, MemoryStore, StoreError, EVENT_ID_KEY, USER_ID_KEY,
};
pub use types::{
    AnalysisEvent, ApiError, EngineEvent, FailureKind, ImageUpload, JobStatus, MealRecord,
    PollFailure, PollerState, RunId, StoredSession,
};
