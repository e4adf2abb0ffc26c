use std::sync::{mpsc, Arc};
use std::thread;

use plate_core::{
    AnalysisFailure, AnalysisPhase, Effect, ImageSelection, MealResult, Msg, RequestFailure,
    SessionContext,
};
use plate_engine::{
    AnalysisEvent, ApiError, EngineEvent, EngineEvents, EngineHandle, IdentityStore, ImageUpload,
    KeyValueStore, MealRecord, PollFailure, PollerState, ReqwestMealApi, StoredSession,
};
use plate_logging::{plate_error, plate_info};

use super::app::AppEvent;
use super::config::AppConfig;

/// Executes core effects against the engine and the identity store.
pub struct EffectRunner<S: KeyValueStore> {
    engine: EngineHandle,
    store: IdentityStore<S>,
}

impl<S: KeyValueStore> EffectRunner<S> {
    pub fn new(
        config: &AppConfig,
        store: IdentityStore<S>,
        event_tx: mpsc::Sender<AppEvent>,
    ) -> anyhow::Result<Self> {
        let api = ReqwestMealApi::new(config.api.clone())?;
        let (engine, events) = EngineHandle::new(Arc::new(api), config.timings)?;
        spawn_event_loop(events, event_tx)?;
        Ok(Self { engine, store })
    }

    pub fn session(&self) -> SessionContext {
        to_core_session(self.store.session())
    }

    pub fn enqueue(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::CreateUser { name, email } => {
                    plate_info!("CreateUser name_len={} email_len={}", name.len(), email.len());
                    self.engine.create_user(name, email);
                }
                Effect::StoreUserId(user_id) => {
                    if let Err(err) = self.store.set_user_id(&user_id) {
                        plate_error!("Failed to persist user id: {}", err);
                    }
                }
                Effect::UploadImage { user_id, image } => {
                    plate_info!(
                        "UploadImage file={} type={} bytes={}",
                        image.file_name,
                        image.mime_type,
                        image.bytes.len()
                    );
                    self.engine.upload_image(user_id, to_upload(image));
                }
                Effect::StoreEventId(event_id) => {
                    if let Err(err) = self.store.set_event_id(&event_id) {
                        plate_error!("Failed to persist event id: {}", err);
                    }
                }
                Effect::StartAnalysis { run_id, session } => {
                    plate_info!("StartAnalysis run_id={}", run_id);
                    self.engine.start_analysis(run_id, to_stored_session(session));
                }
                Effect::CancelAnalysis { run_id } => {
                    self.engine.cancel_analysis(run_id);
                }
            }
        }
    }
}

fn spawn_event_loop(events: EngineEvents, event_tx: mpsc::Sender<AppEvent>) -> std::io::Result<()> {
    thread::Builder::new()
        .name("plate-events".to_string())
        .spawn(move || {
            while let Some(event) = events.recv() {
                if event_tx.send(AppEvent::Core(map_event(event))).is_err() {
                    break;
                }
            }
        })?;
    Ok(())
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::UserCreated(result) => Msg::UserCreated(result.map_err(request_failure)),
        EngineEvent::UploadFinished(result) => {
            Msg::UploadFinished(result.map_err(request_failure))
        }
        EngineEvent::Analysis { run_id, event } => match event {
            AnalysisEvent::State(state) => Msg::AnalysisPhaseChanged {
                run_id,
                phase: map_phase(state),
            },
            AnalysisEvent::Progress(percent) => Msg::AnalysisProgress { run_id, percent },
            AnalysisEvent::Finished(result) => Msg::AnalysisFinished {
                run_id,
                outcome: result
                    .map(|meals| meals.into_iter().map(to_meal_result).collect())
                    .map_err(map_failure),
            },
        },
    }
}

fn map_phase(state: PollerState) -> AnalysisPhase {
    match state {
        PollerState::Initializing => AnalysisPhase::Initializing,
        PollerState::Polling => AnalysisPhase::Polling,
        PollerState::FetchingResults => AnalysisPhase::FetchingResults,
        PollerState::Done => AnalysisPhase::Done,
        PollerState::Failed => AnalysisPhase::Failed,
    }
}

fn map_failure(failure: PollFailure) -> AnalysisFailure {
    match failure {
        PollFailure::MissingAnalysisData => AnalysisFailure::MissingAnalysisData,
        PollFailure::AnalysisFailed => AnalysisFailure::AnalysisFailed,
        PollFailure::Request(err) => AnalysisFailure::Request(request_failure(err)),
    }
}

fn request_failure(err: ApiError) -> RequestFailure {
    RequestFailure(err.to_string())
}

fn to_meal_result(record: MealRecord) -> MealResult {
    MealResult {
        name: record.name,
        calories: record.calories,
        proteins: record.proteins,
        carbs: record.carbs,
        fats: record.fats,
        ai_insights: record.ai_insights,
        tips: record.tips,
    }
}

fn to_upload(image: ImageSelection) -> ImageUpload {
    ImageUpload {
        file_name: image.file_name,
        mime_type: image.mime_type,
        bytes: image.bytes,
    }
}

fn to_stored_session(session: SessionContext) -> StoredSession {
    StoredSession {
        user_id: session.user_id,
        event_id: session.event_id,
    }
}

fn to_core_session(session: StoredSession) -> SessionContext {
    SessionContext::new(session.user_id, session.event_id)
}
