use std::sync::{mpsc, Arc};
use std::thread;

use plate_logging::{plate_error, plate_info};
use tokio::sync::mpsc as async_mpsc;
use tokio_util::sync::CancellationToken;

use crate::api::MealApi;
use crate::poller::{AnalysisPoller, ChannelAnalysisSink, PollerTimings};
use crate::{EngineEvent, ImageUpload, RunId, StoredSession};

enum EngineCommand {
    CreateUser {
        name: String,
        email: String,
    },
    UploadImage {
        user_id: String,
        image: ImageUpload,
    },
    StartAnalysis {
        run_id: RunId,
        session: StoredSession,
    },
    CancelAnalysis {
        run_id: RunId,
    },
}

/// Runs backend calls and the analysis poller on a dedicated thread.
///
/// The thread drives a current-thread tokio runtime, so every task shares
/// one logical thread of control. Results come back through [`EngineEvents`].
pub struct EngineHandle {
    cmd_tx: async_mpsc::UnboundedSender<EngineCommand>,
}

/// Receiving half of the engine; may live on another thread than the handle.
pub struct EngineEvents {
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineEvents {
    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Blocks until the next event; `None` once the engine thread is gone.
    pub fn recv(&self) -> Option<EngineEvent> {
        self.event_rx.recv().ok()
    }
}

impl EngineHandle {
    pub fn new(
        api: Arc<dyn MealApi>,
        timings: PollerTimings,
    ) -> std::io::Result<(Self, EngineEvents)> {
        let (cmd_tx, cmd_rx) = async_mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        thread::Builder::new()
            .name("plate-engine".to_string())
            .spawn(move || {
                runtime.block_on(command_loop(api, timings, cmd_rx, event_tx));
            })?;

        Ok((Self { cmd_tx }, EngineEvents { event_rx }))
    }

    pub fn create_user(&self, name: impl Into<String>, email: impl Into<String>) {
        self.send(EngineCommand::CreateUser {
            name: name.into(),
            email: email.into(),
        });
    }

    pub fn upload_image(&self, user_id: impl Into<String>, image: ImageUpload) {
        self.send(EngineCommand::UploadImage {
            user_id: user_id.into(),
            image,
        });
    }

    /// Starts polling; any analysis still running is cancelled first.
    pub fn start_analysis(&self, run_id: RunId, session: StoredSession) {
        self.send(EngineCommand::StartAnalysis { run_id, session });
    }

    pub fn cancel_analysis(&self, run_id: RunId) {
        self.send(EngineCommand::CancelAnalysis { run_id });
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            plate_error!("Engine thread is gone; command dropped");
        }
    }
}

async fn command_loop(
    api: Arc<dyn MealApi>,
    timings: PollerTimings,
    mut cmd_rx: async_mpsc::UnboundedReceiver<EngineCommand>,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let mut active: Option<(RunId, CancellationToken)> = None;

    while let Some(command) = cmd_rx.recv().await {
        match command {
            EngineCommand::CreateUser { name, email } => {
                let api = api.clone();
                let event_tx = event_tx.clone();
                tokio::spawn(async move {
                    let result = api.create_user(&name, &email).await;
                    let _ = event_tx.send(EngineEvent::UserCreated(result));
                });
            }
            EngineCommand::UploadImage { user_id, image } => {
                let api = api.clone();
                let event_tx = event_tx.clone();
                tokio::spawn(async move {
                    let result = api.start_analysis(&user_id, &image).await;
                    let _ = event_tx.send(EngineEvent::UploadFinished(result));
                });
            }
            EngineCommand::StartAnalysis { run_id, session } => {
                if let Some((previous, token)) = active.take() {
                    plate_info!("Analysis run {} superseded by run {}", previous, run_id);
                    token.cancel();
                }
                let cancel = CancellationToken::new();
                active = Some((run_id, cancel.clone()));

                let poller = AnalysisPoller::new(api.clone(), timings);
                let sink = Arc::new(ChannelAnalysisSink::new(run_id, event_tx.clone()));
                tokio::spawn(async move {
                    let outcome = poller.run(session, sink, cancel).await;
                    plate_info!("Analysis run {} ended: {:?}", run_id, outcome);
                });
            }
            EngineCommand::CancelAnalysis { run_id } => match active.take() {
                Some((current, token)) if current == run_id => {
                    plate_info!("Analysis run {} cancelled", run_id);
                    token.cancel();
                }
                other => active = other,
            },
        }
    }

    if let Some((_, token)) = active {
        token.cancel();
    }
}
