//! Analysis poller: waits for a backend job to finish, then fetches results.
//!
//! One poller instance owns one [`CancellationToken`]. Every suspension point
//! (initial delay, retry interval, settle delay, in-flight requests and the
//! progress ticker) races against that token, so cancelling it stops all
//! further requests and events.

use std::future::Future;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use plate_logging::{plate_debug, plate_info, plate_warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio_util::sync::CancellationToken;

use crate::api::MealApi;
use crate::progress::spawn_ticker;
use crate::{
    AnalysisEvent, EngineEvent, JobStatus, MealRecord, PollFailure, PollerState, RunId,
    StoredSession,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerTimings {
    pub initial_delay: Duration,
    pub retry_interval: Duration,
    pub settle_delay: Duration,
    pub progress_interval: Duration,
}

impl Default for PollerTimings {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1000),
            retry_interval: Duration::from_millis(2000),
            settle_delay: Duration::from_millis(1000),
            progress_interval: Duration::from_millis(500),
        }
    }
}

pub trait AnalysisSink: Send + Sync {
    fn emit(&self, event: AnalysisEvent);
}

/// Forwards analysis events, tagged with their run, onto the engine channel.
pub struct ChannelAnalysisSink {
    run_id: RunId,
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelAnalysisSink {
    pub fn new(run_id: RunId, tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { run_id, tx }
    }
}

impl AnalysisSink for ChannelAnalysisSink {
    fn emit(&self, event: AnalysisEvent) {
        let _ = self.tx.send(EngineEvent::Analysis {
            run_id: self.run_id,
            event,
        });
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Done(Vec<MealRecord>),
    Failed(PollFailure),
    Cancelled,
}

/// Non-terminal poller states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Active {
    Initializing,
    Polling,
    FetchingResults,
}

impl From<Active> for PollerState {
    fn from(active: Active) -> Self {
        match active {
            Active::Initializing => PollerState::Initializing,
            Active::Polling => PollerState::Polling,
            Active::FetchingResults => PollerState::FetchingResults,
        }
    }
}

pub struct AnalysisPoller<A: ?Sized> {
    api: Arc<A>,
    timings: PollerTimings,
    progress_seed: Option<u64>,
}

impl<A: MealApi + ?Sized + 'static> AnalysisPoller<A> {
    pub fn new(api: Arc<A>, timings: PollerTimings) -> Self {
        Self {
            api,
            timings,
            progress_seed: None,
        }
    }

    /// Makes the pseudo-progress sequence reproducible.
    pub fn with_progress_seed(mut self, seed: u64) -> Self {
        self.progress_seed = Some(seed);
        self
    }

    /// Runs the poller to a terminal state or until `cancel` fires.
    ///
    /// Emits `State` on every transition, `Progress` from the ticker and a
    /// single `Finished` at the end. Nothing is emitted once cancelled.
    pub async fn run(
        &self,
        session: StoredSession,
        sink: Arc<dyn AnalysisSink>,
        cancel: CancellationToken,
    ) -> PollOutcome {
        sink.emit(AnalysisEvent::State(PollerState::Initializing));

        let (Some(user_id), Some(event_id)) = (session.user_id, session.event_id) else {
            plate_warn!("Analysis cannot start: user or event id missing");
            return finish(sink.as_ref(), Err(PollFailure::MissingAnalysisData));
        };

        let ticker_cancel = cancel.child_token();
        let rng = match self.progress_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        spawn_ticker(
            self.timings.progress_interval,
            sink.clone(),
            ticker_cancel.clone(),
            rng,
        );

        let result = self
            .drive(&user_id, &event_id, sink.as_ref(), &cancel, &ticker_cancel)
            .await;
        ticker_cancel.cancel();

        match result {
            Some(result) if !cancel.is_cancelled() => finish(sink.as_ref(), result),
            _ => {
                plate_info!("Analysis for event {} cancelled", event_id);
                PollOutcome::Cancelled
            }
        }
    }

    /// Returns `None` when cancelled at any suspension point.
    async fn drive(
        &self,
        user_id: &str,
        event_id: &str,
        sink: &dyn AnalysisSink,
        cancel: &CancellationToken,
        ticker_cancel: &CancellationToken,
    ) -> Option<Result<Vec<MealRecord>, PollFailure>> {
        let mut state = Active::Initializing;
        let mut attempts: u64 = 0;
        loop {
            let next = match state {
                Active::Initializing => {
                    sleep_unless_cancelled(cancel, self.timings.initial_delay).await?;
                    Active::Polling
                }
                Active::Polling => {
                    attempts += 1;
                    let status = unless_cancelled(cancel, self.api.job_status(event_id)).await?;
                    match status {
                        Ok(JobStatus::Completed) => {
                            ticker_cancel.cancel();
                            sink.emit(AnalysisEvent::Progress(100));
                            Active::FetchingResults
                        }
                        Ok(JobStatus::Failed) => {
                            plate_warn!("Event {} reported FAILED", event_id);
                            return Some(Err(PollFailure::AnalysisFailed));
                        }
                        Ok(status) => {
                            plate_debug!(
                                "Event {} still {:?} after {} attempt(s)",
                                event_id,
                                status,
                                attempts
                            );
                            sleep_unless_cancelled(cancel, self.timings.retry_interval).await?;
                            Active::Polling
                        }
                        Err(err) => {
                            plate_warn!("Status check for event {} failed: {}", event_id, err);
                            return Some(Err(PollFailure::Request(err)));
                        }
                    }
                }
                Active::FetchingResults => {
                    let meals = unless_cancelled(cancel, self.api.fetch_meals(user_id)).await?;
                    return match meals {
                        Ok(meals) => {
                            sleep_unless_cancelled(cancel, self.timings.settle_delay).await?;
                            Some(Ok(meals))
                        }
                        Err(err) => {
                            plate_warn!("Fetching meals for user {} failed: {}", user_id, err);
                            Some(Err(PollFailure::Request(err)))
                        }
                    };
                }
            };
            if next != state {
                plate_info!("Event {}: {:?} -> {:?}", event_id, state, next);
                sink.emit(AnalysisEvent::State(next.into()));
            }
            state = next;
        }
    }
}

fn finish(
    sink: &dyn AnalysisSink,
    result: Result<Vec<MealRecord>, PollFailure>,
) -> PollOutcome {
    let terminal = if result.is_ok() {
        PollerState::Done
    } else {
        PollerState::Failed
    };
    sink.emit(AnalysisEvent::State(terminal));
    sink.emit(AnalysisEvent::Finished(result.clone()));
    match result {
        Ok(meals) => PollOutcome::Done(meals),
        Err(failure) => PollOutcome::Failed(failure),
    }
}

async fn unless_cancelled<F: Future>(cancel: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        output = fut => Some(output),
    }
}

async fn sleep_unless_cancelled(cancel: &CancellationToken, delay: Duration) -> Option<()> {
    unless_cancelled(cancel, tokio::time::sleep(delay)).await
}
