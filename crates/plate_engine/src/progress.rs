use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::poller::AnalysisSink;
use crate::AnalysisEvent;

/// Highest value the ticker may reach on its own.
pub const PROGRESS_CAP: f64 = 90.0;
/// Upper bound (exclusive) of a single random step.
pub const MAX_STEP: f64 = 15.0;

/// Cosmetic progress estimate. Never a completion signal.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PseudoProgress {
    value: f64,
}

impl PseudoProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, step: f64) -> u8 {
        self.value = (self.value + step.clamp(0.0, MAX_STEP)).min(PROGRESS_CAP);
        self.percent()
    }

    pub fn advance_random<R: Rng>(&mut self, rng: &mut R) -> u8 {
        self.advance(rng.gen_range(0.0..MAX_STEP))
    }

    pub fn complete(&mut self) -> u8 {
        self.value = 100.0;
        self.percent()
    }

    pub fn percent(&self) -> u8 {
        self.value.floor() as u8
    }
}

/// Emits a progress event every `period` until `cancel` fires.
pub(crate) fn spawn_ticker<R>(
    period: Duration,
    sink: Arc<dyn AnalysisSink>,
    cancel: CancellationToken,
    mut rng: R,
) -> tokio::task::JoinHandle<()>
where
    R: Rng + Send + 'static,
{
    tokio::spawn(async move {
        let mut progress = PseudoProgress::new();
        let mut ticks = interval_at(Instant::now() + period, period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticks.tick() => {
                    let percent = progress.advance_random(&mut rng);
                    sink.emit(AnalysisEvent::Progress(percent));
                }
            }
        }
    })
}
