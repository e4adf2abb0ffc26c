use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use plate_engine::{
    AnalysisEvent, AnalysisPoller, AnalysisSink, ApiError, FailureKind, ImageUpload, JobStatus,
    MealApi, MealRecord, PollFailure, PollOutcome, PollerState, PollerTimings, StoredSession,
};
use pretty_assertions::assert_eq;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Status(String),
    Meals(String),
}

/// Scripted backend: answers status checks from a queue, pending once empty.
struct ScriptedApi {
    statuses: Mutex<VecDeque<Result<JobStatus, ApiError>>>,
    meals: Result<Vec<MealRecord>, ApiError>,
    calls: Mutex<Vec<(Call, Instant)>>,
}

impl ScriptedApi {
    fn new(
        statuses: Vec<Result<JobStatus, ApiError>>,
        meals: Result<Vec<MealRecord>, ApiError>,
    ) -> Arc<Self> {
        Arc::new(Self {
            statuses: Mutex::new(statuses.into()),
            meals,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<(Call, Instant)> {
        self.calls.lock().unwrap().clone()
    }

    fn call_kinds(&self) -> Vec<Call> {
        self.calls().into_iter().map(|(call, _)| call).collect()
    }
}

#[async_trait::async_trait]
impl MealApi for ScriptedApi {
    async fn create_user(&self, _name: &str, _email: &str) -> Result<String, ApiError> {
        unreachable!("poller never creates users")
    }

    async fn start_analysis(
        &self,
        _user_id: &str,
        _image: &ImageUpload,
    ) -> Result<String, ApiError> {
        unreachable!("poller never uploads")
    }

    async fn job_status(&self, event_id: &str) -> Result<JobStatus, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push((Call::Status(event_id.to_string()), Instant::now()));
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(JobStatus::Pending))
    }

    async fn fetch_meals(&self, user_id: &str) -> Result<Vec<MealRecord>, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push((Call::Meals(user_id.to_string()), Instant::now()));
        self.meals.clone()
    }
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<AnalysisEvent>>,
}

impl RecordingSink {
    fn events(&self) -> Vec<AnalysisEvent> {
        self.events.lock().unwrap().clone()
    }

    fn states(&self) -> Vec<PollerState> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                AnalysisEvent::State(state) => Some(state),
                _ => None,
            })
            .collect()
    }

    fn progress(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                AnalysisEvent::Progress(percent) => Some(percent),
                _ => None,
            })
            .collect()
    }
}

impl AnalysisSink for RecordingSink {
    fn emit(&self, event: AnalysisEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn session() -> StoredSession {
    StoredSession {
        user_id: Some("u1".to_string()),
        event_id: Some("e1".to_string()),
    }
}

fn meal() -> MealRecord {
    MealRecord {
        name: "Salmon bowl".to_string(),
        calories: 640.0,
        proteins: 38.0,
        carbs: 52.0,
        fats: 24.0,
        ai_insights: "Rich in omega-3.".to_string(),
        tips: vec!["Add greens".to_string()],
    }
}

fn server_error() -> ApiError {
    ApiError {
        kind: FailureKind::HttpStatus(503),
        message: "503 Service Unavailable".to_string(),
    }
}

fn poller(api: &Arc<ScriptedApi>) -> AnalysisPoller<ScriptedApi> {
    AnalysisPoller::new(api.clone(), PollerTimings::default()).with_progress_seed(11)
}

#[tokio::test(start_paused = true)]
async fn pending_pending_completed_polls_on_schedule_then_fetches_once() {
    let api = ScriptedApi::new(
        vec![
            Ok(JobStatus::Pending),
            Ok(JobStatus::Pending),
            Ok(JobStatus::Completed),
        ],
        Ok(vec![meal()]),
    );
    let sink = Arc::new(RecordingSink::default());
    let start = Instant::now();

    let outcome = poller(&api)
        .run(session(), sink.clone(), CancellationToken::new())
        .await;

    assert_eq!(outcome, PollOutcome::Done(vec![meal()]));
    let schedule: Vec<_> = api
        .calls()
        .into_iter()
        .map(|(call, at)| (call, at.duration_since(start)))
        .collect();
    assert_eq!(
        schedule,
        vec![
            (Call::Status("e1".to_string()), Duration::from_millis(1000)),
            (Call::Status("e1".to_string()), Duration::from_millis(3000)),
            (Call::Status("e1".to_string()), Duration::from_millis(5000)),
            (Call::Meals("u1".to_string()), Duration::from_millis(5000)),
        ]
    );
    // Settle delay before handing results over.
    assert_eq!(start.elapsed(), Duration::from_millis(6000));

    assert_eq!(
        sink.states(),
        vec![
            PollerState::Initializing,
            PollerState::Polling,
            PollerState::FetchingResults,
            PollerState::Done,
        ]
    );
    assert_eq!(
        sink.events().last(),
        Some(&AnalysisEvent::Finished(Ok(vec![meal()])))
    );
}

#[tokio::test(start_paused = true)]
async fn progress_stays_capped_until_completed() {
    let api = ScriptedApi::new(
        vec![Ok(JobStatus::Pending); 5]
            .into_iter()
            .chain([Ok(JobStatus::Completed)])
            .collect(),
        Ok(Vec::new()),
    );
    let sink = Arc::new(RecordingSink::default());

    poller(&api)
        .run(session(), sink.clone(), CancellationToken::new())
        .await;

    let progress = sink.progress();
    let (last, ticks) = progress.split_last().expect("progress events");
    assert_eq!(*last, 100);
    assert!(!ticks.is_empty());
    assert!(ticks.iter().all(|percent| *percent <= 90));
    assert!(ticks.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[tokio::test(start_paused = true)]
async fn failed_status_never_fetches_results() {
    let api = ScriptedApi::new(vec![Ok(JobStatus::Failed)], Ok(vec![meal()]));
    let sink = Arc::new(RecordingSink::default());

    let outcome = poller(&api)
        .run(session(), sink.clone(), CancellationToken::new())
        .await;

    assert_eq!(outcome, PollOutcome::Failed(PollFailure::AnalysisFailed));
    assert_eq!(api.call_kinds(), vec![Call::Status("e1".to_string())]);
    assert_eq!(sink.states().last(), Some(&PollerState::Failed));
    assert!(!sink.progress().contains(&100));
}

#[tokio::test(start_paused = true)]
async fn missing_identifiers_fail_without_requests() {
    for stored in [
        StoredSession {
            user_id: None,
            event_id: Some("e1".to_string()),
        },
        StoredSession {
            user_id: Some("u1".to_string()),
            event_id: None,
        },
        StoredSession::default(),
    ] {
        let api = ScriptedApi::new(Vec::new(), Ok(vec![meal()]));
        let sink = Arc::new(RecordingSink::default());
        let start = Instant::now();

        let outcome = poller(&api)
            .run(stored, sink.clone(), CancellationToken::new())
            .await;

        assert_eq!(outcome, PollOutcome::Failed(PollFailure::MissingAnalysisData));
        assert!(api.calls().is_empty());
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(
            sink.events(),
            vec![
                AnalysisEvent::State(PollerState::Initializing),
                AnalysisEvent::State(PollerState::Failed),
                AnalysisEvent::Finished(Err(PollFailure::MissingAnalysisData)),
            ]
        );
    }
}

#[tokio::test(start_paused = true)]
async fn request_error_fails_immediately_without_retry() {
    let api = ScriptedApi::new(vec![Err(server_error())], Ok(vec![meal()]));
    let sink = Arc::new(RecordingSink::default());

    let outcome = poller(&api)
        .run(session(), sink.clone(), CancellationToken::new())
        .await;

    assert_eq!(
        outcome,
        PollOutcome::Failed(PollFailure::Request(server_error()))
    );
    assert_eq!(api.call_kinds().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn unrecognized_status_keeps_polling() {
    let api = ScriptedApi::new(
        vec![
            Ok(JobStatus::Unknown("QUEUED".to_string())),
            Ok(JobStatus::Completed),
        ],
        Ok(vec![meal()]),
    );
    let sink = Arc::new(RecordingSink::default());

    let outcome = poller(&api)
        .run(session(), sink.clone(), CancellationToken::new())
        .await;

    assert_eq!(outcome, PollOutcome::Done(vec![meal()]));
    assert_eq!(
        api.call_kinds(),
        vec![
            Call::Status("e1".to_string()),
            Call::Status("e1".to_string()),
            Call::Meals("u1".to_string()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn results_fetch_error_fails() {
    let api = ScriptedApi::new(vec![Ok(JobStatus::Completed)], Err(server_error()));
    let sink = Arc::new(RecordingSink::default());

    let outcome = poller(&api)
        .run(session(), sink.clone(), CancellationToken::new())
        .await;

    assert_eq!(
        outcome,
        PollOutcome::Failed(PollFailure::Request(server_error()))
    );
    assert_eq!(sink.states().last(), Some(&PollerState::Failed));
}

#[tokio::test(start_paused = true)]
async fn teardown_during_retry_wait_stops_all_requests_and_events() {
    let api = ScriptedApi::new(Vec::new(), Ok(vec![meal()]));
    let sink = Arc::new(RecordingSink::default());
    let cancel = CancellationToken::new();

    let task = {
        let poller = poller(&api);
        let sink = sink.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { poller.run(session(), sink, cancel).await })
    };

    // First status check happens at 1000 ms; the retry would be at 3000 ms.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(api.call_kinds().len(), 1);
    cancel.cancel();
    let events_at_teardown = sink.events().len();

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(task.await.unwrap(), PollOutcome::Cancelled);
    assert_eq!(api.call_kinds().len(), 1);
    assert_eq!(sink.events().len(), events_at_teardown);
}

#[tokio::test(start_paused = true)]
async fn teardown_during_settle_delay_discards_results() {
    let api = ScriptedApi::new(vec![Ok(JobStatus::Completed)], Ok(vec![meal()]));
    let sink = Arc::new(RecordingSink::default());
    let cancel = CancellationToken::new();

    let task = {
        let poller = poller(&api);
        let sink = sink.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { poller.run(session(), sink, cancel).await })
    };

    tokio::time::sleep(Duration::from_millis(1500)).await;
    cancel.cancel();

    assert_eq!(task.await.unwrap(), PollOutcome::Cancelled);
    assert!(!sink
        .events()
        .iter()
        .any(|event| matches!(event, AnalysisEvent::Finished(_))));
}
