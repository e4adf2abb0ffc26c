use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type RunId = u64;

/// Status of a backend analysis job as reported by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Completed,
    Failed,
    Unknown(String),
}

impl JobStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "PENDING" => JobStatus::Pending,
            "COMPLETED" => JobStatus::Completed,
            "FAILED" => JobStatus::Failed,
            other => JobStatus::Unknown(other.to_string()),
        }
    }
}

/// One meal as returned by `GET /users/{userId}/meals`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealRecord {
    pub name: String,
    pub calories: f64,
    pub proteins: f64,
    pub carbs: f64,
    pub fats: f64,
    pub ai_insights: String,
    #[serde(default)]
    pub tips: Vec<String>,
}

/// Image payload for `POST /meals/analyze`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Identifiers the poller needs; either may be missing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoredSession {
    pub user_id: Option<String>,
    pub event_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Initializing,
    Polling,
    FetchingResults,
    Done,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollFailure {
    MissingAnalysisData,
    AnalysisFailed,
    Request(ApiError),
}

impl fmt::Display for PollFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollFailure::MissingAnalysisData => write!(f, "missing analysis data"),
            PollFailure::AnalysisFailed => write!(f, "analysis failed"),
            PollFailure::Request(err) => write!(f, "request failed: {err}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisEvent {
    State(PollerState),
    Progress(u8),
    Finished(Result<Vec<MealRecord>, PollFailure>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    UserCreated(Result<String, ApiError>),
    UploadFinished(Result<String, ApiError>),
    Analysis { run_id: RunId, event: AnalysisEvent },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Decode,
    InvalidRequest,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Decode => write!(f, "undecodable response"),
            FailureKind::InvalidRequest => write!(f, "invalid request"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
