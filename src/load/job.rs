use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::client::Payload;
use crate::config::LoadMethod;

/// Status recorded for a request that never produced an HTTP response.
pub const STATUS_TRANSPORT_FAILURE: u16 = 0;

/// One request to issue. Jobs of a run share the url and payload.
#[derive(Debug, Clone)]
pub struct RequestJob {
    pub seq: usize,
    pub method: LoadMethod,
    pub url: Arc<str>,
    pub payload: Arc<Payload>,
    /// Ceiling for the whole exchange, body included.
    pub timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    Timeout,
    Transport,
    /// The worker task died before recording anything.
    WorkerLost,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutcomeBody {
    Json(Value),
    Text(String),
}

impl OutcomeBody {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            OutcomeBody::Json(v) => Some(v),
            OutcomeBody::Text(_) => None,
        }
    }
}

/// Result of executing one [`RequestJob`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestOutcome {
    pub seq: usize,
    pub status: u16,
    pub elapsed_secs: f64,
    pub body: OutcomeBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

impl RequestOutcome {
    pub fn response(seq: usize, status: u16, elapsed_secs: f64, body: OutcomeBody) -> Self {
        Self {
            seq,
            status,
            elapsed_secs,
            body,
            failure: None,
        }
    }

    pub fn failed(seq: usize, kind: FailureKind, elapsed_secs: f64, message: impl Into<String>) -> Self {
        Self {
            seq,
            status: STATUS_TRANSPORT_FAILURE,
            elapsed_secs,
            body: OutcomeBody::Text(message.into()),
            failure: Some(kind),
        }
    }

    pub fn is_success(&self, expected_status: u16) -> bool {
        self.failure.is_none() && self.status == expected_status
    }

    /// Key used in the status breakdown.
    pub fn status_key(&self) -> String {
        match self.failure {
            Some(kind) => kind.to_string(),
            None => self.status.to_string(),
        }
    }
}
