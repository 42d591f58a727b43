use async_trait::async_trait;
use std::time::Instant;
use tracing::{debug, warn};

use super::job::{FailureKind, OutcomeBody, RequestJob, RequestOutcome};
use crate::config::LoadMethod;

/// Executes a single job. Implementations never fail: every problem ends up
/// in the returned outcome.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, job: &RequestJob) -> RequestOutcome;
}

/// Sends jobs over HTTP, bounding each exchange by the job's timeout.
#[derive(Clone)]
pub struct HttpDispatcher {
    client: reqwest::Client,
}

impl HttpDispatcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn exchange(&self, job: &RequestJob) -> Result<(u16, String), reqwest::Error> {
        let builder = match job.method {
            LoadMethod::Get => self.client.get(&*job.url),
            LoadMethod::Post => job.payload.attach(self.client.post(&*job.url)),
        };
        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let text = resp.text().await?;
        Ok((status, text))
    }
}

#[async_trait]
impl Dispatcher for HttpDispatcher {
    async fn dispatch(&self, job: &RequestJob) -> RequestOutcome {
        let start = Instant::now();
        let result = tokio::time::timeout(job.timeout, self.exchange(job)).await;
        let elapsed = start.elapsed().as_secs_f64();

        match result {
            Ok(Ok((status, text))) => {
                debug!(seq = job.seq, status, elapsed_ms = elapsed * 1000.0, "request completed");
                RequestOutcome::response(job.seq, status, elapsed, decode_body(status, text))
            }
            Ok(Err(err)) => {
                let kind = if err.is_timeout() {
                    FailureKind::Timeout
                } else {
                    FailureKind::Transport
                };
                warn!(seq = job.seq, error = %err, %kind, "request failed");
                RequestOutcome::failed(job.seq, kind, elapsed, describe(&err))
            }
            Err(_) => {
                warn!(seq = job.seq, timeout_ms = job.timeout.as_millis() as u64, "request timed out");
                RequestOutcome::failed(
                    job.seq,
                    FailureKind::Timeout,
                    elapsed,
                    format!("timed out after {:?}", job.timeout),
                )
            }
        }
    }
}

/// JSON for successful responses, raw text for everything else or when the
/// body does not parse.
fn decode_body(status: u16, text: String) -> OutcomeBody {
    if (200..300).contains(&status) {
        if let Ok(value) = serde_json::from_str(&text) {
            return OutcomeBody::Json(value);
        }
    }
    OutcomeBody::Text(text)
}

fn describe(err: &reqwest::Error) -> String {
    let reason = if err.is_connect() {
        "connection refused or host unreachable"
    } else if err.is_timeout() {
        "timeout"
    } else if err.is_request() {
        "request could not be sent"
    } else if err.is_body() || err.is_decode() {
        "response body could not be read"
    } else {
        "network error"
    };
    format!("{reason}: {err}")
}
