use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use super::dispatcher::{Dispatcher, HttpDispatcher};
use super::job::{FailureKind, RequestJob, RequestOutcome};
use super::recorder::{Recorder, ResultSet};
use super::summary::LoadSummary;
use super::verdict::Verdict;
use crate::client::{build_http_client, Payload};
use crate::config::{Config, LoadConfig, LoadMethod, TargetConfig};
use crate::error::{HarnessError, Result};

/// How the `C` concurrency slots are filled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Schedule {
    /// Launch `C` jobs, wait for all of them, repeat.
    Wave,
    /// Keep up to `C` jobs in flight, starting a new one as soon as a slot frees.
    #[default]
    Pool,
}

/// Validated description of one run.
#[derive(Debug, Clone)]
pub struct LoadPlan {
    /// HTTP method every job uses
    pub method: LoadMethod,
    /// Absolute endpoint URL
    pub url: String,
    /// Body shared by all jobs (ignored for GET)
    pub payload: Payload,
    /// Number of requests to send (N)
    pub total_requests: usize,
    /// Maximum requests in flight (C)
    pub concurrency: usize,
    /// Success ratio needed to pass (R, 0.0 - 1.0)
    pub min_success_ratio: f64,
    /// Status code that counts as a success
    pub expected_status: u16,
    /// Per-request deadline
    pub timeout: Duration,
    /// How the concurrency slots are filled
    pub schedule: Schedule,
}

impl LoadPlan {
    /// Plan against `url` with the knobs of the default configuration.
    pub fn new(url: impl Into<String>, payload: Payload) -> Self {
        let load = LoadConfig::default();
        Self {
            method: load.method,
            url: url.into(),
            payload,
            total_requests: load.total_requests,
            concurrency: load.concurrency,
            min_success_ratio: load.min_success_ratio,
            expected_status: load.expected_status,
            timeout: TargetConfig::default().timeout(),
            schedule: load.schedule,
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let url = match &cfg.load.path {
            Some(path) => format!("{}{}", cfg.target.base_url.trim_end_matches('/'), path),
            None => cfg.target.products_url(),
        };
        let payload = match cfg.load.method {
            LoadMethod::Get => Payload::Empty,
            LoadMethod::Post => Payload::Json(cfg.load.payload.clone()),
        };
        let plan = Self {
            method: cfg.load.method,
            url,
            payload,
            total_requests: cfg.load.total_requests,
            concurrency: cfg.load.concurrency,
            min_success_ratio: cfg.load.min_success_ratio,
            expected_status: cfg.load.expected_status,
            timeout: cfg.target.timeout(),
            schedule: cfg.load.schedule,
        };
        plan.validate()?;
        Ok(plan)
    }

    pub fn with_method(mut self, method: LoadMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_requests(mut self, total_requests: usize, concurrency: usize) -> Self {
        self.total_requests = total_requests;
        self.concurrency = concurrency;
        self
    }

    pub fn with_min_success_ratio(mut self, ratio: f64) -> Self {
        self.min_success_ratio = ratio;
        self
    }

    pub fn with_expected_status(mut self, status: u16) -> Self {
        self.expected_status = status;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.total_requests == 0 {
            return Err(HarnessError::Config("total_requests must be at least 1".to_string()));
        }
        if self.concurrency == 0 {
            return Err(HarnessError::Config("concurrency must be at least 1".to_string()));
        }
        if self.concurrency > self.total_requests {
            return Err(HarnessError::Config(format!(
                "concurrency ({}) must not exceed total_requests ({})",
                self.concurrency, self.total_requests
            )));
        }
        if !(0.0..=1.0).contains(&self.min_success_ratio) {
            return Err(HarnessError::Config(format!(
                "min_success_ratio {} is outside [0, 1]",
                self.min_success_ratio
            )));
        }
        if self.timeout.is_zero() {
            return Err(HarnessError::Config("timeout must be positive".to_string()));
        }
        Ok(())
    }

    fn jobs(&self) -> Vec<RequestJob> {
        let url: Arc<str> = Arc::from(self.url.as_str());
        let payload = Arc::new(self.payload.clone());
        (0..self.total_requests)
            .map(|seq| RequestJob {
                seq,
                method: self.method,
                url: Arc::clone(&url),
                payload: Arc::clone(&payload),
                timeout: self.timeout,
            })
            .collect()
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct LoadRun {
    pub run_id: Uuid,
    pub verdict: Verdict,
    pub summary: LoadSummary,
    pub outcomes: Vec<RequestOutcome>,
}

impl LoadRun {
    pub fn passed(&self) -> bool {
        self.verdict.passed
    }
}

impl fmt::Display for LoadRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "======== LOAD RUN {} ========", self.run_id)?;
        writeln!(f, "{}", self.summary)?;
        write!(f, "{}", self.verdict)
    }
}

pub struct LoadHarness<D> {
    dispatcher: Arc<D>,
}

impl LoadHarness<HttpDispatcher> {
    pub fn http(client: reqwest::Client) -> Self {
        Self::new(HttpDispatcher::new(client))
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Ok(Self::http(build_http_client(&cfg.target)?))
    }
}

impl<D: Dispatcher + 'static> LoadHarness<D> {
    pub fn new(dispatcher: D) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Runs the plan to completion. Individual request failures never make
    /// this return `Err`; only an invalid plan does.
    pub async fn run(&self, plan: &LoadPlan) -> Result<LoadRun> {
        plan.validate()?;
        let run_id = Uuid::new_v4();
        let span = info_span!(
            "load_run",
            %run_id,
            url = %plan.url,
            method = %plan.method,
            total = plan.total_requests,
            concurrency = plan.concurrency,
            schedule = %plan.schedule,
        );
        self.execute(run_id, plan).instrument(span).await
    }

    async fn execute(&self, run_id: Uuid, plan: &LoadPlan) -> Result<LoadRun> {
        info!("starting load run");
        let started = Instant::now();
        let results = ResultSet::with_capacity(plan.total_requests);
        let jobs = plan.jobs();

        match plan.schedule {
            Schedule::Wave => self.run_waves(jobs, plan.concurrency, &results).await,
            Schedule::Pool => self.run_pool(jobs, plan.concurrency, &results).await,
        }

        let recorder = results.recorder();
        for seq in results.missing(plan.total_requests) {
            error!(seq, "worker finished without recording an outcome");
            recorder.record(RequestOutcome::failed(
                seq,
                FailureKind::WorkerLost,
                0.0,
                "worker terminated before recording an outcome",
            ));
        }

        let wall_clock = started.elapsed();
        let outcomes = results.into_outcomes();
        let verdict = Verdict::from_outcomes(&outcomes, plan.expected_status, plan.min_success_ratio)?;
        let summary = LoadSummary::from_outcomes(
            &outcomes,
            &plan.url,
            &plan.method.to_string(),
            plan.concurrency,
            wall_clock,
        );

        info!(
            success = verdict.success_count,
            failure = verdict.failure_count,
            ratio = verdict.success_ratio,
            avg_latency_s = verdict.avg_duration_secs,
            rps = summary.throughput_rps,
            passed = verdict.passed,
            "load run finished"
        );

        Ok(LoadRun {
            run_id,
            verdict,
            summary,
            outcomes,
        })
    }

    fn spawn_job(
        &self,
        tasks: &mut JoinSet<()>,
        job: RequestJob,
        recorder: Recorder,
        permit: Option<OwnedSemaphorePermit>,
    ) {
        let dispatcher = Arc::clone(&self.dispatcher);
        tasks.spawn(async move {
            let _permit = permit;
            let outcome = dispatcher.dispatch(&job).await;
            recorder.record(outcome);
        });
    }

    async fn run_waves(&self, jobs: Vec<RequestJob>, width: usize, results: &ResultSet) {
        for (wave, batch) in jobs.chunks(width).enumerate() {
            let mut tasks = JoinSet::new();
            for job in batch {
                self.spawn_job(&mut tasks, job.clone(), results.recorder(), None);
            }
            drain(&mut tasks).await;
            tracing::debug!(wave, size = batch.len(), recorded = results.len(), "wave complete");
        }
    }

    async fn run_pool(&self, jobs: Vec<RequestJob>, width: usize, results: &ResultSet) {
        let slots = Arc::new(Semaphore::new(width));
        let mut tasks = JoinSet::new();
        for job in jobs {
            let Ok(permit) = Arc::clone(&slots).acquire_owned().await else {
                error!("concurrency semaphore closed; remaining jobs are recorded as lost");
                break;
            };
            self.spawn_job(&mut tasks, job, results.recorder(), Some(permit));
            // Reap finished workers so the set stays bounded by the slot count.
            while let Some(joined) = tasks.try_join_next() {
                report_join(joined);
            }
        }
        drain(&mut tasks).await;
    }
}

async fn drain(tasks: &mut JoinSet<()>) {
    while let Some(joined) = tasks.join_next().await {
        report_join(joined);
    }
}

fn report_join(joined: std::result::Result<(), JoinError>) {
    if let Err(err) = joined {
        error!(error = %err, "load worker panicked");
    }
}
