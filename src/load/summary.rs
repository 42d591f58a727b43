//! Latency and throughput figures reported next to the verdict.

use chrono::Local;
use itertools::Itertools;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use super::job::RequestOutcome;

#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    /// Local time the run finished
    pub timestamp: String,
    /// Endpoint URL
    pub target: String,
    /// HTTP method
    pub method: String,
    /// Maximum requests in flight
    pub concurrency: usize,
    /// Time from first dispatch to last outcome (seconds)
    pub wall_clock_secs: f64,
    /// Fastest request (ms)
    pub fastest_ms: f64,
    /// Slowest request (ms)
    pub slowest_ms: f64,
    /// Median request latency (ms)
    pub median_ms: f64,
    /// Completed requests per second of wall-clock time
    pub throughput_rps: f64,
    /// Outcome count per status code or failure kind
    pub status_counts: BTreeMap<String, usize>,
}

impl LoadSummary {
    pub fn from_outcomes(
        outcomes: &[RequestOutcome],
        target: &str,
        method: &str,
        concurrency: usize,
        wall_clock: Duration,
    ) -> Self {
        let mut latencies: Vec<f64> = outcomes.iter().map(|o| o.elapsed_secs * 1000.0).collect();
        latencies.sort_by(f64::total_cmp);

        let status_counts: BTreeMap<String, usize> = outcomes
            .iter()
            .map(RequestOutcome::status_key)
            .counts()
            .into_iter()
            .collect();

        let wall_clock_secs = wall_clock.as_secs_f64();
        let throughput_rps = if wall_clock_secs > 0.0 {
            outcomes.len() as f64 / wall_clock_secs
        } else {
            0.0
        };

        Self {
            timestamp: Local::now().format("%Y/%m/%d %H:%M:%S").to_string(),
            target: target.to_string(),
            method: method.to_string(),
            concurrency,
            wall_clock_secs,
            fastest_ms: latencies.first().copied().unwrap_or(0.0),
            slowest_ms: latencies.last().copied().unwrap_or(0.0),
            median_ms: median(&latencies),
            throughput_rps,
            status_counts,
        }
    }
}

/// Median of an already sorted slice; 0 when empty.
fn median(sorted: &[f64]) -> f64 {
    let len = sorted.len();
    if len == 0 {
        return 0.0;
    }
    if len % 2 == 0 {
        (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0
    } else {
        sorted[len / 2]
    }
}

impl fmt::Display for LoadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Timestamp           : {}", self.timestamp)?;
        writeln!(f, "Target              : {} {}", self.method, self.target)?;
        writeln!(f, "Concurrency         : {}", self.concurrency)?;
        writeln!(f, "Fastest (ms)        : {:.2}", self.fastest_ms)?;
        writeln!(f, "Slowest (ms)        : {:.2}", self.slowest_ms)?;
        writeln!(f, "Median (ms)         : {:.2}", self.median_ms)?;
        writeln!(f, "Requests per second : {:.2}", self.throughput_rps)?;
        write!(f, "Status breakdown    :")?;
        for (status, count) in &self.status_counts {
            write!(f, " {status}={count}")?;
        }
        Ok(())
    }
}
