use serde::Serialize;
use std::fmt;

use super::job::RequestOutcome;
use crate::error::{HarnessError, Result};

/// Aggregate judgment of a load run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    /// Outcomes judged
    pub total: usize,
    /// Outcomes carrying the expected status
    pub success_count: usize,
    /// Everything else, transport failures included
    pub failure_count: usize,
    /// Mean elapsed time over all outcomes (seconds)
    pub avg_duration_secs: f64,
    /// success_count / total
    pub success_ratio: f64,
    /// Threshold the ratio was held against
    pub min_success_ratio: f64,
    /// success_ratio >= min_success_ratio
    pub passed: bool,
}

impl Verdict {
    /// Reduces outcomes to a verdict. An empty slice is rejected rather than
    /// averaged.
    pub fn from_outcomes(
        outcomes: &[RequestOutcome],
        expected_status: u16,
        min_success_ratio: f64,
    ) -> Result<Self> {
        if outcomes.is_empty() {
            return Err(HarnessError::Config(
                "cannot compute a verdict over zero requests".to_string(),
            ));
        }

        let total = outcomes.len();
        let success_count = outcomes
            .iter()
            .filter(|o| o.is_success(expected_status))
            .count();
        let total_secs: f64 = outcomes.iter().map(|o| o.elapsed_secs.max(0.0)).sum();
        let success_ratio = success_count as f64 / total as f64;

        Ok(Self {
            total,
            success_count,
            failure_count: total - success_count,
            avg_duration_secs: total_secs / total as f64,
            success_ratio,
            min_success_ratio,
            passed: success_ratio >= min_success_ratio,
        })
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total requests      : {}", self.total)?;
        writeln!(f, "Successful requests : {}", self.success_count)?;
        writeln!(f, "Failed requests     : {}", self.failure_count)?;
        writeln!(
            f,
            "Success ratio       : {:.2}% (required {:.2}%)",
            self.success_ratio * 100.0,
            self.min_success_ratio * 100.0
        )?;
        writeln!(f, "Average latency (s) : {:.4}", self.avg_duration_secs)?;
        write!(f, "Verdict             : {}", if self.passed { "PASSED" } else { "FAILED" })
    }
}
