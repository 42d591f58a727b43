use serde::Serialize;
use std::fmt;

use super::Suite;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl CheckResult {
    pub fn pass(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            detail: None,
        }
    }

    pub fn fail(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            detail: Some(detail.into()),
        }
    }

    /// Passes when `problems` is empty, otherwise fails with them joined.
    pub fn from_problems(name: impl Into<String>, problems: Vec<String>) -> Self {
        if problems.is_empty() {
            Self::pass(name)
        } else {
            Self::fail(name, problems.join("; "))
        }
    }

    pub fn expect_status(name: impl Into<String>, actual: u16, accepted: &[u16]) -> Self {
        if accepted.contains(&actual) {
            Self::pass(name)
        } else {
            Self::fail(name, format!("expected {accepted:?}, got {actual}"))
        }
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.passed { "PASS" } else { "FAIL" };
        write!(f, "[{mark}] {}", self.name)?;
        if let Some(detail) = &self.detail {
            write!(f, " - {detail}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub suite: Suite,
    pub checks: Vec<CheckResult>,
}

impl SuiteReport {
    pub fn new(suite: Suite) -> Self {
        Self {
            suite,
            checks: Vec::new(),
        }
    }

    pub fn push(&mut self, check: CheckResult) {
        if !check.passed {
            tracing::warn!(suite = %self.suite, check = %check.name, detail = ?check.detail, "check failed");
        }
        self.checks.push(check);
    }

    pub fn extend(&mut self, checks: impl IntoIterator<Item = CheckResult>) {
        for check in checks {
            self.push(check);
        }
    }

    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| !c.passed)
    }

    pub fn counts(&self) -> (usize, usize) {
        let failed = self.failures().count();
        (self.checks.len() - failed, failed)
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (passed, failed) = self.counts();
        writeln!(f, "== {} ({passed} passed, {failed} failed)", self.suite)?;
        for check in &self.checks {
            writeln!(f, "  {check}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub suites: Vec<SuiteReport>,
}

impl RunReport {
    pub fn passed(&self) -> bool {
        self.suites.iter().all(SuiteReport::passed)
    }

    pub fn exit_code(&self) -> i32 {
        if self.passed() {
            0
        } else {
            1
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for suite in &self.suites {
            write!(f, "{suite}")?;
        }
        write!(f, "Overall: {}", if self.passed() { "PASSED" } else { "FAILED" })
    }
}
