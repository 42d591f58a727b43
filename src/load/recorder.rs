use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

use super::job::RequestOutcome;

/// Append-only outcome store for one run.
///
/// The harness owns the `ResultSet`; workers only ever see a [`Recorder`].
#[derive(Debug, Default)]
pub struct ResultSet {
    outcomes: Arc<Mutex<Vec<RequestOutcome>>>,
}

/// Write-only handle given to workers.
#[derive(Debug, Clone)]
pub struct Recorder {
    outcomes: Arc<Mutex<Vec<RequestOutcome>>>,
}

impl Recorder {
    pub fn record(&self, outcome: RequestOutcome) {
        self.outcomes.lock().push(outcome);
    }
}

impl ResultSet {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(Vec::with_capacity(capacity))),
        }
    }

    pub fn recorder(&self) -> Recorder {
        Recorder {
            outcomes: Arc::clone(&self.outcomes),
        }
    }

    pub fn len(&self) -> usize {
        self.outcomes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sequence numbers in `0..total` with no recorded outcome.
    pub fn missing(&self, total: usize) -> Vec<usize> {
        let guard = self.outcomes.lock();
        let seen: HashSet<usize> = guard.iter().map(|o| o.seq).collect();
        (0..total).filter(|seq| !seen.contains(seq)).collect()
    }

    pub fn into_outcomes(self) -> Vec<RequestOutcome> {
        std::mem::take(&mut *self.outcomes.lock())
    }
}
