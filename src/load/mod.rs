//! Bounded-concurrency load harness.
//!
//! A run issues `N` requests against one endpoint with at most `C` in flight,
//! records one [`RequestOutcome`] per request and reduces them to a
//! [`Verdict`] against a minimum success ratio.

pub mod dispatcher;
pub mod harness;
pub mod job;
pub mod recorder;
pub mod summary;
pub mod verdict;

pub use dispatcher::*;
pub use harness::*;
pub use job::*;
pub use recorder::*;
pub use summary::*;
pub use verdict::*;
