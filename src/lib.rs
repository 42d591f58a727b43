pub mod catalog;
pub mod client;
pub mod config;
pub mod conformance;
pub mod error;
pub mod load;
pub mod telemetry;

pub use error::{HarnessError, Result};
