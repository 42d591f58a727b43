use thiserror::Error;

/// Errors that cross the library boundary.
///
/// Per-request failures inside a load run never show up here; they are
/// recorded as failed outcomes instead.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration: {0}")]
    ConfigLoad(#[from] Box<figment::Error>),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("No products found in the catalog")]
    EmptyCatalog,

    #[error("Invalid JSON body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<figment::Error> for HarnessError {
    fn from(error: figment::Error) -> Self {
        HarnessError::ConfigLoad(Box::new(error))
    }
}

impl From<validator::ValidationErrors> for HarnessError {
    fn from(errors: validator::ValidationErrors) -> Self {
        HarnessError::Config(errors.to_string())
    }
}

pub type Result<T, E = HarnessError> = std::result::Result<T, E>;
