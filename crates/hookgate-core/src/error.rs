//! Error taxonomy for hookgate.

/// hookgate library errors.
///
/// None of these cross the hook boundary: gate evaluation turns every error
/// into an allow or block decision before the process exits.
#[derive(Debug, thiserror::Error)]
pub enum HookgateError {
    #[error("git error: {0}")]
    Git(String),

    #[error("invalid hook event: {0}")]
    InvalidEvent(String),

    #[error("invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for hookgate operations.
pub type Result<T> = std::result::Result<T, HookgateError>;

impl From<regex::Error> for HookgateError {
    fn from(err: regex::Error) -> Self {
        HookgateError::InvalidPolicy(err.to_string())
    }
}
