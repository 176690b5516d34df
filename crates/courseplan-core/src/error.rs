use thiserror::Error;

/// Message shown to clients for any fault that is not their doing.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "An internal server error occurred. Please try again later.";

/// Core error type shared across courseplan crates.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage executor failure, including course inserts that were compensated.
    #[error("database error: {0}")]
    Db(String),
    /// The requested plan or record does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// A stored row could not be mapped onto a domain type.
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

impl Error {
    /// Message safe to hand to a client; never carries internal detail.
    pub fn public_message(&self) -> String {
        match self {
            Error::NotFound(what) => format!("{what} not found."),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

/// Convenience alias for results returned by courseplan crates.
pub type Result<T> = std::result::Result<T, Error>;
