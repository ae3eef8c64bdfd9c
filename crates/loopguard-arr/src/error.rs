//! Error type for `loopguard-arr`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to build HTTP client: {0}")]
  Client(#[source] reqwest::Error),

  #[error("{endpoint} failed: {source}")]
  Request {
    endpoint: String,
    #[source]
    source:   reqwest::Error,
  },

  #[error("{endpoint} → {status}")]
  Status {
    endpoint: String,
    status:   reqwest::StatusCode,
  },

  #[error("invalid timestamp {0}")]
  Timestamp(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
