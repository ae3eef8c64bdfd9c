//! Error types for `loopguard-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("expected 5 `|`-separated fields, found {0}")]
  FieldCount(usize),

  #[error("invalid timestamp {0:?}")]
  Timestamp(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
