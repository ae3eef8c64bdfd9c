//! Error type for `loopguard-store-file`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The store file could not be opened, locked, read or written. Callers
  /// must assume the operation had no effect.
  #[error("history store {path:?} unavailable: {source}")]
  Unavailable {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("store worker panicked or was cancelled: {0}")]
  Worker(#[from] tokio::task::JoinError),
}

impl Error {
  pub(crate) fn unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Unavailable { path: path.into(), source }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
