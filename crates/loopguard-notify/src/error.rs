//! Error type for `loopguard-notify`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to build HTTP client: {0}")]
  Client(#[from] reqwest::Error),

  #[error("{kind} notifier requires `{field}`")]
  MissingSetting {
    kind:  crate::NotifierKind,
    field: &'static str,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
