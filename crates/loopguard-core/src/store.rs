//! The `HistoryStore` trait.
//!
//! Implemented by storage backends (e.g. `loopguard-store-file`). The hook's
//! admission gate and completion reporter depend on this abstraction, not on
//! any concrete backend. Every method is one exclusive transaction.

use std::future::Future;

use crate::{
  admission::{AdmissionDecision, AdmissionRequest},
  completion::{CompletionOutcome, CompletionRequest},
};

/// Result of an expiry sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
  pub kept:    usize,
  pub dropped: usize,
}

pub trait HistoryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Remove every record at least `window_seconds` old, and every line that
  /// does not decode.
  fn sweep(
    &self,
    window_seconds: i64,
    now: i64,
  ) -> impl Future<Output = Result<SweepReport, Self::Error>> + Send + '_;

  /// Sweep, decide, and on admission append the new `PENDING` record, all
  /// under one lock.
  fn admit<'a>(
    &'a self,
    request: &'a AdmissionRequest,
    now: i64,
  ) -> impl Future<Output = Result<AdmissionDecision, Self::Error>> + Send + 'a;

  /// Move the first matching `PENDING` record to the request's outcome.
  ///
  /// When nothing matches the store must be left untouched.
  fn complete<'a>(
    &'a self,
    request: &'a CompletionRequest,
  ) -> impl Future<Output = Result<CompletionOutcome, Self::Error>> + Send + 'a;
}
