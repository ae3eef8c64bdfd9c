//! Downstream blocklisting capability.
//!
//! When a download that already completed shows up again, the media manager
//! that grabbed it is asked to blocklist the release so it stops re-sending
//! it. How that happens is the implementor's business.

use std::future::Future;

/// What the gate knows about the refused download.
#[derive(Debug, Clone)]
pub struct BlockRequest {
  pub name:           String,
  pub category:       String,
  /// Lookback for history searches.
  pub window_seconds: i64,
  pub now:            i64,
}

pub trait Blocklister: Send + Sync {
  /// Try to blocklist the release. Returns a human-readable description of
  /// where it was blocked, or `None` if no instance accepted it.
  ///
  /// Implementations log their own failures; nothing here is fatal.
  fn block<'a>(
    &'a self,
    request: &'a BlockRequest,
  ) -> impl Future<Output = Option<String>> + Send + 'a;
}
