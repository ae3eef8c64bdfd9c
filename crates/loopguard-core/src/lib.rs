//! Core types and decision logic for the loopguard download-loop hook.
//!
//! This crate is deliberately free of filesystem and HTTP dependencies. The
//! store backend, the downstream blocklist client and the notifiers all
//! depend on it; it depends on nothing of theirs.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod admission;
pub mod blocklist;
pub mod codec;
pub mod completion;
pub mod error;
pub mod matcher;
pub mod notify;
pub mod record;
pub mod store;

pub use error::{Error, Result};
