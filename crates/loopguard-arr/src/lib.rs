//! Radarr/Sonarr v3 API client and the downstream blocklist strategy.
//!
//! Only the handful of endpoints needed to find a grabbed release and get it
//! blocklisted are covered.

mod blocklist;
mod client;
mod model;

pub mod error;

pub use blocklist::{ArrBlocklister, BlockMethod, find_by_title};
pub use client::{ArrClient, REQUEST_TIMEOUT};
pub use error::{Error, Result};
pub use model::{ArrInstance, ArrKind, HistoryItem, QueueItem};
