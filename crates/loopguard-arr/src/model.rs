//! Wire types for the subset of the v3 API we use.

use serde::Deserialize;
use strum::Display;

/// Which flavour of media manager an instance is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ArrKind {
  Radarr,
  Sonarr,
}

/// A configured downstream instance serving one download category.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ArrInstance {
  pub category: String,
  pub url:      String,
  pub api_key:  String,
}

/// `GET /api/v3/queue` record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
  pub id:          i64,
  #[serde(default)]
  pub title:       String,
  pub download_id: Option<String>,
}

/// `GET /api/v3/history` record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
  pub id:           i64,
  #[serde(default)]
  pub source_title: String,
  pub download_id:  Option<String>,
  #[serde(default)]
  pub event_type:   String,
}

impl HistoryItem {
  /// Only grab events can be marked failed.
  pub fn is_grab(&self) -> bool { self.event_type.eq_ignore_ascii_case("grabbed") }
}

/// Envelope of paged endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct Page<T> {
  #[serde(default = "Vec::new")]
  pub records: Vec<T>,
}
