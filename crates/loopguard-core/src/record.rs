//! History records: one line of the on-disk store per download attempt.
//!
//! A record's identity fields are written once by the admission check. Only
//! the status ever changes afterwards, and only from `PENDING`.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Lifecycle state of a recorded download.
///
/// Values the store holds that are none of the three known states are kept
/// verbatim in [`Status::Other`] so a rewrite never alters them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Status {
  Pending,
  Success,
  Failed,
  Other(String),
}

impl Status {
  /// Map a host post-processing result code to a terminal status.
  ///
  /// `0` means the download completed; every other code is a failure.
  pub fn from_pp_code(code: &str) -> Self {
    if code.trim() == "0" { Self::Success } else { Self::Failed }
  }

  pub fn as_str(&self) -> &str {
    match self {
      Self::Pending => "PENDING",
      Self::Success => "SUCCESS",
      Self::Failed => "FAILED",
      Self::Other(s) => s,
    }
  }

  pub fn is_pending(&self) -> bool { matches!(self, Self::Pending) }
}

impl fmt::Display for Status {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl From<&str> for Status {
  fn from(s: &str) -> Self {
    match s {
      "PENDING" => Self::Pending,
      "SUCCESS" => Self::Success,
      "FAILED" => Self::Failed,
      other => Self::Other(other.to_owned()),
    }
  }
}

impl FromStr for Status {
  type Err = std::convert::Infallible;

  fn from_str(s: &str) -> Result<Self, Self::Err> { Ok(Self::from(s)) }
}

impl Serialize for Status {
  fn serialize<S: serde::Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
    ser.serialize_str(self.as_str())
  }
}

impl<'de> Deserialize<'de> for Status {
  fn deserialize<D: serde::Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
    let raw = String::deserialize(de)?;
    Ok(Self::from(raw.as_str()))
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// One download attempt as remembered by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
  /// Unix seconds at which the admission check accepted the download.
  pub timestamp:     i64,
  pub category:      String,
  pub name:          String,
  /// Caller-supplied strong identity; empty when the host had none.
  pub duplicate_key: String,
  pub status:        Status,
}

impl HistoryRecord {
  /// A fresh `PENDING` record created at `now`.
  pub fn pending(
    now: i64,
    category: impl Into<String>,
    name: impl Into<String>,
    duplicate_key: impl Into<String>,
  ) -> Self {
    Self {
      timestamp:     now,
      category:      category.into(),
      name:          name.into(),
      duplicate_key: duplicate_key.into(),
      status:        Status::Pending,
    }
  }

  /// Seconds elapsed between creation and `now`. Negative if the clock moved
  /// backwards.
  pub fn age(&self, now: i64) -> i64 { now - self.timestamp }

  /// `true` while the record is strictly younger than `window_seconds`.
  pub fn within_window(&self, window_seconds: i64, now: i64) -> bool {
    self.age(now) < window_seconds
  }

  pub fn created_at(&self) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(self.timestamp, 0)
  }

  /// The same record with its status replaced; every other field is kept.
  pub fn with_status(&self, status: Status) -> Self {
    Self { status, ..self.clone() }
  }
}

// ─── Store line ──────────────────────────────────────────────────────────────

/// A single line of the store: either a decoded record or raw text that did
/// not decode.
///
/// Lines read from disk keep their exact text, terminator included, so a
/// rewrite reproduces every line it did not change byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLine {
  Record {
    record: HistoryRecord,
    /// The line as read; `None` for records created or changed in memory.
    raw:    Option<String>,
  },
  Malformed(String),
}

impl StoreLine {
  /// A line for a record that has not been written yet.
  pub fn new(record: HistoryRecord) -> Self { Self::Record { record, raw: None } }

  pub fn as_record(&self) -> Option<&HistoryRecord> {
    match self {
      Self::Record { record, .. } => Some(record),
      Self::Malformed(_) => None,
    }
  }
}
