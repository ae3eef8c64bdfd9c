//! Notification payloads and the notifier capability.

use std::{collections::BTreeMap, future::Future};

use serde::Serialize;
use strum::{AsRefStr, Display};

use crate::{Result, matcher::MatchMethod, record::Status};

// ─── Payload ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
  Blocked,
  Updated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ScriptType {
  PreQueue,
  PostProcess,
}

/// Structured description of one hook event.
///
/// `title` and `message` are always filled in so that notifiers that only
/// understand plain messages can still deliver it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationPayload {
  pub title:                String,
  pub message:              String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub priority:             Option<i64>,
  pub script_type:          ScriptType,
  pub action:               EventKind,
  pub nzb_name:             String,
  pub category:             String,
  pub duplicate_key:        String,
  pub timestamp:            i64,

  // Admission-only fields.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub duplicate_status:     Option<Status>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub duplicate_timestamp:  Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub duplicate_age_seconds: Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub blocked_instance:     Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub time_window_minutes:  Option<i64>,

  // Completion-only fields.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status:               Option<Status>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub pp_status_code:       Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub filename:             Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub complete_dir:         Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub match_method:         Option<MatchMethod>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub history_updated:      Option<bool>,

  /// Every host-provided identifying variable; only present when the
  /// operator opted in to raw data.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub all_env_vars:         Option<BTreeMap<String, String>>,
}

impl NotificationPayload {
  /// A payload with only the common fields set.
  pub fn new(
    script_type: ScriptType,
    action: EventKind,
    title: impl Into<String>,
    message: impl Into<String>,
    timestamp: i64,
  ) -> Self {
    Self {
      title: title.into(),
      message: message.into(),
      priority: None,
      script_type,
      action,
      nzb_name: String::new(),
      category: String::new(),
      duplicate_key: String::new(),
      timestamp,
      duplicate_status: None,
      duplicate_timestamp: None,
      duplicate_age_seconds: None,
      blocked_instance: None,
      time_window_minutes: None,
      status: None,
      pp_status_code: None,
      filename: None,
      complete_dir: None,
      match_method: None,
      history_updated: None,
      all_env_vars: None,
    }
  }

  /// Age of the colliding record in whole minutes.
  pub fn duplicate_age_minutes(&self) -> Option<i64> {
    self.duplicate_age_seconds.map(|s| s / 60)
  }

  pub fn to_json(&self) -> Result<serde_json::Value> {
    let mut value = serde_json::to_value(self)?;
    if let (Some(minutes), Some(obj)) = (self.duplicate_age_minutes(), value.as_object_mut()) {
      obj.insert("duplicate_age_minutes".into(), minutes.into());
    }
    Ok(value)
  }
}

// ─── Capability ──────────────────────────────────────────────────────────────

/// A delivery channel for hook events.
///
/// Only [`Notifier::send`] is required. Channels that can make use of the full
/// structured payload override [`Notifier::send_raw`]; the default degrades
/// to `send` with the payload's title and message.
pub trait Notifier: Send + Sync {
  /// Label used in log lines.
  fn name(&self) -> &str;

  /// Deliver a plain title/message notification. Returns `true` on success.
  fn send<'a>(
    &'a self,
    title: &'a str,
    message: &'a str,
  ) -> impl Future<Output = bool> + Send + 'a;

  /// Deliver the full payload.
  fn send_raw<'a>(
    &'a self,
    payload: &'a NotificationPayload,
  ) -> impl Future<Output = bool> + Send + 'a {
    self.send(&payload.title, &payload.message)
  }
}
