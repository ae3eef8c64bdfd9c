//! Turns gate and reporter outcomes into notifications.

use std::collections::BTreeMap;

use chrono::DateTime;
use loopguard_core::{
  admission::MatchedRecord,
  matcher::MatchMethod,
  notify::{EventKind, NotificationPayload, Notifier, ScriptType},
  record::Status,
};

use crate::host::DownloadInfo;

const LINE_BREAK: &str = "  \n";

fn format_timestamp(ts: i64) -> String {
  DateTime::from_timestamp(ts, 0)
    .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
    .unwrap_or_else(|| ts.to_string())
}

fn common_lines(download: &DownloadInfo) -> Vec<String> {
  let mut lines = vec![
    format!("**Download:** `{}`", download.name),
    format!("**Category:** `{}`", download.category_label()),
  ];
  if !download.duplicate_key.is_empty() {
    lines.push(format!("**Duplicate Key:** `{}`", download.duplicate_key));
  }
  lines
}

/// Payload for a refused download.
pub fn blocked_payload(
  download: &DownloadInfo,
  matched: &MatchedRecord,
  blocked_instance: Option<&str>,
  time_window_minutes: i64,
  now: i64,
) -> NotificationPayload {
  let mut lines = common_lines(download);
  lines.push(format!(
    "**First Seen:** {} ({} min ago)",
    format_timestamp(matched.record.timestamp),
    matched.age_seconds / 60,
  ));
  lines.push(format!("**Status:** {}", matched.record.status));
  match blocked_instance {
    Some(instance) => lines.push(format!("**Blocked In:** {instance}")),
    None => lines.push("**Action:** Download refused at SABnzbd".to_owned()),
  }
  lines.push(format!("**Window:** {time_window_minutes} minutes"));

  let mut payload = NotificationPayload::new(
    ScriptType::PreQueue,
    EventKind::Blocked,
    "🚫 Download Loop Prevented",
    lines.join(LINE_BREAK),
    now,
  );
  payload.nzb_name = download.name.clone();
  payload.category = download.category.clone();
  payload.duplicate_key = download.duplicate_key.clone();
  payload.duplicate_status = Some(matched.record.status.clone());
  payload.duplicate_timestamp = Some(matched.record.timestamp);
  payload.duplicate_age_seconds = Some(matched.age_seconds);
  payload.blocked_instance = blocked_instance.map(str::to_owned);
  payload.time_window_minutes = Some(time_window_minutes);
  payload
}

/// Payload for a completion report.
pub fn completed_payload(
  download: &DownloadInfo,
  status: &Status,
  method: Option<MatchMethod>,
  now: i64,
) -> NotificationPayload {
  let title = match status {
    Status::Success => "✅ Download Completed",
    _ => "❌ Download Failed",
  };

  let mut lines = common_lines(download);
  lines.push(format!("**Status:** {status} (code: {})", download.pp_status));
  match method {
    Some(m) => lines.push(format!("**Match Method:** {m}")),
    None => lines.push("**Warning:** History entry not found (may not be tracked)".to_owned()),
  }

  let mut payload = NotificationPayload::new(
    ScriptType::PostProcess,
    EventKind::Updated,
    title,
    lines.join(LINE_BREAK),
    now,
  );
  payload.nzb_name = download.name.clone();
  payload.category = download.category.clone();
  payload.duplicate_key = download.duplicate_key.clone();
  payload.status = Some(status.clone());
  payload.pp_status_code = Some(download.pp_status.clone());
  payload.filename = Some(download.filename.clone());
  payload.complete_dir = Some(download.complete_dir.clone());
  payload.match_method = method;
  payload.history_updated = Some(method.is_some());
  payload
}

// ─── Dispatcher ──────────────────────────────────────────────────────────────

/// Delivers payloads through the configured notifier, if any.
pub struct Dispatcher<N> {
  notifier:       Option<N>,
  wants_raw_data: bool,
  priority:       Option<i64>,
  host_vars:      BTreeMap<String, String>,
}

impl<N: Notifier> Dispatcher<N> {
  pub fn new(notifier: Option<N>) -> Self {
    Self { notifier, wants_raw_data: false, priority: None, host_vars: BTreeMap::new() }
  }

  /// Send full payloads, with `host_vars` attached, instead of title and
  /// message only.
  pub fn with_raw_data(mut self, host_vars: BTreeMap<String, String>) -> Self {
    self.wants_raw_data = true;
    self.host_vars = host_vars;
    self
  }

  pub fn with_priority(mut self, priority: i64) -> Self {
    self.priority = Some(priority);
    self
  }

  /// Deliver `payload`. Returns whether a notification went out; failures
  /// are logged and otherwise ignored.
  pub async fn deliver(&self, mut payload: NotificationPayload) -> bool {
    let Some(notifier) = &self.notifier else {
      return false;
    };

    let sent = if self.wants_raw_data {
      payload.priority = self.priority;
      payload.all_env_vars = Some(self.host_vars.clone());
      notifier.send_raw(&payload).await
    } else {
      notifier.send(&payload.title, &payload.message).await
    };

    if sent {
      tracing::info!(notifier = notifier.name(), action = %payload.action, "notification sent");
    } else {
      tracing::error!(notifier = notifier.name(), action = %payload.action, "notification failed");
    }
    sent
  }
}
