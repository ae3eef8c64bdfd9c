//! Notification channels for loopguard.
//!
//! The set of channels is fixed at compile time. Which one is active is
//! chosen by the `notifier.kind` setting; [`ConfiguredNotifier`] dispatches
//! to it.

mod gotify;
mod log_only;
mod webhook;

pub mod error;

use std::time::Duration;

use loopguard_core::notify::{NotificationPayload, Notifier};
use serde::Deserialize;
use strum::Display;

pub use error::{Error, Result};
pub use gotify::GotifyNotifier;
pub use log_only::LogNotifier;
pub use webhook::WebhookNotifier;

/// Per-request timeout for notification delivery.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(10);

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NotifierKind {
  #[default]
  Gotify,
  Webhook,
  Log,
}

/// The `notifier` section of the settings file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
  pub enabled:  bool,
  pub kind:     NotifierKind,
  /// Label used in log lines.
  pub name:     String,
  pub url:      String,
  /// Gotify application token, or bearer token for webhooks.
  pub token:    String,
  pub priority: i64,
}

impl Default for NotifierConfig {
  fn default() -> Self {
    Self {
      enabled:  false,
      kind:     NotifierKind::Gotify,
      name:     "Gotify".into(),
      url:      "http://localhost:80".into(),
      token:    "your_token".into(),
      priority: 10,
    }
  }
}

// ─── Registry ────────────────────────────────────────────────────────────────

/// The notifier selected by configuration.
#[derive(Debug, Clone)]
pub enum ConfiguredNotifier {
  Gotify(GotifyNotifier),
  Webhook(WebhookNotifier),
  Log(LogNotifier),
}

impl ConfiguredNotifier {
  /// Build the configured channel. `Ok(None)` when notifications are off.
  pub fn from_config(config: &NotifierConfig, verify_ssl: bool) -> Result<Option<Self>> {
    if !config.enabled {
      return Ok(None);
    }

    let require = |field: &'static str, value: &str| {
      if value.trim().is_empty() {
        Err(Error::MissingSetting { kind: config.kind, field })
      } else {
        Ok(())
      }
    };

    let notifier = match config.kind {
      NotifierKind::Gotify => {
        require("url", &config.url)?;
        require("token", &config.token)?;
        Self::Gotify(GotifyNotifier::new(config, verify_ssl)?)
      }
      NotifierKind::Webhook => {
        require("url", &config.url)?;
        Self::Webhook(WebhookNotifier::new(config, verify_ssl)?)
      }
      NotifierKind::Log => Self::Log(LogNotifier::new(&config.name)),
    };

    tracing::debug!(kind = %config.kind, name = %config.name, "notifier ready");
    Ok(Some(notifier))
  }
}

impl Notifier for ConfiguredNotifier {
  fn name(&self) -> &str {
    match self {
      Self::Gotify(n) => n.name(),
      Self::Webhook(n) => n.name(),
      Self::Log(n) => n.name(),
    }
  }

  async fn send(&self, title: &str, message: &str) -> bool {
    match self {
      Self::Gotify(n) => n.send(title, message).await,
      Self::Webhook(n) => n.send(title, message).await,
      Self::Log(n) => n.send(title, message).await,
    }
  }

  async fn send_raw(&self, payload: &NotificationPayload) -> bool {
    match self {
      Self::Gotify(n) => n.send_raw(payload).await,
      Self::Webhook(n) => n.send_raw(payload).await,
      Self::Log(n) => n.send_raw(payload).await,
    }
  }
}

fn http_client(verify_ssl: bool) -> Result<reqwest::Client> {
  Ok(
    reqwest::Client::builder()
      .timeout(SEND_TIMEOUT)
      .danger_accept_invalid_certs(!verify_ssl)
      .build()?,
  )
}
