//! Gotify push notifications with markdown bodies.

use loopguard_core::notify::Notifier;
use serde_json::json;

use crate::{NotifierConfig, Result, http_client};

#[derive(Debug, Clone)]
pub struct GotifyNotifier {
  client:   reqwest::Client,
  name:     String,
  url:      String,
  token:    String,
  priority: i64,
}

impl GotifyNotifier {
  pub fn new(config: &NotifierConfig, verify_ssl: bool) -> Result<Self> {
    Ok(Self {
      client:   http_client(verify_ssl)?,
      name:     config.name.clone(),
      url:      config.url.trim_end_matches('/').to_owned(),
      token:    config.token.clone(),
      priority: config.priority,
    })
  }
}

impl Notifier for GotifyNotifier {
  fn name(&self) -> &str { &self.name }

  async fn send(&self, title: &str, message: &str) -> bool {
    let body = json!({
      "title": title,
      "message": message,
      "priority": self.priority,
      "extras": { "client::display": { "contentType": "text/markdown" } },
    });

    let result = self
      .client
      .post(format!("{}/message", self.url))
      .query(&[("token", self.token.as_str())])
      .json(&body)
      .send()
      .await;

    match result {
      Ok(resp) if resp.status().is_success() => {
        tracing::info!(notifier = %self.name, "notification sent");
        true
      }
      Ok(resp) => {
        tracing::error!(notifier = %self.name, status = %resp.status(), "unexpected response status");
        false
      }
      Err(e) => {
        tracing::error!(notifier = %self.name, error = %e, "error sending notification");
        false
      }
    }
  }
}
