//! Generic JSON webhook. Receives the full structured payload when raw data
//! is enabled, otherwise just `{title, message}`.

use loopguard_core::notify::{NotificationPayload, Notifier};
use serde_json::{Value, json};

use crate::{NotifierConfig, Result, http_client};

#[derive(Debug, Clone)]
pub struct WebhookNotifier {
  client: reqwest::Client,
  name:   String,
  url:    String,
  token:  Option<String>,
}

impl WebhookNotifier {
  pub fn new(config: &NotifierConfig, verify_ssl: bool) -> Result<Self> {
    let token = config.token.trim();
    Ok(Self {
      client: http_client(verify_ssl)?,
      name:   config.name.clone(),
      url:    config.url.clone(),
      token:  (!token.is_empty()).then(|| token.to_owned()),
    })
  }

  async fn post(&self, body: &Value) -> bool {
    let mut req = self.client.post(&self.url).json(body);
    if let Some(token) = &self.token {
      req = req.bearer_auth(token);
    }

    match req.send().await {
      Ok(resp) if resp.status().is_success() => {
        tracing::info!(notifier = %self.name, "webhook delivered");
        true
      }
      Ok(resp) => {
        tracing::error!(notifier = %self.name, status = %resp.status(), "webhook rejected");
        false
      }
      Err(e) => {
        tracing::error!(notifier = %self.name, error = %e, "webhook failed");
        false
      }
    }
  }
}

impl Notifier for WebhookNotifier {
  fn name(&self) -> &str { &self.name }

  async fn send(&self, title: &str, message: &str) -> bool {
    self.post(&json!({ "title": title, "message": message })).await
  }

  async fn send_raw(&self, payload: &NotificationPayload) -> bool {
    match payload.to_json() {
      Ok(body) => self.post(&body).await,
      Err(e) => {
        tracing::error!(notifier = %self.name, error = %e, "could not serialise payload");
        self.send(&payload.title, &payload.message).await
      }
    }
  }
}
