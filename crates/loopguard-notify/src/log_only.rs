//! A notifier that only writes to the log. Useful to check what would be
//! sent before wiring up a real channel.

use loopguard_core::notify::{NotificationPayload, Notifier};

#[derive(Debug, Clone)]
pub struct LogNotifier {
  name: String,
}

impl LogNotifier {
  pub fn new(name: impl Into<String>) -> Self { Self { name: name.into() } }
}

impl Notifier for LogNotifier {
  fn name(&self) -> &str { &self.name }

  async fn send(&self, title: &str, message: &str) -> bool {
    tracing::info!(notifier = %self.name, title, message, "notification");
    true
  }

  async fn send_raw(&self, payload: &NotificationPayload) -> bool {
    match payload.to_json() {
      Ok(json) => {
        tracing::info!(notifier = %self.name, payload = %json, "notification");
        true
      }
      Err(e) => {
        tracing::error!(notifier = %self.name, error = %e, "could not serialise payload");
        false
      }
    }
  }
}
