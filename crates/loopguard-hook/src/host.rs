//! The download client side of the conversation: what SABnzbd hands the hook
//! and what it expects back.

use std::{collections::BTreeMap, io};

use loopguard_core::matcher::Identity;

/// Prefix of every host-provided environment variable.
pub const HOST_VAR_PREFIX: &str = "SAB_";

/// Number of lines in a pre-queue answer.
const RESPONSE_LINES: usize = 7;

/// Identifying fields of the download the hook was invoked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadInfo {
  pub name:          String,
  pub category:      String,
  pub duplicate_key: String,
  /// Only provided at completion.
  pub filename:      String,
  pub complete_dir:  String,
  /// Post-processing status code; only provided at completion.
  pub pp_status:     String,
}

impl DownloadInfo {
  pub fn identity(&self) -> Identity {
    Identity::new(&self.name, &self.duplicate_key).with_filename(&self.filename)
  }

  pub fn category_label(&self) -> &str {
    if self.category.is_empty() { "None" } else { &self.category }
  }
}

/// Every `SAB_*` variable in the current process environment.
pub fn host_vars() -> BTreeMap<String, String> {
  std::env::vars()
    .filter(|(k, _)| k.starts_with(HOST_VAR_PREFIX))
    .collect()
}

// ─── Pre-queue answer ────────────────────────────────────────────────────────

/// What the pre-queue hook tells the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostResponse {
  /// Seven empty lines: queue it, change nothing.
  Accept,
  /// `0` then six empty lines: refuse it.
  Reject,
}

impl HostResponse {
  pub fn render(self) -> String {
    let mut out = match self {
      Self::Accept => String::from("\n"),
      Self::Reject => String::from("0\n"),
    };
    out.push_str(&"\n".repeat(RESPONSE_LINES - 1));
    out
  }

  /// Write the answer and flush; the host reads it as soon as we exit.
  pub fn write_to(self, mut out: impl io::Write) -> io::Result<()> {
    out.write_all(self.render().as_bytes())?;
    out.flush()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accept_is_seven_empty_lines() {
    let mut buf = Vec::new();
    HostResponse::Accept.write_to(&mut buf).unwrap();
    assert_eq!(buf, b"\n\n\n\n\n\n\n");
  }

  #[test]
  fn reject_is_zero_then_six_empty_lines() {
    assert_eq!(HostResponse::Reject.render(), "0\n\n\n\n\n\n\n");
    assert_eq!(HostResponse::Reject.render().lines().count(), 7);
  }

  #[test]
  fn identity_carries_filename() {
    let info = DownloadInfo {
      name: "Movie.2023".into(),
      duplicate_key: "movie/2023".into(),
      filename: "Movie.2023.mkv".into(),
      ..DownloadInfo::default()
    };
    let id = info.identity();
    assert_eq!(id.duplicate_key, "movie/2023");
    assert_eq!(id.filename_alt, "Movie.2023.mkv");
    assert_eq!(info.category_label(), "None");
  }
}
