//! Runtime settings, read once per activation.
//!
//! Sources, later ones winning: built-in defaults, the JSON/TOML settings
//! file, then `LOOPGUARD_*` environment variables (nested keys use `__`, e.g.
//! `LOOPGUARD_NOTIFIER__URL`).

use std::path::{Path, PathBuf};

use loopguard_arr::ArrInstance;
use loopguard_core::matcher::MatchPolicy;
use loopguard_notify::NotifierConfig;
use serde::Deserialize;
use strum::{Display, EnumString};
use tracing::level_filters::LevelFilter;

/// File name looked up next to the executable when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "prevent_download_loops.json";

// ─── Log level ───────────────────────────────────────────────────────────────

/// Operator-facing verbosity, as written in the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum LogLevel {
  #[default]
  All,
  Info,
  Error,
  None,
}

impl LogLevel {
  pub fn filter(self) -> LevelFilter {
    match self {
      Self::All => LevelFilter::DEBUG,
      Self::Info => LevelFilter::INFO,
      Self::Error => LevelFilter::ERROR,
      Self::None => LevelFilter::OFF,
    }
  }
}

// ─── Category filter ─────────────────────────────────────────────────────────

/// Categories the hook leaves alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter {
  pub ignored:      Vec<String>,
  pub ignore_empty: bool,
}

impl CategoryFilter {
  /// Why `category` is skipped, or `None` if it is tracked.
  pub fn skip_reason(&self, category: &str) -> Option<String> {
    if category.is_empty() {
      return self
        .ignore_empty
        .then(|| "download has no category and ignore_no_category is enabled".to_owned());
    }
    self
      .ignored
      .iter()
      .any(|c| c == category)
      .then(|| format!("category '{category}' is in the ignored list"))
  }
}

// ─── Settings ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// Retention window for history records.
  pub time_window_minutes:  i64,
  pub history_file:         PathBuf,
  /// Empty means log to stderr only.
  pub log_file:             PathBuf,
  /// Rolled-over daily log files kept besides the current one.
  pub max_log_backups:      u32,
  /// One of `ALL`, `INFO`, `ERROR`, `NONE`; see [`Settings::log_level`].
  #[serde(rename = "log_level")]
  pub log_level_raw:        String,
  pub ignored_categories:   Vec<String>,
  pub ignore_no_category:   bool,
  pub verify_ssl:           bool,
  /// Hand notifiers the full structured payload, host variables included.
  pub wants_raw_data:       bool,
  pub use_duplicate_key:    bool,
  pub notify_on_completion: bool,
  pub radarr_instances:     Vec<ArrInstance>,
  pub sonarr_instances:     Vec<ArrInstance>,
  pub notifier:             NotifierConfig,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      time_window_minutes:  1440,
      history_file:         "/config/scripts/download_history.txt".into(),
      log_file:             "/config/scripts/loop_prevention.log".into(),
      max_log_backups:      3,
      log_level_raw:        LogLevel::All.to_string(),
      ignored_categories:   Vec::new(),
      ignore_no_category:   false,
      verify_ssl:           true,
      wants_raw_data:       false,
      use_duplicate_key:    true,
      notify_on_completion: true,
      radarr_instances:     Vec::new(),
      sonarr_instances:     Vec::new(),
      notifier:             NotifierConfig::default(),
    }
  }
}

impl Settings {
  /// Load from `path` (optional file) and the environment.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("LOOPGUARD")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("ignored_categories"),
      )
      .build()?
      .try_deserialize()
  }

  /// `prevent_download_loops.json` beside the running executable, falling
  /// back to the working directory.
  pub fn default_path() -> PathBuf {
    std::env::current_exe()
      .ok()
      .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_CONFIG_FILE)))
      .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
  }

  /// The parsed log level; unrecognised values are reported to the caller.
  pub fn log_level(&self) -> Result<LogLevel, strum::ParseError> { self.log_level_raw.parse() }

  pub fn window_seconds(&self) -> i64 { self.time_window_minutes.saturating_mul(60) }

  pub fn match_policy(&self) -> MatchPolicy {
    MatchPolicy { use_duplicate_key: self.use_duplicate_key }
  }

  pub fn category_filter(&self) -> CategoryFilter {
    CategoryFilter {
      ignored:      self.ignored_categories.clone(),
      ignore_empty: self.ignore_no_category,
    }
  }

  pub fn log_file(&self) -> Option<&Path> {
    (!self.log_file.as_os_str().is_empty()).then_some(self.log_file.as_path())
  }
}

#[cfg(test)]
mod tests {
  use std::fs;

  use loopguard_notify::NotifierKind;
  use serial_test::serial;

  use super::*;

  const WINDOW_VAR: &str = "LOOPGUARD_TIME_WINDOW_MINUTES";
  const NOTIFIER_URL_VAR: &str = "LOOPGUARD_NOTIFIER__URL";

  #[test]
  #[serial]
  fn missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let s = Settings::load(&dir.path().join("absent.json")).unwrap();
    assert_eq!(s.time_window_minutes, 1440);
    assert_eq!(s.window_seconds(), 86_400);
    assert!(s.use_duplicate_key);
    assert!(!s.notifier.enabled);
    assert_eq!(s.log_level().unwrap(), LogLevel::All);
  }

  #[test]
  #[serial]
  fn file_overrides_merge_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prevent_download_loops.json");
    fs::write(
      &path,
      r#"{
        "time_window_minutes": 60,
        "history_file": "/tmp/h.txt",
        "log_level": "error",
        "ignored_categories": ["software"],
        "radarr_instances": [
          {"category": "movies", "url": "http://radarr:7878", "api_key": "k"}
        ],
        "notifier": {"enabled": true, "kind": "log", "name": "Logger"}
      }"#,
    )
    .unwrap();

    let s = Settings::load(&path).unwrap();
    assert_eq!(s.window_seconds(), 3_600);
    assert_eq!(s.history_file, PathBuf::from("/tmp/h.txt"));
    assert_eq!(s.log_level().unwrap(), LogLevel::Error);
    assert_eq!(s.radarr_instances[0].url, "http://radarr:7878");
    assert!(s.sonarr_instances.is_empty());
    assert_eq!(s.notifier.kind, NotifierKind::Log);
    assert_eq!(s.notifier.priority, 10);
    assert!(s.verify_ssl);
  }

  #[test]
  #[serial]
  #[allow(unsafe_code)]
  fn environment_overrides_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(&path, r#"{"time_window_minutes": 30, "notifier": {"url": "http://file"}}"#).unwrap();

    // Tests touching the environment are serialised.
    unsafe {
      std::env::set_var(WINDOW_VAR, "60");
      std::env::set_var(NOTIFIER_URL_VAR, "http://gotify:8080");
    }
    let loaded = Settings::load(&path);
    unsafe {
      std::env::remove_var(WINDOW_VAR);
      std::env::remove_var(NOTIFIER_URL_VAR);
    }

    let s = loaded.unwrap();
    assert_eq!(s.time_window_minutes, 60);
    assert_eq!(s.notifier.url, "http://gotify:8080");
    assert_eq!(s.notifier.priority, 10);
  }

  #[test]
  fn unknown_log_level_is_an_error_not_a_panic() {
    let s = Settings { log_level_raw: "LOUD".into(), ..Settings::default() };
    assert!(s.log_level().is_err());
  }

  #[test]
  fn category_filter_rules() {
    let f = CategoryFilter { ignored: vec!["software".into()], ignore_empty: true };
    assert!(f.skip_reason("software").is_some());
    assert!(f.skip_reason("").is_some());
    assert!(f.skip_reason("movies").is_none());

    let f = CategoryFilter::default();
    assert!(f.skip_reason("").is_none());
  }

  #[test]
  fn empty_log_file_means_stderr() {
    let s = Settings { log_file: PathBuf::new(), ..Settings::default() };
    assert!(s.log_file().is_none());
  }
}
