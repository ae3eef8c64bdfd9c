//! Tracing setup.
//!
//! Output goes to the configured log file, rolled daily with a bounded number
//! of old files kept, or to stderr when no file is set or it cannot be
//! opened. Stdout is reserved for the host protocol and is never written to.

use std::{io, path::Path};

use tracing_appender::{
  non_blocking::WorkerGuard,
  rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{EnvFilter, fmt::writer::BoxMakeWriter};

use crate::settings::{LogLevel, Settings};

/// A daily-rolling appender for `path`, keeping the current file plus
/// `backups` older ones. Creates the directory if needed.
pub fn file_appender(path: &Path, backups: u32) -> io::Result<RollingFileAppender> {
  let prefix = path
    .file_name()
    .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "log_file has no file name"))?;
  let dir = path
    .parent()
    .filter(|p| !p.as_os_str().is_empty())
    .unwrap_or(Path::new("."));

  RollingFileAppender::builder()
    .rotation(Rotation::DAILY)
    .filename_prefix(prefix.to_string_lossy())
    .max_log_files(backups as usize + 1)
    .build(dir)
    .map_err(|e| io::Error::other(e.to_string()))
}

/// Install the global subscriber for this activation.
///
/// `RUST_LOG` overrides the configured level. Problems with the log file or
/// the level setting are reported through the installed subscriber once it
/// is up; they never abort the hook. Hold the returned guard until exit so
/// buffered lines reach the file.
pub fn init(settings: &Settings) -> Option<WorkerGuard> {
  let level = settings.log_level();
  let filter = EnvFilter::builder()
    .with_default_directive(level.unwrap_or_default().filter().into())
    .from_env_lossy();

  let mut file_error = None;
  let mut guard = None;
  let (writer, ansi) = match settings.log_file() {
    Some(path) => match file_appender(path, settings.max_log_backups) {
      Ok(appender) => {
        let (non_blocking, g) = tracing_appender::non_blocking(appender);
        guard = Some(g);
        (BoxMakeWriter::new(non_blocking), false)
      }
      Err(e) => {
        file_error = Some((path.to_path_buf(), e));
        (BoxMakeWriter::new(io::stderr), true)
      }
    },
    None => (BoxMakeWriter::new(io::stderr), true),
  };

  let installed = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(ansi)
    .with_target(false)
    .try_init();
  if installed.is_err() {
    return None;
  }

  if let Some((path, error)) = file_error {
    tracing::error!(path = %path.display(), %error, "cannot open log file, logging to stderr");
  }
  if level.is_err() {
    tracing::warn!(
      value = %settings.log_level_raw,
      fallback = %LogLevel::default(),
      "unrecognised log_level"
    );
  }
  guard
}

/// Stderr-only subscriber for failures that happen before settings load.
/// No-op if a subscriber is already installed.
pub fn init_fallback() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LogLevel::default().filter().into())
        .from_env_lossy(),
    )
    .with_writer(io::stderr)
    .try_init();
}
