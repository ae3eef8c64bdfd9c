//! [`FileStore`], the flat-file implementation of [`HistoryStore`].

use std::{
  io,
  path::{Path, PathBuf},
  sync::Arc,
};

use loopguard_core::{
  admission::{self, AdmissionDecision, AdmissionRequest},
  codec::{encode, parse_store, render_store},
  completion::{self, CompletionOutcome, CompletionRequest},
  record::{HistoryRecord, StoreLine},
  store::{HistoryStore, SweepReport},
};

use crate::{LockedFile, Result, with_exclusive_access};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A history store backed by a single text file.
///
/// Cloning is cheap; the path is reference-counted. No contents are cached;
/// every call re-reads the file under the lock.
#[derive(Debug, Clone)]
pub struct FileStore {
  path: Arc<PathBuf>,
}

impl FileStore {
  pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: Arc::new(path.into()) } }

  /// Create the file (and its parent directories) if it is missing.
  pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
    let store = Self::new(path);
    store.call(|_| Ok(())).await?;
    Ok(store)
  }

  pub fn path(&self) -> &Path { &self.path }

  /// Run `f` on a blocking thread while holding the file lock.
  async fn call<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut LockedFile) -> io::Result<T> + Send + 'static,
  {
    let path = Arc::clone(&self.path);
    tokio::task::spawn_blocking(move || with_exclusive_access(&path, f)).await?
  }
}

/// Append one encoded record, repairing a missing final newline first.
fn append_record(file: &mut LockedFile, existing: &str, record: &HistoryRecord) -> io::Result<()> {
  let line = encode(record);
  if existing.is_empty() || existing.ends_with('\n') {
    file.append(&line)
  } else {
    file.append(&format!("\n{line}"))
  }
}

// ─── HistoryStore impl ───────────────────────────────────────────────────────

impl HistoryStore for FileStore {
  type Error = crate::Error;

  async fn sweep(&self, window_seconds: i64, now: i64) -> Result<SweepReport> {
    let report = self
      .call(move |file| {
        let lines = parse_store(&file.read_all()?);
        let (kept, dropped) = admission::sweep(lines, window_seconds, now);
        if dropped > 0 {
          file.rewrite(&render_store(&kept))?;
        }
        Ok(SweepReport { kept: kept.len(), dropped })
      })
      .await?;

    tracing::debug!(kept = report.kept, dropped = report.dropped, "history swept");
    Ok(report)
  }

  async fn admit(&self, request: &AdmissionRequest, now: i64) -> Result<AdmissionDecision> {
    let request = request.clone();

    self
      .call(move |file| {
        let contents = file.read_all()?;
        let (mut kept, dropped) =
          admission::sweep(parse_store(&contents), request.window_seconds, now);

        let mut decision = admission::decide(&kept, &request, now);
        decision.swept = dropped;

        match (&decision.recorded, dropped) {
          (Some(record), 0) => append_record(file, &contents, record)?,
          (Some(record), _) => {
            kept.push(StoreLine::new(record.clone()));
            file.rewrite(&render_store(&kept))?;
          }
          (None, 0) => {}
          (None, _) => file.rewrite(&render_store(&kept))?,
        }

        Ok(decision)
      })
      .await
  }

  async fn complete(&self, request: &CompletionRequest) -> Result<CompletionOutcome> {
    let request = request.clone();

    self
      .call(move |file| {
        let mut lines = parse_store(&file.read_all()?);
        let outcome = completion::settle(&mut lines, &request);
        if outcome.updated.is_some() {
          file.rewrite(&render_store(&lines))?;
        }
        Ok(outcome)
      })
      .await
  }
}
