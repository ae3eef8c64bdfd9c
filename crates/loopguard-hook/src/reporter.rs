//! Post-processing completion reporter.

use loopguard_core::{
  completion::{CompletionOutcome, CompletionRequest},
  matcher::MatchPolicy,
  notify::Notifier,
  record::Status,
  store::HistoryStore,
};

use crate::{
  dispatch::{Dispatcher, completed_payload},
  host::DownloadInfo,
  settings::{CategoryFilter, Settings},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionReport {
  /// `None` when the category is ignored or the store could not be reached.
  pub outcome:  Option<CompletionOutcome>,
  pub status:   Status,
  pub notified: bool,
}

impl CompletionReport {
  pub fn updated(&self) -> bool { self.outcome.as_ref().is_some_and(|o| o.updated.is_some()) }
}

pub struct CompletionReporter<S, N> {
  store:      S,
  dispatcher: Dispatcher<N>,
  filter:     CategoryFilter,
  policy:     MatchPolicy,
  notify:     bool,
}

impl<S: HistoryStore, N: Notifier> CompletionReporter<S, N> {
  pub fn new(store: S, dispatcher: Dispatcher<N>, settings: &Settings) -> Self {
    Self {
      store,
      dispatcher,
      filter: settings.category_filter(),
      policy: settings.match_policy(),
      notify: settings.notify_on_completion,
    }
  }

  /// Record the final status of `download`.
  ///
  /// Only an existing `PENDING` record is ever changed. Nothing is appended
  /// when none matches.
  pub async fn report(&self, download: &DownloadInfo, now: i64) -> CompletionReport {
    let status = Status::from_pp_code(&download.pp_status);
    tracing::info!(
      name = %download.name,
      category = download.category_label(),
      pp_status = %download.pp_status,
      %status,
      "post-process report"
    );

    if let Some(reason) = self.filter.skip_reason(&download.category) {
      tracing::info!(%reason, "skipping history update");
      return CompletionReport { outcome: None, status, notified: false };
    }

    tracing::debug!(
      duplicate_key = %download.duplicate_key,
      filename = %download.filename,
      complete_dir = %download.complete_dir,
      "identifiers"
    );

    let request = CompletionRequest {
      identity: download.identity(),
      outcome:  status.clone(),
      policy:   self.policy,
    };

    let outcome = match self.store.complete(&request).await {
      Ok(o) => Some(o),
      Err(e) => {
        tracing::error!(error = %e, "history unavailable, status not recorded");
        None
      }
    };

    match outcome.as_ref().and_then(|o| o.updated.as_ref()) {
      Some(updated) => tracing::info!(
        line = updated.index + 1,
        method = %updated.method,
        from = %updated.previous.status,
        to = %updated.current.status,
        "history updated"
      ),
      None => {
        if let Some(o) = &outcome {
          tracing::warn!(
            scanned = o.scanned,
            name = %download.name,
            "no pending history entry matched; not adding a new one"
          );
          tracing::warn!(
            "possible causes: admitted before the hook was installed, already settled, \
             category ignored at admission, or identifiers changed since admission"
          );
        }
      }
    }

    let notified = if self.notify {
      let method = outcome.as_ref().and_then(CompletionOutcome::method);
      self
        .dispatcher
        .deliver(completed_payload(download, &status, method, now))
        .await
    } else {
      false
    };

    CompletionReport { outcome, status, notified }
  }
}
