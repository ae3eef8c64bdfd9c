//! Pre-queue admission gate.

use loopguard_core::{
  admission::{AdmissionDecision, AdmissionRequest},
  blocklist::{BlockRequest, Blocklister},
  matcher::MatchPolicy,
  notify::Notifier,
  store::HistoryStore,
};

use crate::{
  dispatch::{Dispatcher, blocked_payload},
  host::{DownloadInfo, HostResponse},
  settings::{CategoryFilter, Settings},
};

/// The answer for the host, available before any downstream work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
  pub response: HostResponse,
  /// `None` when the store could not be reached.
  pub decision: Option<AdmissionDecision>,
}

/// What one admission check did, downstream work included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateReport {
  pub response:         HostResponse,
  pub decision:         Option<AdmissionDecision>,
  pub blocked_instance: Option<String>,
  pub notified:         bool,
}

pub struct AdmissionGate<S, B, N> {
  store:               S,
  blocklister:         B,
  dispatcher:          Dispatcher<N>,
  filter:              CategoryFilter,
  policy:              MatchPolicy,
  time_window_minutes: i64,
}

impl<S, B, N> AdmissionGate<S, B, N>
where
  S: HistoryStore,
  B: Blocklister,
  N: Notifier,
{
  pub fn new(store: S, blocklister: B, dispatcher: Dispatcher<N>, settings: &Settings) -> Self {
    Self {
      store,
      blocklister,
      dispatcher,
      filter: settings.category_filter(),
      policy: settings.match_policy(),
      time_window_minutes: settings.time_window_minutes,
    }
  }

  fn window_seconds(&self) -> i64 { self.time_window_minutes.saturating_mul(60) }

  /// Decide whether `download` may be queued. Only the history is
  /// consulted, so the host can be answered right away.
  ///
  /// Any failure to reach the history admits the download: refusing is only
  /// ever the result of a positive match.
  pub async fn answer(&self, download: &DownloadInfo, now: i64) -> Answer {
    tracing::info!(
      name = %download.name,
      category = download.category_label(),
      duplicate_key = %download.duplicate_key,
      "pre-queue check"
    );

    let skip = self.filter.skip_reason(&download.category);
    if let Some(reason) = &skip {
      tracing::info!(%reason, "skipping loop check");
    }

    let request = AdmissionRequest {
      category:       download.category.clone(),
      identity:       download.identity(),
      window_seconds: self.window_seconds(),
      policy:         self.policy,
      track:          skip.is_none(),
    };

    let decision = match self.store.admit(&request, now).await {
      Ok(d) => d,
      Err(e) => {
        tracing::error!(error = %e, "history unavailable, accepting without recording");
        return Answer { response: HostResponse::Accept, decision: None };
      }
    };

    if decision.swept > 0 {
      tracing::info!(dropped = decision.swept, "cleaned expired history entries");
    }

    match decision.matched.as_ref() {
      Some(m) if decision.is_blocked() => tracing::warn!(
        name = %download.name,
        method = %m.method,
        status = %m.record.status,
        age_minutes = m.age_seconds / 60,
        "duplicate within window, refusing"
      ),
      Some(m) => tracing::info!(status = %m.record.status, "previous attempt failed, allowing retry"),
      None if decision.recorded.is_some() => tracing::info!("new download, recorded as pending"),
      None => {}
    }

    let response = if decision.is_blocked() { HostResponse::Reject } else { HostResponse::Accept };
    Answer { response, decision: Some(decision) }
  }

  /// Downstream blocklisting and notification for a refused download; run
  /// after the host has its answer. Admitted downloads need nothing more.
  pub async fn follow_up(&self, download: &DownloadInfo, answer: Answer, now: i64) -> GateReport {
    let Answer { response, decision } = answer;
    let Some(matched) = decision
      .as_ref()
      .filter(|d| d.is_blocked())
      .and_then(|d| d.matched.as_ref())
    else {
      return GateReport { response, decision, blocked_instance: None, notified: false };
    };

    let blocked_instance = if decision.as_ref().is_some_and(AdmissionDecision::blocked_after_success) {
      let block = BlockRequest {
        name:           download.name.clone(),
        category:       download.category.clone(),
        window_seconds: self.window_seconds(),
        now,
      };
      let result = self.blocklister.block(&block).await;
      if result.is_none() {
        tracing::warn!("could not blocklist downstream");
      }
      result
    } else {
      tracing::info!(status = %matched.record.status, "not blocklisting downstream");
      None
    };

    let payload = blocked_payload(
      download,
      matched,
      blocked_instance.as_deref(),
      self.time_window_minutes,
      now,
    );
    let notified = self.dispatcher.deliver(payload).await;

    GateReport { response, decision, blocked_instance, notified }
  }
}
