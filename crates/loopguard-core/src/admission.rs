//! Admission decision: should a download about to be queued be let through?
//!
//! Everything here is pure. The store backend runs [`sweep`] and [`decide`]
//! inside a single locked read-modify-write so that two admissions of the
//! same download cannot both observe an empty history.

use serde::Serialize;

use crate::{
  matcher::{Identity, MatchMethod, MatchPolicy, match_record},
  record::{HistoryRecord, Status, StoreLine},
};

// ─── Request / result types ──────────────────────────────────────────────────

/// Everything the admission check knows about the incoming download.
#[derive(Debug, Clone)]
pub struct AdmissionRequest {
  pub category:       String,
  pub identity:       Identity,
  /// Retention window; older records neither match nor survive the sweep.
  pub window_seconds: i64,
  pub policy:         MatchPolicy,
  /// When `false` the download is admitted without consulting or recording
  /// history (ignored categories). The sweep still runs.
  pub track:          bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
  Admit,
  Block,
}

/// An existing record that the incoming download collided with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRecord {
  pub record:      HistoryRecord,
  pub method:      MatchMethod,
  pub age_seconds: i64,
}

/// Result of a complete admission transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionDecision {
  pub verdict:  Verdict,
  pub matched:  Option<MatchedRecord>,
  /// The `PENDING` record appended on admission, if any.
  pub recorded: Option<HistoryRecord>,
  /// Lines removed by the expiry sweep in the same transaction.
  pub swept:    usize,
}

impl AdmissionDecision {
  pub fn is_blocked(&self) -> bool { self.verdict == Verdict::Block }

  /// `true` when the collision was with a download that already completed,
  /// which is when the downstream service should be asked to blocklist it.
  pub fn blocked_after_success(&self) -> bool {
    self.is_blocked()
      && self
        .matched
        .as_ref()
        .is_some_and(|m| m.record.status == Status::Success)
  }
}

// ─── Sweep ───────────────────────────────────────────────────────────────────

/// Keep only decodable records younger than `window_seconds`.
///
/// Returns the surviving lines and how many were dropped. Malformed lines
/// are always dropped here; there is no timestamp to judge them by.
pub fn sweep(lines: Vec<StoreLine>, window_seconds: i64, now: i64) -> (Vec<StoreLine>, usize) {
  let before = lines.len();
  let kept: Vec<StoreLine> = lines
    .into_iter()
    .filter(|line| {
      line
        .as_record()
        .is_some_and(|r| r.within_window(window_seconds, now))
    })
    .collect();
  let dropped = before - kept.len();
  (kept, dropped)
}

// ─── Decision ────────────────────────────────────────────────────────────────

/// Find the first record, in store order, that matches the request's
/// identity and is still inside the retention window.
pub fn find_collision(
  lines: &[StoreLine],
  request: &AdmissionRequest,
  now: i64,
) -> Option<MatchedRecord> {
  lines.iter().filter_map(StoreLine::as_record).find_map(|record| {
    let method = match_record(&request.identity, record, request.policy)?;
    record
      .within_window(request.window_seconds, now)
      .then(|| MatchedRecord {
        record: record.clone(),
        method,
        age_seconds: record.age(now),
      })
  })
}

/// Verdict for a collision with a record in `status`.
///
/// A failed attempt may be retried; anything in flight, completed, or in a
/// state we do not recognise is refused.
pub fn verdict_for(status: &Status) -> Verdict {
  match status {
    Status::Failed => Verdict::Admit,
    Status::Pending | Status::Success | Status::Other(_) => Verdict::Block,
  }
}

/// Decide the request against already-swept `lines`.
///
/// On admission the returned decision carries the `PENDING` record the
/// caller must append; on block nothing is to be written.
pub fn decide(lines: &[StoreLine], request: &AdmissionRequest, now: i64) -> AdmissionDecision {
  if !request.track {
    return AdmissionDecision {
      verdict:  Verdict::Admit,
      matched:  None,
      recorded: None,
      swept:    0,
    };
  }

  let matched = find_collision(lines, request, now);
  let verdict = matched
    .as_ref()
    .map_or(Verdict::Admit, |m| verdict_for(&m.record.status));

  let recorded = (verdict == Verdict::Admit).then(|| {
    HistoryRecord::pending(
      now,
      request.category.clone(),
      request.identity.name.clone(),
      request.identity.duplicate_key.clone(),
    )
  });

  AdmissionDecision { verdict, matched, recorded, swept: 0 }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::codec::parse_store;

  const WINDOW: i64 = 3_600;
  const NOW: i64 = 100_000;

  fn request(name: &str, key: &str) -> AdmissionRequest {
    AdmissionRequest {
      category:       "tv".into(),
      identity:       Identity::new(name, key),
      window_seconds: WINDOW,
      policy:         MatchPolicy::default(),
      track:          true,
    }
  }

  fn line(ts: i64, name: &str, key: &str, status: &str) -> String {
    format!("{ts}|tv|{name}|{key}|{status}\n")
  }

  #[test]
  fn sweep_drops_expired_and_malformed() {
    let contents = [
      line(NOW - WINDOW, "Old", "", "SUCCESS"),
      line(NOW - WINDOW + 1, "Fresh", "", "PENDING"),
      "not a record\n".to_owned(),
    ]
    .concat();
    let (kept, dropped) = sweep(parse_store(&contents), WINDOW, NOW);
    assert_eq!(dropped, 2);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].as_record().unwrap().name, "Fresh");
  }

  #[test]
  fn sweep_is_idempotent() {
    let contents = [
      line(NOW - 10, "A", "", "PENDING"),
      line(NOW - 10 * WINDOW, "B", "", "FAILED"),
      "junk\n".to_owned(),
    ]
    .concat();
    let (once, _) = sweep(parse_store(&contents), WINDOW, NOW);
    let (twice, dropped) = sweep(once.clone(), WINDOW, NOW);
    assert_eq!(once, twice);
    assert_eq!(dropped, 0);
  }

  #[test]
  fn no_history_admits_and_records() {
    let d = decide(&[], &request("Show", "k"), NOW);
    assert_eq!(d.verdict, Verdict::Admit);
    assert!(d.matched.is_none());
    let rec = d.recorded.unwrap();
    assert_eq!(rec.timestamp, NOW);
    assert_eq!(rec.status, Status::Pending);
    assert_eq!(rec.duplicate_key, "k");
  }

  #[test]
  fn pending_and_success_block() {
    for status in ["PENDING", "SUCCESS"] {
      let lines = parse_store(&line(NOW - 5, "Show", "k", status));
      let d = decide(&lines, &request("Other name", "k"), NOW);
      assert_eq!(d.verdict, Verdict::Block, "{status}");
      assert!(d.recorded.is_none());
      assert_eq!(d.matched.unwrap().method, MatchMethod::DuplicateKeyExact);
    }
  }

  #[test]
  fn failed_admits_retry() {
    let lines = parse_store(&line(NOW - 5, "Show", "", "FAILED"));
    let d = decide(&lines, &request("Show", ""), NOW);
    assert_eq!(d.verdict, Verdict::Admit);
    assert_eq!(d.matched.unwrap().record.status, Status::Failed);
    assert!(d.recorded.is_some());
  }

  #[test]
  fn unknown_status_blocks() {
    let lines = parse_store(&line(NOW - 5, "Show", "", "PAUSED"));
    assert!(decide(&lines, &request("Show", ""), NOW).is_blocked());
  }

  #[test]
  fn first_match_in_file_order_wins() {
    let contents = [
      line(NOW - 50, "Show S01E01 REPACK", "", "FAILED"),
      line(NOW - 10, "Show S01E01", "", "SUCCESS"),
    ]
    .concat();
    let d = decide(&parse_store(&contents), &request("Show S01E01", ""), NOW);
    // The partial match on the first line wins over the later exact match.
    let m = d.matched.unwrap();
    assert_eq!(m.method, MatchMethod::NamePartial);
    assert_eq!(d.verdict, Verdict::Admit);
  }

  #[test]
  fn expired_match_is_skipped() {
    let contents = [
      line(NOW - 2 * WINDOW, "Show", "", "SUCCESS"),
      line(NOW - 10, "Show", "", "FAILED"),
    ]
    .concat();
    let d = decide(&parse_store(&contents), &request("Show", ""), NOW);
    assert_eq!(d.matched.unwrap().age_seconds, 10);
    assert_eq!(d.verdict, Verdict::Admit);
  }

  #[test]
  fn untracked_requests_admit_without_recording() {
    let lines = parse_store(&line(NOW - 5, "Show", "", "PENDING"));
    let mut req = request("Show", "");
    req.track = false;
    let d = decide(&lines, &req, NOW);
    assert_eq!(d.verdict, Verdict::Admit);
    assert!(d.recorded.is_none());
    assert!(d.matched.is_none());
  }

  #[test]
  fn blocked_after_success_only_for_success() {
    let lines = parse_store(&line(NOW - 5, "Show", "", "SUCCESS"));
    assert!(decide(&lines, &request("Show", ""), NOW).blocked_after_success());
    let lines = parse_store(&line(NOW - 5, "Show", "", "PENDING"));
    assert!(!decide(&lines, &request("Show", ""), NOW).blocked_after_success());
  }
}
