//! Completion: find the `PENDING` record an earlier admission wrote and
//! settle it.

use crate::{
  matcher::{Identity, MatchMethod, MatchPolicy, match_record},
  record::{HistoryRecord, Status, StoreLine},
};

#[derive(Debug, Clone)]
pub struct CompletionRequest {
  pub identity: Identity,
  /// Terminal status to write; [`Status::Success`] or [`Status::Failed`].
  pub outcome:  Status,
  pub policy:   MatchPolicy,
}

/// A record that was moved out of `PENDING`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatedRecord {
  /// Zero-based position of the line in the store.
  pub index:    usize,
  pub previous: HistoryRecord,
  pub current:  HistoryRecord,
  pub method:   MatchMethod,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionOutcome {
  /// `None` when no `PENDING` record matched; the store is then untouched.
  pub updated: Option<UpdatedRecord>,
  /// Number of lines examined.
  pub scanned: usize,
}

impl CompletionOutcome {
  pub fn method(&self) -> Option<MatchMethod> { self.updated.as_ref().map(|u| u.method) }
}

/// Locate the first `PENDING` record matching `identity`, in store order.
///
/// No age filter applies: a record that is still pending was admitted within
/// the window when it was written.
pub fn locate_pending(
  lines: &[StoreLine],
  identity: &Identity,
  policy: MatchPolicy,
) -> Option<(usize, MatchMethod)> {
  lines.iter().enumerate().find_map(|(index, line)| {
    let record = line.as_record().filter(|r| r.status.is_pending())?;
    match_record(identity, record, policy).map(|method| (index, method))
  })
}

/// Apply `request` to `lines` in place.
pub fn settle(lines: &mut [StoreLine], request: &CompletionRequest) -> CompletionOutcome {
  let scanned = lines.len();
  let Some((index, method)) = locate_pending(lines, &request.identity, request.policy) else {
    return CompletionOutcome { updated: None, scanned };
  };

  let StoreLine::Record { record: previous, .. } = &lines[index] else {
    return CompletionOutcome { updated: None, scanned };
  };
  let previous = previous.clone();
  let current = previous.with_status(request.outcome.clone());
  lines[index] = StoreLine::new(current.clone());

  CompletionOutcome {
    updated: Some(UpdatedRecord { index, previous, current, method }),
    scanned,
  }
}
