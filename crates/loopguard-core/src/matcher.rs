//! Identity matching between an incoming download and stored records.
//!
//! The host hands the hook different identifying fields at admission time
//! and at completion time, so matching is a ladder of progressively looser
//! rules. The first rule that holds decides the [`MatchMethod`]; rules are
//! never ranked against each other across records.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::record::HistoryRecord;

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Identifying fields of the download being checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
  pub name:          String,
  pub duplicate_key: String,
  /// Alternate identifier; only known when reporting completion.
  pub filename_alt:  String,
}

impl Identity {
  pub fn new(name: impl Into<String>, duplicate_key: impl Into<String>) -> Self {
    Self {
      name:          name.into(),
      duplicate_key: duplicate_key.into(),
      filename_alt:  String::new(),
    }
  }

  pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
    self.filename_alt = filename.into();
    self
  }
}

/// Knobs that change which rules are eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchPolicy {
  pub use_duplicate_key: bool,
}

impl Default for MatchPolicy {
  fn default() -> Self { Self { use_duplicate_key: true } }
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// The rule that produced a match, in priority order.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
  DuplicateKeyExact,
  NameExact,
  NameNormalized,
  FilenameExact,
  NamePartial,
}

/// Fold case, trim, and treat `.` and `_` as spaces.
pub fn normalize_name(name: &str) -> String {
  name.trim().to_lowercase().replace(['.', '_'], " ")
}

/// Test `identity` against one record, returning the first rule that holds.
pub fn match_record(
  identity: &Identity,
  record: &HistoryRecord,
  policy: MatchPolicy,
) -> Option<MatchMethod> {
  let name = identity.name.as_str();
  let stored = record.name.as_str();

  if policy.use_duplicate_key
    && !identity.duplicate_key.is_empty()
    && !record.duplicate_key.is_empty()
    && identity.duplicate_key == record.duplicate_key
  {
    return Some(MatchMethod::DuplicateKeyExact);
  }

  if name.is_empty() || stored.is_empty() {
    // Only the alternate filename can still match a named record.
    return (!identity.filename_alt.is_empty() && identity.filename_alt == stored)
      .then_some(MatchMethod::FilenameExact);
  }

  if name == stored {
    return Some(MatchMethod::NameExact);
  }

  let normalized = normalize_name(name);
  if !normalized.is_empty() && normalized == normalize_name(stored) {
    return Some(MatchMethod::NameNormalized);
  }

  if !identity.filename_alt.is_empty() && identity.filename_alt == stored {
    return Some(MatchMethod::FilenameExact);
  }

  if name.contains(stored) || stored.contains(name) {
    return Some(MatchMethod::NamePartial);
  }

  None
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::record::Status;

  fn rec(name: &str, key: &str) -> HistoryRecord {
    HistoryRecord {
      timestamp:     0,
      category:      String::new(),
      name:          name.into(),
      duplicate_key: key.into(),
      status:        Status::Pending,
    }
  }

  fn check(identity: &Identity, record: &HistoryRecord) -> Option<MatchMethod> {
    match_record(identity, record, MatchPolicy::default())
  }

  #[test]
  fn duplicate_key_beats_name() {
    let id = Identity::new("Show.S01E01", "show s01e01");
    assert_eq!(
      check(&id, &rec("Show.S01E01", "show s01e01")),
      Some(MatchMethod::DuplicateKeyExact)
    );
  }

  #[test]
  fn duplicate_key_ignored_when_disabled() {
    let id = Identity::new("Completely Different", "k");
    let r = rec("Show", "k");
    assert_eq!(check(&id, &r), Some(MatchMethod::DuplicateKeyExact));
    assert_eq!(
      match_record(&id, &r, MatchPolicy { use_duplicate_key: false }),
      None
    );
  }

  #[test]
  fn empty_keys_never_match_each_other() {
    let id = Identity::new("A", "");
    assert_eq!(check(&id, &rec("B", "")), None);
  }

  #[test]
  fn exact_then_normalized() {
    let id = Identity::new("Show.S01E01.1080p", "");
    assert_eq!(check(&id, &rec("Show.S01E01.1080p", "")), Some(MatchMethod::NameExact));
    assert_eq!(
      check(&id, &rec("  show s01e01_1080P ", "")),
      Some(MatchMethod::NameNormalized)
    );
  }

  #[test]
  fn filename_alt_is_checked_before_partial() {
    let id = Identity::new("Show S01E01", "").with_filename("Show.S01E01.WEB");
    assert_eq!(check(&id, &rec("Show.S01E01.WEB", "")), Some(MatchMethod::FilenameExact));
  }

  #[test]
  fn filename_alt_matches_even_without_a_name() {
    let id = Identity::new("", "").with_filename("Show.S01E01.WEB");
    assert_eq!(check(&id, &rec("Show.S01E01.WEB", "")), Some(MatchMethod::FilenameExact));
  }

  #[test]
  fn partial_containment_both_directions() {
    let id = Identity::new("Show S01E01", "");
    assert_eq!(check(&id, &rec("Show S01E01 REPACK", "")), Some(MatchMethod::NamePartial));
    assert_eq!(check(&id, &rec("S01E01", "")), Some(MatchMethod::NamePartial));
  }

  #[test]
  fn empty_names_do_not_match() {
    let id = Identity::new("", "");
    assert_eq!(check(&id, &rec("Anything", "")), None);
    let id = Identity::new("Anything", "");
    assert_eq!(check(&id, &rec("", "")), None);
  }

  #[test]
  fn method_names_are_snake_case() {
    assert_eq!(MatchMethod::DuplicateKeyExact.to_string(), "duplicate_key_exact");
    assert_eq!(MatchMethod::NamePartial.as_ref(), "name_partial");
  }
}
