//! AddressRecord — the single persisted entity — and the verdict it yields.

use chrono::{DateTime, TimeDelta, Utc};

/// One row of the address ledger.
///
/// `first_seen` is assigned once, when the record is created, and never
/// rewritten. Trust is recomputed from it on every lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRecord {
  pub address:    String,
  pub first_seen: DateTime<Utc>,
  pub permanent:  bool,
}

impl AddressRecord {
  /// A freshly seen, non-permanent record.
  pub fn new(address: impl Into<String>, first_seen: DateTime<Utc>) -> Self {
    Self { address: address.into(), first_seen, permanent: false }
  }

  /// Time elapsed between `first_seen` and `now`.
  ///
  /// Negative if the clock moved backwards since the record was created.
  pub fn age(&self, now: DateTime<Utc>) -> TimeDelta { now - self.first_seen }

  /// Classify this record at `now` against the `expiry` window.
  ///
  /// An age exactly equal to `expiry` is still trusted.
  pub fn verdict_at(&self, now: DateTime<Utc>, expiry: TimeDelta) -> Verdict {
    if self.permanent {
      return Verdict::Trusted;
    }
    if self.age(now) > expiry {
      Verdict::Rejected
    } else {
      Verdict::Trusted
    }
  }
}

/// The abstract outcome of a lookup, before it is rendered to wire text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
  /// Unseen, still inside the trust window, or permanent.
  Trusted,
  /// Seen longer ago than the expiry window and not permanent.
  Rejected,
  /// The ledger could not be read or written.
  StoreFault,
}

/// Trim surrounding whitespace from a raw address. Returns `None` when
/// nothing is left.
pub fn normalize_address(raw: &str) -> Option<&str> {
  let trimmed = raw.trim();
  (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record_aged(hours: i64, now: DateTime<Utc>) -> AddressRecord {
    AddressRecord::new("foo@example.org", now - TimeDelta::hours(hours))
  }

  #[test]
  fn young_record_is_trusted() {
    let now = Utc::now();
    let r = record_aged(10, now);
    assert_eq!(r.verdict_at(now, TimeDelta::hours(336)), Verdict::Trusted);
  }

  #[test]
  fn stale_record_is_rejected() {
    let now = Utc::now();
    let r = record_aged(400, now);
    assert_eq!(r.verdict_at(now, TimeDelta::hours(336)), Verdict::Rejected);
  }

  #[test]
  fn exact_boundary_is_trusted() {
    let now = Utc::now();
    let r = record_aged(336, now);
    assert_eq!(r.verdict_at(now, TimeDelta::hours(336)), Verdict::Trusted);
  }

  #[test]
  fn permanent_record_never_expires() {
    let now = Utc::now();
    let mut r = record_aged(100_000, now);
    r.permanent = true;
    assert_eq!(r.verdict_at(now, TimeDelta::zero()), Verdict::Trusted);
  }

  #[test]
  fn future_first_seen_is_trusted() {
    // Backward clock jump: the record looks younger than it is.
    let now = Utc::now();
    let r = AddressRecord::new("a@b", now + TimeDelta::hours(5));
    assert!(r.age(now) < TimeDelta::zero());
    assert_eq!(r.verdict_at(now, TimeDelta::hours(1)), Verdict::Trusted);
  }

  #[test]
  fn normalize_trims_and_rejects_blank() {
    assert_eq!(normalize_address("  foo@example.org \r\n"), Some("foo@example.org"));
    assert_eq!(normalize_address(" \t "), None);
    assert_eq!(normalize_address(""), None);
  }
}
