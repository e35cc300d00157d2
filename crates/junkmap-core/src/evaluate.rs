//! The trust decision: look an address up, autovivify it if unseen, and age
//! it against the expiry window.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};

use crate::{
  Error, Result,
  ledger::{Ledger, LedgerError},
  record::{AddressRecord, Verdict},
};

/// Convert a configured number of hours into an expiry window.
pub fn expiry_from_hours(hours: f64) -> Result<TimeDelta> {
  if !hours.is_finite() || hours < 0.0 {
    return Err(Error::InvalidExpiry(hours));
  }
  TimeDelta::try_milliseconds((hours * 3_600_000.0).round() as i64)
    .ok_or(Error::InvalidExpiry(hours))
}

/// Evaluate `address` at `now`.
///
/// Unseen addresses are recorded with `first_seen = now` and trusted. Ledger
/// failures are logged and collapse to [`Verdict::StoreFault`].
pub async fn evaluate<L: Ledger>(
  ledger:  &L,
  address: &str,
  now:     DateTime<Utc>,
  expiry:  TimeDelta,
) -> Verdict {
  match find_or_create(ledger, address, now).await {
    Ok(record) => record.verdict_at(now, expiry),
    Err(e) => {
      tracing::error!(address, error = %e, "ledger lookup failed");
      Verdict::StoreFault
    }
  }
}

async fn find_or_create<L: Ledger>(
  ledger:  &L,
  address: &str,
  now:     DateTime<Utc>,
) -> Result<AddressRecord, L::Error> {
  if let Some(record) = ledger.find(address).await? {
    return Ok(record);
  }

  match ledger.create(address, now).await {
    Ok(record) => {
      tracing::info!(address, "recorded new address");
      Ok(record)
    }
    // Another connection inserted the same address between our find and
    // create. Its row is the one that counts.
    Err(e) if e.is_conflict() => {
      tracing::debug!(address, "lost create race, re-reading");
      match ledger.find(address).await? {
        Some(record) => Ok(record),
        None => Err(e),
      }
    }
    Err(e) => Err(e),
  }
}

// ─── Evaluator ───────────────────────────────────────────────────────────────

/// A ledger handle paired with the configured expiry window.
pub struct TrustEvaluator<L> {
  ledger: Arc<L>,
  expiry: TimeDelta,
}

impl<L> Clone for TrustEvaluator<L> {
  fn clone(&self) -> Self {
    Self { ledger: Arc::clone(&self.ledger), expiry: self.expiry }
  }
}

impl<L: Ledger> TrustEvaluator<L> {
  pub fn new(ledger: Arc<L>, expiry: TimeDelta) -> Self { Self { ledger, expiry } }

  pub fn ledger(&self) -> &L { &self.ledger }

  /// Evaluate against the current wall-clock time.
  pub async fn evaluate(&self, address: &str) -> Verdict {
    self.evaluate_at(address, Utc::now()).await
  }

  pub async fn evaluate_at(&self, address: &str, now: DateTime<Utc>) -> Verdict {
    evaluate(self.ledger.as_ref(), address, now, self.expiry).await
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
