//! The `Ledger` trait — storage of [`AddressRecord`]s keyed by address.
//!
//! Implemented by storage backends (e.g. `junkmap-store-sqlite`). The trust
//! evaluator and the server depend on this abstraction, not on a concrete
//! backend.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::record::AddressRecord;

/// Errors a ledger backend can report.
///
/// Backends must tell a lost insert race apart from every other failure so
/// the evaluator can fall back to reading the winner's row.
pub trait LedgerError: std::error::Error + Send + Sync + 'static {
  /// `true` when `create` failed because the address already has a record.
  fn is_conflict(&self) -> bool;
}

/// Abstraction over a persisted address ledger.
///
/// All methods return `Send` futures so the trait can be used from tasks
/// spawned on a multi-threaded tokio runtime.
pub trait Ledger: Send + Sync {
  type Error: LedgerError;

  /// Exact-match lookup. A missing address is `Ok(None)`.
  fn find<'a>(
    &'a self,
    address: &'a str,
  ) -> impl Future<Output = Result<Option<AddressRecord>, Self::Error>> + Send + 'a;

  /// Insert a new non-permanent record first seen at `first_seen`.
  ///
  /// Fails with an error whose [`LedgerError::is_conflict`] is `true` if the
  /// address is already present.
  fn create<'a>(
    &'a self,
    address: &'a str,
    first_seen: DateTime<Utc>,
  ) -> impl Future<Output = Result<AddressRecord, Self::Error>> + Send + 'a;

  /// Mark an existing record permanent. Returns `false` if the address is
  /// unknown.
  fn promote<'a>(
    &'a self,
    address: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}
