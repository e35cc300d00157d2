//! Error type for `junkmap-store-sqlite`.

use junkmap_core::LedgerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// `create` hit the primary key: the address is already recorded.
  #[error("address already recorded: {0}")]
  AlreadyExists(String),

  #[error("unsupported ledger schema version {found} (expected {expected})")]
  SchemaVersion { found: i64, expected: i64 },
}

impl LedgerError for Error {
  fn is_conflict(&self) -> bool { matches!(self, Error::AlreadyExists(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
