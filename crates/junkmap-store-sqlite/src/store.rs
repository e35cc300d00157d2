//! [`SqliteLedger`] — the SQLite implementation of [`Ledger`].

use std::{
  path::Path,
  sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  },
  time::Duration,
};

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;

use junkmap_core::{AddressRecord, Ledger};

use crate::{
  Error, Result,
  encode::{RawRecord, encode_dt},
  schema::{CONNECTION_PRAGMAS, SCHEMA, SCHEMA_VERSION},
};

/// Handles opened by [`SqliteLedger::open`].
pub const DEFAULT_POOL_SIZE: usize = 4;

/// How long a handle waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Store ───────────────────────────────────────────────────────────────────

/// An address ledger backed by a single SQLite file.
///
/// Holds a fixed pool of connections, each running on its own thread. Every
/// operation borrows one handle for a single `call` and hands it back when
/// the call returns. Cloning is cheap; clones share the pool.
#[derive(Clone)]
pub struct SqliteLedger {
  pool: Arc<[tokio_rusqlite::Connection]>,
  next: Arc<AtomicUsize>,
}

impl SqliteLedger {
  /// Open (or create) a ledger at `path` with [`DEFAULT_POOL_SIZE`] handles.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::open_pooled(path, DEFAULT_POOL_SIZE).await
  }

  /// Open (or create) a ledger at `path` with `size` handles (at least one).
  ///
  /// The first handle bootstraps the schema; an incompatible on-disk version
  /// fails with [`Error::SchemaVersion`].
  pub async fn open_pooled(path: impl AsRef<Path>, size: usize) -> Result<Self> {
    let path = path.as_ref();

    let first = tokio_rusqlite::Connection::open(path).await?;
    configure(&first).await?;
    bootstrap(&first).await?;

    let mut pool = vec![first];
    for _ in 1..size.max(1) {
      let conn = tokio_rusqlite::Connection::open(path).await?;
      configure(&conn).await?;
      pool.push(conn);
    }

    tracing::debug!(path = %path.display(), handles = pool.len(), "opened ledger");
    Ok(Self::from_pool(pool))
  }

  /// Open an in-memory ledger — useful for testing.
  ///
  /// In-memory databases are private to their connection, so the pool holds
  /// exactly one handle.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    configure(&conn).await?;
    bootstrap(&conn).await?;
    Ok(Self::from_pool(vec![conn]))
  }

  fn from_pool(pool: Vec<tokio_rusqlite::Connection>) -> Self {
    Self { pool: Arc::from(pool), next: Arc::new(AtomicUsize::new(0)) }
  }

  /// Number of pooled handles.
  pub fn handles(&self) -> usize { self.pool.len() }

  /// Pick the next handle, round-robin.
  fn handle(&self) -> &tokio_rusqlite::Connection {
    let i = self.next.fetch_add(1, Ordering::Relaxed) % self.pool.len();
    &self.pool[i]
  }

  /// Number of recorded addresses.
  pub async fn count(&self) -> Result<u64> {
    let n: i64 = self
      .handle()
      .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM addresses", [], |r| r.get(0))?))
      .await?;
    Ok(n as u64)
  }

  /// Read the schema-version marker.
  pub async fn schema_version(&self) -> Result<i64> {
    Ok(
      self
        .handle()
        .call(|conn| Ok(conn.query_row("PRAGMA user_version", [], |r| r.get(0))?))
        .await?,
    )
  }
}

async fn configure(conn: &tokio_rusqlite::Connection) -> Result<()> {
  conn
    .call(|conn| {
      conn.busy_timeout(BUSY_TIMEOUT)?;
      conn.execute_batch(CONNECTION_PRAGMAS)?;
      Ok(())
    })
    .await?;
  Ok(())
}

/// Create the schema on a fresh database, or check the existing version.
async fn bootstrap(conn: &tokio_rusqlite::Connection) -> Result<()> {
  let found: i64 = conn
    .call(|conn| {
      let version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
      if version == 0 {
        conn.execute_batch(SCHEMA)?;
      }
      Ok(version)
    })
    .await?;

  match found {
    0 => {
      tracing::info!(version = SCHEMA_VERSION, "initialised new ledger schema");
      Ok(())
    }
    SCHEMA_VERSION => Ok(()),
    other => Err(Error::SchemaVersion { found: other, expected: SCHEMA_VERSION }),
  }
}

// ─── Ledger impl ─────────────────────────────────────────────────────────────

impl Ledger for SqliteLedger {
  type Error = Error;

  async fn find(&self, address: &str) -> Result<Option<AddressRecord>> {
    let key = address.to_owned();

    let raw: Option<RawRecord> = self
      .handle()
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT address, first_seen, permanent FROM addresses WHERE address = ?1",
              rusqlite::params![key],
              RawRecord::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRecord::into_record).transpose()
  }

  async fn create(&self, address: &str, first_seen: DateTime<Utc>) -> Result<AddressRecord> {
    let record = AddressRecord::new(address, first_seen);
    let key    = record.address.clone();
    let at_str = encode_dt(first_seen);

    let inserted: bool = self
      .handle()
      .call(move |conn| {
        match conn.execute(
          "INSERT INTO addresses (address, first_seen, permanent) VALUES (?1, ?2, 0)",
          rusqlite::params![key, at_str],
        ) {
          Ok(_) => Ok(true),
          Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
          {
            Ok(false)
          }
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !inserted {
      return Err(Error::AlreadyExists(record.address));
    }
    Ok(record)
  }

  async fn promote(&self, address: &str) -> Result<bool> {
    let key = address.to_owned();

    let changed: usize = self
      .handle()
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE addresses SET permanent = 1 WHERE address = ?1",
          rusqlite::params![key],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }
}
