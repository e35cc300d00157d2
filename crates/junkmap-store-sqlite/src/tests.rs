//! Integration tests for `SqliteLedger`.

use std::path::PathBuf;

use chrono::{TimeDelta, Utc};
use junkmap_core::{Ledger, LedgerError as _, Verdict, evaluate};

use crate::{Error, SCHEMA_VERSION, SqliteLedger};

async fn ledger() -> SqliteLedger {
  SqliteLedger::open_in_memory()
    .await
    .expect("in-memory ledger")
}

/// A database path under the system temp dir, cleared of leftovers.
struct TempDb(PathBuf);

impl TempDb {
  fn new(name: &str) -> Self {
    let path = std::env::temp_dir()
      .join(format!("junkmap-{name}-{}.db", std::process::id()));
    let db = Self(path);
    db.clear();
    db
  }

  fn clear(&self) {
    for suffix in ["", "-wal", "-shm"] {
      let mut p = self.0.clone().into_os_string();
      p.push(suffix);
      let _ = std::fs::remove_file(p);
    }
  }
}

impl Drop for TempDb {
  fn drop(&mut self) { self.clear(); }
}

// ─── find / create ───────────────────────────────────────────────────────────

#[tokio::test]
async fn find_missing_returns_none() {
  let l = ledger().await;
  assert!(l.find("nobody@example.org").await.unwrap().is_none());
}

#[tokio::test]
async fn create_then_find_roundtrips() {
  let l = ledger().await;
  let now = Utc::now();

  let created = l.create("foo@example.org", now).await.unwrap();
  assert_eq!(created.address, "foo@example.org");
  assert_eq!(created.first_seen, now);
  assert!(!created.permanent);

  let found = l.find("foo@example.org").await.unwrap().unwrap();
  assert_eq!(found, created);
}

#[tokio::test]
async fn find_is_exact_match() {
  let l = ledger().await;
  l.create("foo@example.org", Utc::now()).await.unwrap();

  assert!(l.find("FOO@example.org").await.unwrap().is_none());
  assert!(l.find("foo@example.or").await.unwrap().is_none());
}

#[tokio::test]
async fn create_duplicate_is_conflict() {
  let l = ledger().await;
  let first = Utc::now() - TimeDelta::hours(3);
  l.create("dup@example.org", first).await.unwrap();

  let err = l.create("dup@example.org", Utc::now()).await.unwrap_err();
  assert!(matches!(err, Error::AlreadyExists(ref a) if a == "dup@example.org"));
  assert!(err.is_conflict());

  // The first insert's first_seen is untouched.
  let found = l.find("dup@example.org").await.unwrap().unwrap();
  assert_eq!(found.first_seen, first);
  assert_eq!(l.count().await.unwrap(), 1);
}

// ─── promote ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn promote_sets_permanent() {
  let l = ledger().await;
  l.create("vip@example.org", Utc::now()).await.unwrap();

  assert!(l.promote("vip@example.org").await.unwrap());
  assert!(l.find("vip@example.org").await.unwrap().unwrap().permanent);
}

#[tokio::test]
async fn promote_unknown_returns_false() {
  let l = ledger().await;
  assert!(!l.promote("ghost@example.org").await.unwrap());
  assert_eq!(l.count().await.unwrap(), 0);
}

// ─── Evaluation against SQLite ───────────────────────────────────────────────

#[tokio::test]
async fn evaluate_autovivifies_once() {
  let l = ledger().await;
  let now = Utc::now();
  let expiry = TimeDelta::hours(336);

  assert_eq!(evaluate(&l, "foo@example.org", now, expiry).await, Verdict::Trusted);
  assert_eq!(evaluate(&l, "foo@example.org", now, expiry).await, Verdict::Trusted);

  assert_eq!(l.count().await.unwrap(), 1);
  let rec = l.find("foo@example.org").await.unwrap().unwrap();
  assert_eq!(rec.first_seen, now);
}

#[tokio::test]
async fn evaluate_rejects_stale_and_trusts_promoted() {
  let l = ledger().await;
  let now = Utc::now();
  let expiry = TimeDelta::hours(336);
  l.create("old@example.org", now - TimeDelta::hours(400)).await.unwrap();

  assert_eq!(evaluate(&l, "old@example.org", now, expiry).await, Verdict::Rejected);

  l.promote("old@example.org").await.unwrap();
  assert_eq!(evaluate(&l, "old@example.org", now, expiry).await, Verdict::Trusted);
}

// ─── Schema bootstrap ────────────────────────────────────────────────────────

#[tokio::test]
async fn fresh_database_gets_current_version() {
  let l = ledger().await;
  assert_eq!(l.schema_version().await.unwrap(), SCHEMA_VERSION);
}

#[tokio::test]
async fn reopening_file_keeps_records() {
  let db = TempDb::new("reopen");
  let now = Utc::now();

  {
    let l = SqliteLedger::open(&db.0).await.unwrap();
    l.create("keep@example.org", now).await.unwrap();
  }

  let l = SqliteLedger::open(&db.0).await.unwrap();
  assert_eq!(l.find("keep@example.org").await.unwrap().unwrap().first_seen, now);
}

#[tokio::test]
async fn unknown_schema_version_is_refused() {
  let db = TempDb::new("version");
  {
    let conn = rusqlite::Connection::open(&db.0).unwrap();
    conn.execute_batch("PRAGMA user_version = 7;").unwrap();
  }

  let err = SqliteLedger::open(&db.0).await.err().expect("open must fail");
  assert!(matches!(
    err,
    Error::SchemaVersion { found: 7, expected } if expected == SCHEMA_VERSION
  ));
}

// ─── Pool ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn in_memory_uses_single_handle() {
  assert_eq!(ledger().await.handles(), 1);
}

#[tokio::test]
async fn pooled_handles_share_one_file() {
  let db = TempDb::new("pool");
  let l = SqliteLedger::open_pooled(&db.0, 3).await.unwrap();
  assert_eq!(l.handles(), 3);

  // Round-robin sends these to different handles.
  l.create("a@example.org", Utc::now()).await.unwrap();
  assert!(l.find("a@example.org").await.unwrap().is_some());
  assert!(l.find("a@example.org").await.unwrap().is_some());
  assert!(l.find("a@example.org").await.unwrap().is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_lookups_create_one_row() {
  let db = TempDb::new("race");
  let l = SqliteLedger::open_pooled(&db.0, 4).await.unwrap();
  let now = Utc::now();

  let tasks: Vec<_> = (0..16)
    .map(|_| {
      let l = l.clone();
      tokio::spawn(async move {
        evaluate(&l, "race@example.org", now, TimeDelta::hours(1)).await
      })
    })
    .collect();

  for t in tasks {
    assert_eq!(t.await.unwrap(), Verdict::Trusted);
  }
  assert_eq!(l.count().await.unwrap(), 1);
}
