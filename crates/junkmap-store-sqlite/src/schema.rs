//! SQL schema for the junkmap ledger.
//!
//! Applied only to a fresh database (`PRAGMA user_version = 0`). Any other
//! version than [`SCHEMA_VERSION`] is refused at open time.

/// On-disk format understood by this build.
pub const SCHEMA_VERSION: i64 = 1;

/// Full schema DDL. Must leave `user_version` equal to [`SCHEMA_VERSION`].
pub const SCHEMA: &str = "
-- One row per address ever looked up. Rows are never deleted.
CREATE TABLE IF NOT EXISTS addresses (
    address     TEXT PRIMARY KEY,
    first_seen  TEXT NOT NULL
                DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),  -- RFC 3339 UTC
    permanent   INTEGER NOT NULL DEFAULT 0
);

PRAGMA user_version = 1;
";

/// Per-handle settings, applied to every pooled connection.
pub const CONNECTION_PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
";
