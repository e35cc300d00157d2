//! SQLite backend for the junkmap address ledger.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on dedicated threads
//! without blocking the async runtime.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use schema::SCHEMA_VERSION;
pub use store::{DEFAULT_POOL_SIZE, SqliteLedger};

#[cfg(test)]
mod tests;
