//! Core types and the trust decision for the junkmap greylisting service.
//!
//! This crate knows nothing about sockets or SQL. Storage backends implement
//! [`ledger::Ledger`]; the server crate drives [`evaluate::TrustEvaluator`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod evaluate;
pub mod ledger;
pub mod record;

pub use error::{Error, Result};
pub use evaluate::{TrustEvaluator, evaluate, expiry_from_hours};
pub use ledger::{Ledger, LedgerError};
pub use record::{AddressRecord, Verdict, normalize_address};
