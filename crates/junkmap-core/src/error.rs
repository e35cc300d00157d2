//! Error types for `junkmap-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("expiry threshold must be a finite, non-negative number of hours: {0}")]
  InvalidExpiry(f64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
