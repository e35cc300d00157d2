//! Startup-time configuration errors.
//!
//! Request-time failures never surface here; the session layer renders them
//! as reply lines.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to load configuration: {0}")]
  Load(#[from] config::ConfigError),

  #[error("invalid reply {0:?}: expected \"200 <text>\", \"400 <text>\" or \"500 <text>\"")]
  InvalidReply(String),

  #[error("invalid valid_hours: {0}")]
  Expiry(#[from] junkmap_core::Error),

  #[error("pool_size must be at least 1")]
  PoolSize,

  #[error("domain must not be empty")]
  EmptyDomain,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
