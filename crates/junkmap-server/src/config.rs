//! Server configuration.
//!
//! [`ServerConfig`] is the raw shape read from the config file and
//! `JUNKMAP_*` environment variables. [`ServerConfig::validate`] turns it
//! into [`Settings`], which is built once at startup and shared by every
//! connection.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use chrono::TimeDelta;
use serde::Deserialize;

use crate::{
  error::{Error, Result},
  reply::{Replies, Reply},
};

pub const DEFAULT_SERVICE: &str = "127.0.0.1:2000";
pub const DEFAULT_DATABASE: &str = "junkmap.db";
pub const DEFAULT_VALID_HOURS: f64 = 336.0;
pub const DEFAULT_ADDR_GOOD: &str = "200 root";
pub const DEFAULT_ADDR_BAD: &str = "500 Unknown User";

// ─── Raw configuration ───────────────────────────────────────────────────────

/// Runtime configuration as read from file and environment.
#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
  /// `host:port` to listen on.
  pub service:           String,
  pub database:          PathBuf,
  /// Hours a non-permanent address stays trusted after it is first seen.
  pub valid_hours:       f64,
  /// Reply for a trusted address.
  pub addr_good:         String,
  /// Reply for an expired address.
  pub addr_bad:          String,
  /// When set, only addresses ending in this suffix are looked up.
  #[serde(default)]
  pub domain:            Option<String>,
  #[serde(default = "default_pool_size")]
  pub pool_size:         usize,
  #[serde(default)]
  pub idle_timeout_secs: Option<u64>,
}

fn default_pool_size() -> usize { junkmap_store_sqlite::DEFAULT_POOL_SIZE }

impl ServerConfig {
  /// Load from `path` (format inferred from the extension; a missing file
  /// leaves the defaults in place) overlaid with `JUNKMAP_*` variables.
  pub fn load(path: &Path) -> Result<Self> {
    Self::from_source(config::File::from(path.to_path_buf()).required(false))
  }

  /// Load from an arbitrary `config` source on top of the defaults.
  pub fn from_source<S>(source: S) -> Result<Self>
  where
    S: config::Source + Send + Sync + 'static,
  {
    let settings = config::Config::builder()
      .set_default("service", DEFAULT_SERVICE)?
      .set_default("database", DEFAULT_DATABASE)?
      .set_default("valid_hours", DEFAULT_VALID_HOURS)?
      .set_default("addr_good", DEFAULT_ADDR_GOOD)?
      .set_default("addr_bad", DEFAULT_ADDR_BAD)?
      .add_source(source)
      .add_source(config::Environment::with_prefix("JUNKMAP"))
      .build()?;

    Ok(settings.try_deserialize()?)
  }

  /// Check every field and produce the immutable [`Settings`].
  pub fn validate(self) -> Result<Settings> {
    let replies = Replies {
      trusted:  Reply::parse(&self.addr_good)?,
      rejected: Reply::parse(&self.addr_bad)?,
    };
    let expiry = junkmap_core::expiry_from_hours(self.valid_hours)?;

    if self.pool_size == 0 {
      return Err(Error::PoolSize);
    }
    let domain = match self.domain {
      Some(d) if d.trim().is_empty() => return Err(Error::EmptyDomain),
      Some(d) => Some(d.trim().to_owned()),
      None => None,
    };

    Ok(Settings {
      service: self.service,
      database: self.database,
      expiry,
      replies,
      domain,
      pool_size: self.pool_size,
      idle_timeout: self.idle_timeout_secs.map(Duration::from_secs),
    })
  }
}

// ─── Validated settings ──────────────────────────────────────────────────────

/// Validated, immutable configuration.
#[derive(Debug, Clone)]
pub struct Settings {
  pub service:      String,
  pub database:     PathBuf,
  pub expiry:       TimeDelta,
  pub replies:      Replies,
  pub domain:       Option<String>,
  pub pool_size:    usize,
  pub idle_timeout: Option<Duration>,
}

impl Settings {
  /// `true` if no domain is configured or `address` ends with it (ASCII
  /// case-insensitive).
  pub fn accepts_domain(&self, address: &str) -> bool {
    let Some(domain) = &self.domain else { return true };
    let (a, d) = (address.as_bytes(), domain.as_bytes());
    a.len() >= d.len() && a[a.len() - d.len()..].eq_ignore_ascii_case(d)
  }
}
