//! Conversion between [`AddressRecord`] and its SQLite column values.
//!
//! Timestamps are stored as RFC 3339 strings, `permanent` as 0/1.

use chrono::{DateTime, Utc};
use junkmap_core::AddressRecord;

use crate::{Error, Result};

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

/// Raw values read directly from an `addresses` row.
pub struct RawRecord {
  pub address:    String,
  pub first_seen: String,
  pub permanent:  bool,
}

impl RawRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      address:    row.get(0)?,
      first_seen: row.get(1)?,
      permanent:  row.get(2)?,
    })
  }

  pub fn into_record(self) -> Result<AddressRecord> {
    Ok(AddressRecord {
      first_seen: decode_dt(&self.first_seen)?,
      address:    self.address,
      permanent:  self.permanent,
    })
  }
}
