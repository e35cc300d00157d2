//! Rendering verdicts to wire reply lines.
//!
//! Replies follow the mail-table convention: `2xx` accept, `4xx` temporary
//! failure (retry later), `5xx` permanent failure.

use std::{fmt, sync::LazyLock};

use junkmap_core::Verdict;
use regex::Regex;

use crate::error::{Error, Result};

pub const DB_LOOKUP_ERROR: &str = "400 DB lookup error";
pub const NOT_IMPLEMENTED: &str = "500 Not implemented";
pub const INVALID_INPUT: &str = "500 Invalid Input";
pub const INVALID_DOMAIN: &str = "500 Invalid domain";

static REPLY_SHAPE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[245]00 \w").expect("static regex"));

/// A configured reply line such as `200 root` or `500 Unknown User`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply(String);

impl Reply {
  /// Validate `line` as `{2,4,5}00 <word>...` on a single line.
  pub fn parse(line: &str) -> Result<Self> {
    if REPLY_SHAPE.is_match(line) && !line.chars().any(char::is_control) {
      Ok(Self(line.to_owned()))
    } else {
      Err(Error::InvalidReply(line.to_owned()))
    }
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Reply {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// The configurable half of the verdict-to-wire mapping.
#[derive(Debug, Clone)]
pub struct Replies {
  pub trusted:  Reply,
  pub rejected: Reply,
}

impl Replies {
  /// Map a verdict to its reply line. Store faults always render as
  /// [`DB_LOOKUP_ERROR`].
  pub fn render(&self, verdict: Verdict) -> &str {
    match verdict {
      Verdict::Trusted => self.trusted.as_str(),
      Verdict::Rejected => self.rejected.as_str(),
      Verdict::StoreFault => DB_LOOKUP_ERROR,
    }
  }
}
