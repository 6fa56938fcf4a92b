//! Identifier parsing and input checks.
//!
//! Every record is keyed by a UUID. Path and body identifiers arrive as raw
//! strings and are parsed here, before any store access, so that a malformed
//! id is always reported as an invalid argument rather than a miss.

use chrono::{DateTime, Datelike as _, Utc};
use uuid::Uuid;

use crate::{Error, Result};

/// Parse `raw` as a record id. `what` names the record kind in the error
/// message (e.g. `"incident"`).
pub fn parse(what: &'static str, raw: &str) -> Result<Uuid> {
  Uuid::parse_str(raw.trim()).map_err(|_| Error::InvalidId {
    what,
    raw: raw.to_owned(),
  })
}

/// Reject empty or whitespace-only required text fields.
pub(crate) fn require_text(field: &'static str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(Error::MissingField(field));
  }
  Ok(())
}

/// Reject timestamps outside the four-digit years `0000..=9999`, the range
/// RFC 3339 can express.
pub(crate) fn require_four_digit_year(at: DateTime<Utc>) -> Result<()> {
  if !(0..=9999).contains(&at.year()) {
    return Err(Error::InvalidTimestamp(at));
  }
  Ok(())
}

/// [`require_text`] for an optional patch field; `None` passes.
pub(crate) fn require_patch_text(
  field: &'static str,
  value: Option<&str>,
) -> Result<()> {
  value.map_or(Ok(()), |v| require_text(field, v))
}
