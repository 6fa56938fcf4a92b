//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (nanosecond
//! precision, `Z` suffix) so that lexical order equals chronological order
//! and `ORDER BY occurred_at` needs no conversion. That holds for years
//! 0000-9999 only; the core rejects event timestamps outside that range. Enums are stored by their
//! display names. UUIDs are stored as hyphenated lowercase strings.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use incident_core::{
  incident::{Incident, IncidentStatus, Severity},
  postmortem::Postmortem,
  timeline::{EventType, TimelineEvent},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

fn decode_variant<T: FromStr>(column: &'static str, s: &str) -> Result<T> {
  T::from_str(s).map_err(|_| Error::UnknownVariant {
    column,
    value: s.to_owned(),
  })
}

pub fn decode_severity(s: &str) -> Result<Severity> { decode_variant("severity", s) }

pub fn decode_status(s: &str) -> Result<IncidentStatus> { decode_variant("status", s) }

pub fn decode_event_type(s: &str) -> Result<EventType> {
  decode_variant("event_type", s)
}

// ─── String lists ────────────────────────────────────────────────────────────

pub fn encode_list(items: &[String]) -> Result<String> {
  Ok(serde_json::to_string(items)?)
}

pub fn decode_list(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

pub const INCIDENT_COLUMNS: &str = "incident_id, title, description, severity, status, \
                                    created_at, updated_at, resolved_at";

/// Raw strings read directly from an `incidents` row.
pub struct RawIncident {
  pub incident_id: String,
  pub title:       String,
  pub description: String,
  pub severity:    String,
  pub status:      String,
  pub created_at:  String,
  pub updated_at:  String,
  pub resolved_at: Option<String>,
}

impl RawIncident {
  /// Map a row selected with [`INCIDENT_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      incident_id: row.get(0)?,
      title:       row.get(1)?,
      description: row.get(2)?,
      severity:    row.get(3)?,
      status:      row.get(4)?,
      created_at:  row.get(5)?,
      updated_at:  row.get(6)?,
      resolved_at: row.get(7)?,
    })
  }

  pub fn into_incident(self) -> Result<Incident> {
    Ok(Incident {
      id:          decode_uuid(&self.incident_id)?,
      title:       self.title,
      description: self.description,
      severity:    decode_severity(&self.severity)?,
      status:      decode_status(&self.status)?,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
      resolved_at: self.resolved_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

pub const EVENT_COLUMNS: &str =
  "event_id, incident_id, event_type, description, occurred_at, author";

/// Raw strings read directly from a `timeline_events` row.
pub struct RawEvent {
  pub event_id:    String,
  pub incident_id: String,
  pub event_type:  String,
  pub description: String,
  pub occurred_at: String,
  pub author:      String,
}

impl RawEvent {
  /// Map a row selected with [`EVENT_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      event_id:    row.get(0)?,
      incident_id: row.get(1)?,
      event_type:  row.get(2)?,
      description: row.get(3)?,
      occurred_at: row.get(4)?,
      author:      row.get(5)?,
    })
  }

  pub fn into_event(self) -> Result<TimelineEvent> {
    Ok(TimelineEvent {
      id:          decode_uuid(&self.event_id)?,
      incident_id: decode_uuid(&self.incident_id)?,
      event_type:  decode_event_type(&self.event_type)?,
      description: self.description,
      timestamp:   decode_dt(&self.occurred_at)?,
      author:      self.author,
    })
  }
}

pub const POSTMORTEM_COLUMNS: &str = "postmortem_id, incident_id, root_cause, \
                                      contributing_factors, impact, action_items, \
                                      created_at, updated_at";

/// Raw strings read directly from a `postmortems` row.
pub struct RawPostmortem {
  pub postmortem_id:        String,
  pub incident_id:          String,
  pub root_cause:           String,
  pub contributing_factors: String,
  pub impact:               String,
  pub action_items:         String,
  pub created_at:           String,
  pub updated_at:           String,
}

impl RawPostmortem {
  /// Map a row selected with [`POSTMORTEM_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      postmortem_id:        row.get(0)?,
      incident_id:          row.get(1)?,
      root_cause:           row.get(2)?,
      contributing_factors: row.get(3)?,
      impact:               row.get(4)?,
      action_items:         row.get(5)?,
      created_at:           row.get(6)?,
      updated_at:           row.get(7)?,
    })
  }

  pub fn into_postmortem(self) -> Result<Postmortem> {
    Ok(Postmortem {
      id:                   decode_uuid(&self.postmortem_id)?,
      incident_id:          decode_uuid(&self.incident_id)?,
      root_cause:           self.root_cause,
      contributing_factors: decode_list(&self.contributing_factors)?,
      impact:               self.impact,
      action_items:         decode_list(&self.action_items)?,
      created_at:           decode_dt(&self.created_at)?,
      updated_at:           decode_dt(&self.updated_at)?,
    })
  }
}
