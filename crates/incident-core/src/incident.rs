//! Incident records, the leaf entity every other record points at.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de::IntoDeserializer as _};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

// ─── Enumerations ────────────────────────────────────────────────────────────

/// How bad an incident is. Declaration order is severity order: `Critical`
/// compares less than `Low`.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
pub enum Severity {
  Critical,
  High,
  #[default]
  Medium,
  Low,
}

/// Where an incident is in its response lifecycle.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
pub enum IncidentStatus {
  #[default]
  Open,
  #[serde(rename = "In Progress")]
  #[strum(serialize = "In Progress")]
  InProgress,
  Mitigated,
  Resolved,
  Closed,
}

impl IncidentStatus {
  /// `Resolved` and `Closed` are terminal: entering either one fixes the
  /// incident's resolution time.
  pub fn is_terminal(self) -> bool {
    matches!(self, Self::Resolved | Self::Closed)
  }
}

// ─── Incident ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
  pub id:          Uuid,
  pub title:       String,
  pub description: String,
  pub severity:    Severity,
  pub status:      IncidentStatus,
  pub created_at:  DateTime<Utc>,
  /// Refreshed on every non-empty update.
  pub updated_at:  DateTime<Utc>,
  /// Set once, the first time `status` becomes terminal. Never cleared.
  pub resolved_at: Option<DateTime<Utc>>,
}

/// Input to [`crate::IncidentRegistry::create`]. Timestamps and the id are
/// assigned by the registry.
#[derive(Debug, Clone)]
pub struct NewIncident {
  pub title:       String,
  pub description: String,
  pub severity:    Severity,
  pub status:      IncidentStatus,
}

impl NewIncident {
  /// An `Open`, `Medium` incident.
  pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
    Self {
      title:       title.into(),
      description: description.into(),
      severity:    Severity::default(),
      status:      IncidentStatus::default(),
    }
  }
}

/// A partial update. `Some` overwrites, `None` (absent or `null` in JSON)
/// preserves the stored value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct IncidentPatch {
  pub title:       Option<String>,
  pub description: Option<String>,
  pub severity:    Option<Severity>,
  pub status:      Option<IncidentStatus>,
}

impl IncidentPatch {
  pub fn is_empty(&self) -> bool {
    self.title.is_none()
      && self.description.is_none()
      && self.severity.is_none()
      && self.status.is_none()
  }
}

// ─── Listing ─────────────────────────────────────────────────────────────────

/// Exact-match filters for [`crate::IncidentRegistry::list`]. An absent or
/// empty filter (`?status=`) places no constraint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct IncidentFilter {
  #[serde(default, deserialize_with = "empty_as_none")]
  pub status:   Option<IncidentStatus>,
  #[serde(default, deserialize_with = "empty_as_none")]
  pub severity: Option<Severity>,
}

impl IncidentFilter {
  pub fn matches(&self, incident: &Incident) -> bool {
    self.status.is_none_or(|s| s == incident.status)
      && self.severity.is_none_or(|s| s == incident.severity)
  }
}

fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  let raw = Option::<String>::deserialize(deserializer)?;
  match raw.as_deref().map(str::trim) {
    None | Some("") => Ok(None),
    Some(s) => T::deserialize(s.into_deserializer()).map(Some),
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentListing {
  pub count:     usize,
  pub incidents: Vec<Incident>,
}

impl From<Vec<Incident>> for IncidentListing {
  fn from(incidents: Vec<Incident>) -> Self {
    Self { count: incidents.len(), incidents }
  }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use super::*;

  #[test]
  fn status_wire_names() {
    assert_eq!(
      serde_json::to_string(&IncidentStatus::InProgress).unwrap(),
      "\"In Progress\""
    );
    assert_eq!(IncidentStatus::InProgress.as_ref(), "In Progress");
    assert_eq!(
      IncidentStatus::from_str("In Progress").unwrap(),
      IncidentStatus::InProgress
    );
  }

  #[test]
  fn only_resolved_and_closed_are_terminal() {
    assert!(IncidentStatus::Resolved.is_terminal());
    assert!(IncidentStatus::Closed.is_terminal());
    assert!(!IncidentStatus::Mitigated.is_terminal());
    assert!(!IncidentStatus::InProgress.is_terminal());
    assert!(!IncidentStatus::Open.is_terminal());
  }

  #[test]
  fn critical_is_most_severe() {
    assert!(Severity::Critical < Severity::High);
    assert!(Severity::Medium < Severity::Low);
  }

  #[test]
  fn null_patch_fields_are_absent() {
    let patch: IncidentPatch =
      serde_json::from_str(r#"{"title":null,"status":"Resolved"}"#).unwrap();
    assert_eq!(patch.title, None);
    assert_eq!(patch.status, Some(IncidentStatus::Resolved));
    assert!(!patch.is_empty());
    assert!(serde_json::from_str::<IncidentPatch>("{}").unwrap().is_empty());
  }

  #[test]
  fn empty_filter_values_place_no_constraint() {
    let filter: IncidentFilter =
      serde_json::from_str(r#"{"status":"","severity":"High"}"#).unwrap();
    assert_eq!(filter.status, None);
    assert_eq!(filter.severity, Some(Severity::High));

    let filter: IncidentFilter =
      serde_json::from_str(r#"{"status":"In Progress"}"#).unwrap();
    assert_eq!(filter.status, Some(IncidentStatus::InProgress));
    assert_eq!(filter.severity, None);

    assert!(serde_json::from_str::<IncidentFilter>(r#"{"status":"Pending"}"#).is_err());
  }
}
