//! Incident status lifecycle.
//!
//! Status moves freely between values; the only rule with teeth is
//! resolution stamping. The first time an incident's status becomes terminal
//! (`Resolved` or `Closed`) its `resolved_at` is fixed to the time of that
//! write. Later writes, including ones that reopen the incident, never touch
//! it again. Stores enforce the "never overwrite" half with a
//! `COALESCE(resolved_at, ?)`-style write; this module decides when a stamp
//! is offered at all.

use chrono::{DateTime, Utc};

use crate::incident::{Incident, IncidentPatch, IncidentStatus};

/// Field-level changes handed to
/// [`IncidentStore::update_incident`](crate::store::IncidentStore::update_incident).
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentChanges {
  pub patch:       IncidentPatch,
  pub updated_at:  DateTime<Utc>,
  /// Offered resolution stamp. Stores must only write it when the stored
  /// value is null.
  pub resolved_at: Option<DateTime<Utc>>,
}

/// Resolution time for a freshly created incident.
pub fn initial_resolution(
  status: IncidentStatus,
  now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
  status.is_terminal().then_some(now)
}

/// Build the changes for applying `patch` to `current` at `now`.
///
/// Returns `None` for an empty patch: nothing is written and `updated_at` is
/// left alone.
pub fn plan_update(
  current: &Incident,
  patch: IncidentPatch,
  now: DateTime<Utc>,
) -> Option<IncidentChanges> {
  if patch.is_empty() {
    return None;
  }

  let resolved_at = match patch.status {
    Some(status) if status.is_terminal() && current.resolved_at.is_none() => {
      Some(now)
    }
    _ => None,
  };

  Some(IncidentChanges { patch, updated_at: now, resolved_at })
}

/// Apply `changes` to an in-memory incident with the same semantics stores
/// must implement.
pub fn apply(incident: &mut Incident, changes: IncidentChanges) {
  let IncidentChanges { patch, updated_at, resolved_at } = changes;
  if let Some(title) = patch.title {
    incident.title = title;
  }
  if let Some(description) = patch.description {
    incident.description = description;
  }
  if let Some(severity) = patch.severity {
    incident.severity = severity;
  }
  if let Some(status) = patch.status {
    incident.status = status;
  }
  incident.updated_at = updated_at;
  if incident.resolved_at.is_none() {
    incident.resolved_at = resolved_at;
  }
}
