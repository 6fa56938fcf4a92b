//! Postmortems (the single root-cause report attached to an incident) and
//! the composite final report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{incident::Incident, timeline::TimelineEvent};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Postmortem {
  pub id:                   Uuid,
  /// Unique across all postmortems.
  pub incident_id:          Uuid,
  pub root_cause:           String,
  /// Set semantics: no duplicates, order unspecified.
  pub contributing_factors: Vec<String>,
  pub impact:               String,
  pub action_items:         Vec<String>,
  pub created_at:           DateTime<Utc>,
  pub updated_at:           DateTime<Utc>,
}

impl Postmortem {
  /// An empty postmortem for `incident_id`, stamped `now`.
  pub fn blank(incident_id: Uuid, now: DateTime<Utc>) -> Self {
    Self {
      id: Uuid::new_v4(),
      incident_id,
      root_cause: String::new(),
      contributing_factors: Vec::new(),
      impact: String::new(),
      action_items: Vec::new(),
      created_at: now,
      updated_at: now,
    }
  }
}

/// Field-level changes applied to an existing postmortem. `None` preserves
/// the stored value.
#[derive(Debug, Clone, Default)]
pub struct PostmortemChanges {
  pub root_cause:   Option<String>,
  pub impact:       Option<String>,
  pub action_items: Option<Vec<String>>,
}

/// The result of an upsert: the stored record and whether this call created
/// it.
#[derive(Debug, Clone)]
pub struct Upserted {
  pub postmortem: Postmortem,
  pub created:    bool,
}

/// The composite returned by
/// [`crate::PostmortemCompiler::generate_final_report`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalReport {
  pub incident:   Incident,
  pub timeline:   Vec<TimelineEvent>,
  pub postmortem: Postmortem,
}

/// Remove duplicates from `factors`, keeping the first occurrence of each.
pub fn dedup_factors(factors: Vec<String>) -> Vec<String> {
  let mut seen = std::collections::HashSet::new();
  factors
    .into_iter()
    .filter(|f| seen.insert(f.clone()))
    .collect()
}
