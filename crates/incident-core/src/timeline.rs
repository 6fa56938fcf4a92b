//! Timeline events: timestamped notes that form an incident's history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Author recorded when neither the request nor the caller supplies one.
pub const DEFAULT_AUTHOR: &str = "system";

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
pub enum EventType {
  Detection,
  Investigation,
  Mitigation,
  Resolution,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
  pub id:          Uuid,
  /// The owning incident. Checked on insert only.
  pub incident_id: Uuid,
  pub event_type:  EventType,
  pub description: String,
  /// When the event happened. Defaults to insertion time; may be edited.
  pub timestamp:   DateTime<Utc>,
  pub author:      String,
}

/// Input to [`crate::TimelineLedger::add_event`].
///
/// `incident_id` is kept as the raw string from the request so that the
/// ledger can report a malformed id before touching the store.
#[derive(Debug, Clone)]
pub struct NewTimelineEvent {
  pub incident_id: String,
  pub event_type:  EventType,
  pub description: String,
  pub timestamp:   Option<DateTime<Utc>>,
  pub author:      Option<String>,
}

/// A partial update. The owning incident cannot be changed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TimelineEventPatch {
  pub event_type:  Option<EventType>,
  pub description: Option<String>,
  pub timestamp:   Option<DateTime<Utc>>,
  pub author:      Option<String>,
}

impl TimelineEventPatch {
  pub fn is_empty(&self) -> bool {
    self.event_type.is_none()
      && self.description.is_none()
      && self.timestamp.is_none()
      && self.author.is_none()
  }
}

/// An incident's events in chronological order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeline {
  pub incident_id: Uuid,
  pub count:       usize,
  pub events:      Vec<TimelineEvent>,
}

impl Timeline {
  pub fn new(incident_id: Uuid, events: Vec<TimelineEvent>) -> Self {
    Self { incident_id, count: events.len(), events }
  }
}
