//! In-memory [`IncidentStore`] used by this crate's unit tests.

use std::sync::{
  Mutex, MutexGuard,
  atomic::{AtomicBool, Ordering},
};

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::{
  incident::{Incident, IncidentFilter},
  lifecycle::{self, IncidentChanges},
  postmortem::{Postmortem, PostmortemChanges},
  store::IncidentStore,
  timeline::{TimelineEvent, TimelineEventPatch},
};

#[derive(Debug, Error)]
#[error("injected storage failure")]
pub struct Injected;

#[derive(Default)]
struct Tables {
  incidents:   Vec<Incident>,
  /// Insertion order is the tie-breaker for equal timestamps.
  events:      Vec<TimelineEvent>,
  postmortems: Vec<Postmortem>,
}

#[derive(Default)]
pub struct MemoryStore {
  tables:           Mutex<Tables>,
  fail_next:        AtomicBool,
  hide_postmortems: AtomicBool,
}

impl MemoryStore {
  /// Make the next store call fail.
  pub fn fail_next(&self) { self.fail_next.store(true, Ordering::SeqCst); }

  /// Make the next `get_postmortem` report a miss, simulating a concurrent
  /// writer that inserts after our lookup.
  pub fn hide_postmortems_once(&self) {
    self.hide_postmortems.store(true, Ordering::SeqCst);
  }

  pub fn postmortem_count(&self) -> usize {
    self.tables.lock().unwrap().postmortems.len()
  }

  fn tables(&self) -> Result<MutexGuard<'_, Tables>, Injected> {
    if self.fail_next.swap(false, Ordering::SeqCst) {
      return Err(Injected);
    }
    Ok(self.tables.lock().unwrap())
  }
}

impl IncidentStore for MemoryStore {
  type Error = Injected;

  async fn insert_incident(&self, incident: Incident) -> Result<(), Injected> {
    self.tables()?.incidents.push(incident);
    Ok(())
  }

  async fn get_incident(&self, id: Uuid) -> Result<Option<Incident>, Injected> {
    Ok(self.tables()?.incidents.iter().find(|i| i.id == id).cloned())
  }

  async fn list_incidents(
    &self,
    filter: IncidentFilter,
  ) -> Result<Vec<Incident>, Injected> {
    Ok(
      self
        .tables()?
        .incidents
        .iter()
        .filter(|i| filter.matches(i))
        .cloned()
        .collect(),
    )
  }

  async fn update_incident(
    &self,
    id: Uuid,
    changes: IncidentChanges,
  ) -> Result<Option<Incident>, Injected> {
    let mut t = self.tables()?;
    Ok(t.incidents.iter_mut().find(|i| i.id == id).map(|i| {
      lifecycle::apply(i, changes);
      i.clone()
    }))
  }

  async fn delete_incident(&self, id: Uuid) -> Result<bool, Injected> {
    let mut t = self.tables()?;
    let before = t.incidents.len();
    t.incidents.retain(|i| i.id != id);
    Ok(t.incidents.len() != before)
  }

  async fn insert_event(&self, event: TimelineEvent) -> Result<(), Injected> {
    self.tables()?.events.push(event);
    Ok(())
  }

  async fn get_event(&self, id: Uuid) -> Result<Option<TimelineEvent>, Injected> {
    Ok(self.tables()?.events.iter().find(|e| e.id == id).cloned())
  }

  async fn list_events(
    &self,
    incident_id: Uuid,
  ) -> Result<Vec<TimelineEvent>, Injected> {
    let mut events: Vec<_> = self
      .tables()?
      .events
      .iter()
      .filter(|e| e.incident_id == incident_id)
      .cloned()
      .collect();
    // Stable sort keeps insertion order among equal timestamps.
    events.sort_by_key(|e| e.timestamp);
    Ok(events)
  }

  async fn update_event(
    &self,
    id: Uuid,
    patch: TimelineEventPatch,
  ) -> Result<Option<TimelineEvent>, Injected> {
    let mut t = self.tables()?;
    Ok(t.events.iter_mut().find(|e| e.id == id).map(|e| {
      if let Some(v) = patch.event_type {
        e.event_type = v;
      }
      if let Some(v) = patch.description {
        e.description = v;
      }
      if let Some(v) = patch.timestamp {
        e.timestamp = v;
      }
      if let Some(v) = patch.author {
        e.author = v;
      }
      e.clone()
    }))
  }

  async fn delete_event(&self, id: Uuid) -> Result<bool, Injected> {
    let mut t = self.tables()?;
    let before = t.events.len();
    t.events.retain(|e| e.id != id);
    Ok(t.events.len() != before)
  }

  async fn get_postmortem(
    &self,
    incident_id: Uuid,
  ) -> Result<Option<Postmortem>, Injected> {
    let t = self.tables()?;
    if self.hide_postmortems.swap(false, Ordering::SeqCst) {
      return Ok(None);
    }
    Ok(t.postmortems.iter().find(|p| p.incident_id == incident_id).cloned())
  }

  async fn insert_postmortem(&self, postmortem: Postmortem) -> Result<bool, Injected> {
    let mut t = self.tables()?;
    if t.postmortems.iter().any(|p| p.incident_id == postmortem.incident_id) {
      return Ok(false);
    }
    t.postmortems.push(postmortem);
    Ok(true)
  }

  async fn update_postmortem(
    &self,
    incident_id: Uuid,
    changes: PostmortemChanges,
    at: DateTime<Utc>,
  ) -> Result<Option<Postmortem>, Injected> {
    let mut t = self.tables()?;
    Ok(t.postmortems.iter_mut().find(|p| p.incident_id == incident_id).map(|p| {
      if let Some(v) = changes.root_cause {
        p.root_cause = v;
      }
      if let Some(v) = changes.impact {
        p.impact = v;
      }
      if let Some(v) = changes.action_items {
        p.action_items = v;
      }
      p.updated_at = at;
      p.clone()
    }))
  }

  async fn merge_contributing_factors(
    &self,
    incident_id: Uuid,
    factors: Vec<String>,
    at: DateTime<Utc>,
  ) -> Result<Option<Postmortem>, Injected> {
    let mut t = self.tables()?;
    Ok(t.postmortems.iter_mut().find(|p| p.incident_id == incident_id).map(|p| {
      for f in factors {
        if !p.contributing_factors.contains(&f) {
          p.contributing_factors.push(f);
        }
      }
      p.updated_at = at;
      p.clone()
    }))
  }
}
