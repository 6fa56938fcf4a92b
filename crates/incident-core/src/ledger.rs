//! [`TimelineLedger`]: per-incident event records.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
  Error, IncidentRegistry, Result, id,
  store::IncidentStore,
  timeline::{
    DEFAULT_AUTHOR, NewTimelineEvent, Timeline, TimelineEvent, TimelineEventPatch,
  },
};

/// Timeline events, gated on incident existence for inserts and reads.
pub struct TimelineLedger<S> {
  store:     Arc<S>,
  incidents: IncidentRegistry<S>,
}

impl<S> Clone for TimelineLedger<S> {
  fn clone(&self) -> Self {
    Self {
      store:     Arc::clone(&self.store),
      incidents: self.incidents.clone(),
    }
  }
}

impl<S: IncidentStore> TimelineLedger<S> {
  pub fn new(store: Arc<S>, incidents: IncidentRegistry<S>) -> Self {
    Self { store, incidents }
  }

  /// Record an event against an existing incident.
  ///
  /// The incident check and the insert are separate store calls; an incident
  /// deleted in between leaves an orphaned event.
  pub async fn add_event(&self, input: NewTimelineEvent) -> Result<TimelineEvent> {
    let incident_id = id::parse("incident", &input.incident_id)?;
    id::require_text("description", &input.description)?;
    if let Some(at) = input.timestamp {
      id::require_four_digit_year(at)?;
    }
    self.incidents.require(incident_id).await?;

    let event = TimelineEvent {
      id: Uuid::new_v4(),
      incident_id,
      event_type: input.event_type,
      description: input.description,
      timestamp: input.timestamp.unwrap_or_else(Utc::now),
      author: input
        .author
        .filter(|a| !a.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_AUTHOR.to_owned()),
    };

    self
      .store
      .insert_event(event.clone())
      .await
      .map_err(Error::storage)?;

    tracing::info!(
      incident_id = %incident_id,
      event_id = %event.id,
      event_type = %event.event_type,
      "timeline event added"
    );
    Ok(event)
  }

  /// The incident's events, oldest first.
  pub async fn list_for_incident(&self, raw_incident_id: &str) -> Result<Timeline> {
    let incident_id = id::parse("incident", raw_incident_id)?;
    self.incidents.require(incident_id).await?;
    let events = self.events_for(incident_id).await?;
    Ok(Timeline::new(incident_id, events))
  }

  /// Apply `patch` to an event. The owning incident is not re-checked.
  pub async fn update_event(
    &self,
    raw_event_id: &str,
    patch: TimelineEventPatch,
  ) -> Result<TimelineEvent> {
    let event_id = id::parse("event", raw_event_id)?;
    id::require_patch_text("description", patch.description.as_deref())?;
    id::require_patch_text("author", patch.author.as_deref())?;
    if let Some(at) = patch.timestamp {
      id::require_four_digit_year(at)?;
    }

    if patch.is_empty() {
      return self
        .store
        .get_event(event_id)
        .await
        .map_err(Error::storage)?
        .ok_or(Error::EventNotFound(event_id));
    }

    tracing::debug!(event_id = %event_id, ?patch, "updating timeline event");
    self
      .store
      .update_event(event_id, patch)
      .await
      .map_err(Error::storage)?
      .ok_or(Error::EventNotFound(event_id))
  }

  pub async fn delete_event(&self, raw_event_id: &str) -> Result<()> {
    let event_id = id::parse("event", raw_event_id)?;
    let deleted = self
      .store
      .delete_event(event_id)
      .await
      .map_err(Error::storage)?;
    if !deleted {
      return Err(Error::EventNotFound(event_id));
    }
    tracing::info!(event_id = %event_id, "timeline event deleted");
    Ok(())
  }

  /// Ordered events for an incident already known to exist.
  pub(crate) async fn events_for(&self, incident_id: Uuid) -> Result<Vec<TimelineEvent>> {
    self
      .store
      .list_events(incident_id)
      .await
      .map_err(Error::storage)
  }
}

#[cfg(test)]
mod tests {
  use chrono::{DateTime, Duration};

  use super::*;
  use crate::{ErrorKind, incident::NewIncident, memory::MemoryStore, timeline::EventType};

  struct Fixture {
    incidents: IncidentRegistry<MemoryStore>,
    ledger:    TimelineLedger<MemoryStore>,
  }

  fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::default());
    let incidents = IncidentRegistry::new(store.clone());
    let ledger = TimelineLedger::new(store, incidents.clone());
    Fixture { incidents, ledger }
  }

  fn event(
    incident_id: impl ToString,
    at: Option<DateTime<Utc>>,
    description: &str,
  ) -> NewTimelineEvent {
    NewTimelineEvent {
      incident_id: incident_id.to_string(),
      event_type:  EventType::Investigation,
      description: description.into(),
      timestamp:   at,
      author:      None,
    }
  }

  #[tokio::test]
  async fn add_event_defaults_timestamp_and_author() {
    let f = fixture();
    let inc = f.incidents.create(NewIncident::new("t", "d")).await.unwrap();
    let before = Utc::now();
    let ev = f.ledger.add_event(event(inc.id, None, "paged")).await.unwrap();
    assert_eq!(ev.incident_id, inc.id);
    assert_eq!(ev.author, DEFAULT_AUTHOR);
    assert!(ev.timestamp >= before);
  }

  #[tokio::test]
  async fn add_event_to_missing_incident_is_not_found() {
    let f = fixture();
    for et in [EventType::Detection, EventType::Resolution] {
      let mut input = event(Uuid::new_v4(), Some(Utc::now()), "anything");
      input.event_type = et;
      input.author = Some("oncall".into());
      let err = f.ledger.add_event(input).await.unwrap_err();
      assert!(matches!(err, Error::IncidentNotFound(_)));
    }
  }

  #[tokio::test]
  async fn add_event_with_malformed_incident_id_is_invalid() {
    let f = fixture();
    let err = f.ledger.add_event(event("nope", None, "x")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
  }

  #[tokio::test]
  async fn timeline_is_chronological() {
    let f = fixture();
    let inc = f.incidents.create(NewIncident::new("t", "d")).await.unwrap();
    let t1 = Utc::now() - Duration::minutes(30);
    let t2 = t1 + Duration::minutes(10);
    let t3 = t2 + Duration::minutes(10);

    for (at, d) in [(t3, "third"), (t1, "first"), (t2, "second")] {
      f.ledger.add_event(event(inc.id, Some(at), d)).await.unwrap();
    }

    let tl = f.ledger.list_for_incident(&inc.id.to_string()).await.unwrap();
    assert_eq!(tl.count, 3);
    let order: Vec<_> = tl.events.iter().map(|e| e.description.as_str()).collect();
    assert_eq!(order, ["first", "second", "third"]);
  }

  #[tokio::test]
  async fn equal_timestamps_keep_insertion_order() {
    let f = fixture();
    let inc = f.incidents.create(NewIncident::new("t", "d")).await.unwrap();
    let at = Utc::now();
    for d in ["a", "b", "c"] {
      f.ledger.add_event(event(inc.id, Some(at), d)).await.unwrap();
    }
    let tl = f.ledger.list_for_incident(&inc.id.to_string()).await.unwrap();
    let order: Vec<_> = tl.events.iter().map(|e| e.description.as_str()).collect();
    assert_eq!(order, ["a", "b", "c"]);
  }

  #[tokio::test]
  async fn list_for_missing_incident_is_not_found() {
    let f = fixture();
    let err = f
      .ledger
      .list_for_incident(&Uuid::new_v4().to_string())
      .await
      .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
  }

  #[tokio::test]
  async fn update_event_moves_it_in_the_timeline() {
    let f = fixture();
    let inc = f.incidents.create(NewIncident::new("t", "d")).await.unwrap();
    let now = Utc::now();
    let early = f.ledger.add_event(event(inc.id, Some(now), "early")).await.unwrap();
    f.ledger
      .add_event(event(inc.id, Some(now + Duration::seconds(5)), "late"))
      .await
      .unwrap();

    let moved = f
      .ledger
      .update_event(&early.id.to_string(), TimelineEventPatch {
        timestamp: Some(now + Duration::seconds(10)),
        ..Default::default()
      })
      .await
      .unwrap();
    assert_eq!(moved.description, "early");
    assert_eq!(moved.event_type, EventType::Investigation);

    let tl = f.ledger.list_for_incident(&inc.id.to_string()).await.unwrap();
    assert_eq!(tl.events.last().unwrap().id, early.id);
  }

  #[tokio::test]
  async fn update_event_skips_incident_check() {
    let f = fixture();
    let inc = f.incidents.create(NewIncident::new("t", "d")).await.unwrap();
    let ev = f.ledger.add_event(event(inc.id, None, "x")).await.unwrap();
    f.incidents.delete(&inc.id.to_string()).await.unwrap();

    let updated = f
      .ledger
      .update_event(&ev.id.to_string(), TimelineEventPatch {
        description: Some("orphaned".into()),
        ..Default::default()
      })
      .await
      .unwrap();
    assert_eq!(updated.description, "orphaned");
  }

  #[tokio::test]
  async fn empty_event_patch_returns_event() {
    let f = fixture();
    let inc = f.incidents.create(NewIncident::new("t", "d")).await.unwrap();
    let ev = f.ledger.add_event(event(inc.id, None, "x")).await.unwrap();
    let same = f
      .ledger
      .update_event(&ev.id.to_string(), TimelineEventPatch::default())
      .await
      .unwrap();
    assert_eq!(same, ev);
  }

  #[tokio::test]
  async fn update_or_delete_missing_event_is_not_found() {
    let f = fixture();
    let id = Uuid::new_v4().to_string();
    let err = f
      .ledger
      .update_event(&id, TimelineEventPatch {
        description: Some("x".into()),
        ..Default::default()
      })
      .await
      .unwrap_err();
    assert!(matches!(err, Error::EventNotFound(_)));
    assert!(matches!(f.ledger.delete_event(&id).await, Err(Error::EventNotFound(_))));
  }

  #[tokio::test]
  async fn delete_event_removes_it() {
    let f = fixture();
    let inc = f.incidents.create(NewIncident::new("t", "d")).await.unwrap();
    let ev = f.ledger.add_event(event(inc.id, None, "x")).await.unwrap();
    f.ledger.delete_event(&ev.id.to_string()).await.unwrap();
    let tl = f.ledger.list_for_incident(&inc.id.to_string()).await.unwrap();
    assert_eq!(tl.count, 0);
  }

  #[tokio::test]
  async fn deleting_incident_keeps_events() {
    let f = fixture();
    let inc = f.incidents.create(NewIncident::new("t", "d")).await.unwrap();
    f.ledger.add_event(event(inc.id, None, "x")).await.unwrap();
    f.incidents.delete(&inc.id.to_string()).await.unwrap();
    assert_eq!(f.ledger.events_for(inc.id).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn out_of_range_years_are_rejected_and_timeline_still_lists() {
    let f = fixture();
    let inc = f.incidents.create(NewIncident::new("t", "d")).await.unwrap();
    let kept = f
      .ledger
      .add_event(event(inc.id, Some(Utc::now()), "real"))
      .await
      .unwrap();

    let far = DateTime::parse_from_rfc3339("9999-12-31T23:59:59Z")
      .unwrap()
      .with_timezone(&Utc)
      + Duration::seconds(1);
    let err = f
      .ledger
      .add_event(event(inc.id, Some(far), "year 10000"))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::InvalidTimestamp(_)));
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let before_zero = DateTime::parse_from_rfc3339("0000-01-01T00:00:00Z")
      .unwrap()
      .with_timezone(&Utc)
      - Duration::seconds(1);
    let err = f
      .ledger
      .update_event(&kept.id.to_string(), TimelineEventPatch {
        timestamp: Some(before_zero),
        ..Default::default()
      })
      .await
      .unwrap_err();
    assert!(matches!(err, Error::InvalidTimestamp(_)));

    let tl = f.ledger.list_for_incident(&inc.id.to_string()).await.unwrap();
    assert_eq!(tl.events, vec![kept]);
  }

  #[tokio::test]
  async fn blank_patch_text_is_rejected() {
    let f = fixture();
    let inc = f.incidents.create(NewIncident::new("t", "d")).await.unwrap();
    let ev = f.ledger.add_event(event(inc.id, None, "x")).await.unwrap();
    let id = ev.id.to_string();

    for patch in [
      TimelineEventPatch { description: Some("  ".into()), ..Default::default() },
      TimelineEventPatch { author: Some(String::new()), ..Default::default() },
    ] {
      let err = f.ledger.update_event(&id, patch).await.unwrap_err();
      assert!(matches!(err, Error::MissingField(_)));
    }

    let tl = f.ledger.list_for_incident(&inc.id.to_string()).await.unwrap();
    assert_eq!(tl.events, vec![ev]);
  }
}
