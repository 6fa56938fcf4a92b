//! [`IncidentRegistry`]: incident records and their status lifecycle.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
  Error, Result, id,
  incident::{Incident, IncidentFilter, IncidentListing, IncidentPatch, NewIncident},
  lifecycle,
  store::IncidentStore,
};

/// Incident CRUD plus resolution stamping. Leaf component: it depends on the
/// store only.
pub struct IncidentRegistry<S> {
  store: Arc<S>,
}

impl<S> Clone for IncidentRegistry<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: IncidentStore> IncidentRegistry<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  pub async fn create(&self, input: NewIncident) -> Result<Incident> {
    id::require_text("title", &input.title)?;

    let now = Utc::now();
    let incident = Incident {
      id:          Uuid::new_v4(),
      title:       input.title,
      description: input.description,
      severity:    input.severity,
      status:      input.status,
      created_at:  now,
      updated_at:  now,
      resolved_at: lifecycle::initial_resolution(input.status, now),
    };

    self
      .store
      .insert_incident(incident.clone())
      .await
      .map_err(Error::storage)?;

    tracing::info!(
      incident_id = %incident.id,
      severity = %incident.severity,
      status = %incident.status,
      "incident opened"
    );
    Ok(incident)
  }

  pub async fn list(&self, filter: IncidentFilter) -> Result<IncidentListing> {
    let incidents = self
      .store
      .list_incidents(filter)
      .await
      .map_err(Error::storage)?;
    Ok(IncidentListing::from(incidents))
  }

  pub async fn get(&self, raw_id: &str) -> Result<Incident> {
    let id = id::parse("incident", raw_id)?;
    self.require(id).await
  }

  /// Apply `patch`. An empty patch returns the stored record untouched.
  pub async fn update(
    &self,
    raw_id: &str,
    patch: IncidentPatch,
  ) -> Result<Incident> {
    let id = id::parse("incident", raw_id)?;
    id::require_patch_text("title", patch.title.as_deref())?;
    let current = self.require(id).await?;

    let Some(changes) = lifecycle::plan_update(&current, patch, Utc::now())
    else {
      return Ok(current);
    };
    let stamped = changes.resolved_at;

    tracing::debug!(incident_id = %id, ?changes, "updating incident");
    let updated = self
      .store
      .update_incident(id, changes)
      .await
      .map_err(Error::storage)?
      .ok_or(Error::IncidentNotFound(id))?;

    if stamped.is_some() && updated.resolved_at == stamped {
      tracing::info!(incident_id = %id, status = %updated.status, "incident resolved");
    }
    Ok(updated)
  }

  /// Remove the incident. Timeline events and the postmortem are left in
  /// place.
  pub async fn delete(&self, raw_id: &str) -> Result<()> {
    let id = id::parse("incident", raw_id)?;
    let deleted = self
      .store
      .delete_incident(id)
      .await
      .map_err(Error::storage)?;
    if !deleted {
      return Err(Error::IncidentNotFound(id));
    }
    tracing::info!(incident_id = %id, "incident deleted");
    Ok(())
  }

  /// Look up an incident by an already-parsed id, failing with
  /// [`Error::IncidentNotFound`] on a miss. The referential check used by the
  /// other components.
  pub(crate) async fn require(&self, id: Uuid) -> Result<Incident> {
    self
      .store
      .get_incident(id)
      .await
      .map_err(Error::storage)?
      .ok_or(Error::IncidentNotFound(id))
  }
}
