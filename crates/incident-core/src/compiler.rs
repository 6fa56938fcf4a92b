//! [`PostmortemCompiler`] owns the one-per-incident postmortem and builds
//! the final report.
//!
//! Every write is an upsert keyed on the incident id. The compiler looks for
//! an existing record first; if there is none it inserts a fresh one, and if
//! that insert loses a race against a concurrent writer (the store refuses a
//! second postmortem for the same incident) it falls back to updating the
//! winner's record. Two postmortems for one incident can therefore never
//! exist.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Error, IncidentRegistry, Result, TimelineLedger, id,
  postmortem::{FinalReport, Postmortem, PostmortemChanges, Upserted, dedup_factors},
  store::IncidentStore,
};

pub struct PostmortemCompiler<S> {
  store:     Arc<S>,
  incidents: IncidentRegistry<S>,
  timeline:  TimelineLedger<S>,
}

impl<S> Clone for PostmortemCompiler<S> {
  fn clone(&self) -> Self {
    Self {
      store:     Arc::clone(&self.store),
      incidents: self.incidents.clone(),
      timeline:  self.timeline.clone(),
    }
  }
}

/// How to write a postmortem: either seed a new record or mutate the
/// existing one.
enum Write {
  Fields(PostmortemChanges),
  MergeFactors(Vec<String>),
}

impl Write {
  fn seed(&self, incident_id: Uuid, now: DateTime<Utc>) -> Postmortem {
    let mut pm = Postmortem::blank(incident_id, now);
    match self {
      Write::Fields(changes) => {
        if let Some(root_cause) = &changes.root_cause {
          pm.root_cause = root_cause.clone();
        }
        if let Some(impact) = &changes.impact {
          pm.impact = impact.clone();
        }
        if let Some(items) = &changes.action_items {
          pm.action_items = items.clone();
        }
      }
      Write::MergeFactors(factors) => pm.contributing_factors = factors.clone(),
    }
    pm
  }
}

impl<S: IncidentStore> PostmortemCompiler<S> {
  pub fn new(
    store: Arc<S>,
    incidents: IncidentRegistry<S>,
    timeline: TimelineLedger<S>,
  ) -> Self {
    Self { store, incidents, timeline }
  }

  /// Create or update the root-cause narrative.
  pub async fn set_root_cause(
    &self,
    raw_incident_id: &str,
    root_cause: String,
  ) -> Result<Upserted> {
    let incident_id = id::parse("incident", raw_incident_id)?;
    self.incidents.require(incident_id).await?;

    self
      .upsert(
        incident_id,
        Write::Fields(PostmortemChanges {
          root_cause: Some(root_cause),
          ..Default::default()
        }),
      )
      .await
  }

  /// Union `factors` into the contributing-factor set.
  pub async fn add_contributing_factors(
    &self,
    raw_incident_id: &str,
    factors: Vec<String>,
  ) -> Result<Upserted> {
    let incident_id = id::parse("incident", raw_incident_id)?;
    self.incidents.require(incident_id).await?;

    self
      .upsert(incident_id, Write::MergeFactors(dedup_factors(factors)))
      .await
  }

  /// Fails with [`Error::IncidentNotFound`] or [`Error::PostmortemNotFound`].
  pub async fn get_for_incident(&self, raw_incident_id: &str) -> Result<Postmortem> {
    let incident_id = id::parse("incident", raw_incident_id)?;
    self.incidents.require(incident_id).await?;
    self.fetch(incident_id).await
  }

  /// Overwrite impact and action items, then return the incident, its full
  /// timeline and the postmortem together.
  pub async fn generate_final_report(
    &self,
    raw_incident_id: &str,
    impact: String,
    action_items: Vec<String>,
  ) -> Result<FinalReport> {
    let incident_id = id::parse("incident", raw_incident_id)?;
    let incident = self.incidents.require(incident_id).await?;
    let timeline = self.timeline.events_for(incident_id).await?;

    self
      .upsert(
        incident_id,
        Write::Fields(PostmortemChanges {
          impact: Some(impact),
          action_items: Some(action_items),
          ..Default::default()
        }),
      )
      .await?;
    let postmortem = self.fetch(incident_id).await?;

    tracing::info!(
      incident_id = %incident_id,
      events = timeline.len(),
      "final postmortem report generated"
    );
    Ok(FinalReport { incident, timeline, postmortem })
  }

  async fn fetch(&self, incident_id: Uuid) -> Result<Postmortem> {
    self
      .store
      .get_postmortem(incident_id)
      .await
      .map_err(Error::storage)?
      .ok_or(Error::PostmortemNotFound(incident_id))
  }

  async fn upsert(&self, incident_id: Uuid, write: Write) -> Result<Upserted> {
    let now = Utc::now();

    let existing = self
      .store
      .get_postmortem(incident_id)
      .await
      .map_err(Error::storage)?;

    if existing.is_none() {
      let seeded = write.seed(incident_id, now);
      let inserted = self
        .store
        .insert_postmortem(seeded.clone())
        .await
        .map_err(Error::storage)?;
      if inserted {
        tracing::info!(
          incident_id = %incident_id,
          postmortem_id = %seeded.id,
          "postmortem created"
        );
        return Ok(Upserted { postmortem: seeded, created: true });
      }
      tracing::debug!(
        incident_id = %incident_id,
        "postmortem created concurrently; updating instead"
      );
    }

    let updated = match write {
      Write::Fields(changes) => self.store.update_postmortem(incident_id, changes, now).await,
      Write::MergeFactors(factors) => {
        self
          .store
          .merge_contributing_factors(incident_id, factors, now)
          .await
      }
    }
    .map_err(Error::storage)?
    .ok_or(Error::PostmortemNotFound(incident_id))?;

    Ok(Upserted { postmortem: updated, created: false })
  }
}
