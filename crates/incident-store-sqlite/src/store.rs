//! [`SqliteStore`]: incidents, timeline events and postmortems in SQLite.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use incident_core::{
  incident::{Incident, IncidentFilter},
  lifecycle::IncidentChanges,
  postmortem::{Postmortem, PostmortemChanges, dedup_factors},
  store::IncidentStore,
  timeline::{TimelineEvent, TimelineEventPatch},
};

use crate::{
  Result,
  encode::{
    EVENT_COLUMNS, INCIDENT_COLUMNS, POSTMORTEM_COLUMNS, RawEvent, RawIncident,
    RawPostmortem, encode_dt, encode_list, encode_uuid,
  },
  error::Error,
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An incidentd store backed by a single SQLite file.
///
/// Clones share one connection. All statements run on that connection's
/// dedicated thread, one `call` at a time.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open a fresh in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row helpers (run on the connection thread) ──────────────────────────────

fn select_incident(
  conn: &Connection,
  id: &str,
) -> rusqlite::Result<Option<RawIncident>> {
  conn
    .query_row(
      &format!("SELECT {INCIDENT_COLUMNS} FROM incidents WHERE incident_id = ?1"),
      rusqlite::params![id],
      RawIncident::from_row,
    )
    .optional()
}

fn select_event(conn: &Connection, id: &str) -> rusqlite::Result<Option<RawEvent>> {
  conn
    .query_row(
      &format!("SELECT {EVENT_COLUMNS} FROM timeline_events WHERE event_id = ?1"),
      rusqlite::params![id],
      RawEvent::from_row,
    )
    .optional()
}

fn select_postmortem(
  conn: &Connection,
  incident_id: &str,
) -> rusqlite::Result<Option<RawPostmortem>> {
  conn
    .query_row(
      &format!("SELECT {POSTMORTEM_COLUMNS} FROM postmortems WHERE incident_id = ?1"),
      rusqlite::params![incident_id],
      RawPostmortem::from_row,
    )
    .optional()
}

fn json_err(e: serde_json::Error) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(e))
}

// ─── IncidentStore impl ──────────────────────────────────────────────────────

impl IncidentStore for SqliteStore {
  type Error = Error;

  // ── Incidents ─────────────────────────────────────────────────────────────

  async fn insert_incident(&self, incident: Incident) -> Result<()> {
    let id_str          = encode_uuid(incident.id);
    let severity_str    = incident.severity.as_ref().to_owned();
    let status_str      = incident.status.as_ref().to_owned();
    let created_at_str  = encode_dt(incident.created_at);
    let updated_at_str  = encode_dt(incident.updated_at);
    let resolved_at_str = incident.resolved_at.map(encode_dt);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO incidents (
             incident_id, title, description, severity, status,
             created_at, updated_at, resolved_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str,
            incident.title,
            incident.description,
            severity_str,
            status_str,
            created_at_str,
            updated_at_str,
            resolved_at_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_incident(&self, id: Uuid) -> Result<Option<Incident>> {
    let id_str = encode_uuid(id);

    let raw = self
      .conn
      .call(move |conn| Ok(select_incident(conn, &id_str)?))
      .await?;

    raw.map(RawIncident::into_incident).transpose()
  }

  async fn list_incidents(&self, filter: IncidentFilter) -> Result<Vec<Incident>> {
    let status_str   = filter.status.map(|s| s.as_ref().to_owned());
    let severity_str = filter.severity.map(|s| s.as_ref().to_owned());

    let raws: Vec<RawIncident> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {INCIDENT_COLUMNS} FROM incidents
           WHERE (?1 IS NULL OR status = ?1)
             AND (?2 IS NULL OR severity = ?2)"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![status_str, severity_str],
            RawIncident::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawIncident::into_incident).collect()
  }

  async fn update_incident(
    &self,
    id: Uuid,
    changes: IncidentChanges,
  ) -> Result<Option<Incident>> {
    let id_str          = encode_uuid(id);
    let IncidentChanges { patch, updated_at, resolved_at } = changes;
    let severity_str    = patch.severity.map(|s| s.as_ref().to_owned());
    let status_str      = patch.status.map(|s| s.as_ref().to_owned());
    let updated_at_str  = encode_dt(updated_at);
    let resolved_at_str = resolved_at.map(encode_dt);

    let raw = self
      .conn
      .call(move |conn| {
        // resolved_at keeps its stored value when one exists.
        let changed = conn.execute(
          "UPDATE incidents SET
             title       = COALESCE(?2, title),
             description = COALESCE(?3, description),
             severity    = COALESCE(?4, severity),
             status      = COALESCE(?5, status),
             updated_at  = ?6,
             resolved_at = COALESCE(resolved_at, ?7)
           WHERE incident_id = ?1",
          rusqlite::params![
            id_str,
            patch.title,
            patch.description,
            severity_str,
            status_str,
            updated_at_str,
            resolved_at_str,
          ],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(select_incident(conn, &id_str)?)
      })
      .await?;

    raw.map(RawIncident::into_incident).transpose()
  }

  async fn delete_incident(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM incidents WHERE incident_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  // ── Timeline events ───────────────────────────────────────────────────────

  async fn insert_event(&self, event: TimelineEvent) -> Result<()> {
    let id_str          = encode_uuid(event.id);
    let incident_id_str = encode_uuid(event.incident_id);
    let event_type_str  = event.event_type.as_ref().to_owned();
    let occurred_at_str = encode_dt(event.timestamp);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO timeline_events (
             event_id, incident_id, event_type, description, occurred_at, author
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            id_str,
            incident_id_str,
            event_type_str,
            event.description,
            occurred_at_str,
            event.author,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_event(&self, id: Uuid) -> Result<Option<TimelineEvent>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| Ok(select_event(conn, &id_str)?))
      .await?;
    raw.map(RawEvent::into_event).transpose()
  }

  async fn list_events(&self, incident_id: Uuid) -> Result<Vec<TimelineEvent>> {
    let incident_id_str = encode_uuid(incident_id);

    let raws: Vec<RawEvent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {EVENT_COLUMNS} FROM timeline_events
           WHERE incident_id = ?1
           ORDER BY occurred_at ASC, rowid ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![incident_id_str], RawEvent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }

  async fn update_event(
    &self,
    id: Uuid,
    patch: TimelineEventPatch,
  ) -> Result<Option<TimelineEvent>> {
    let id_str          = encode_uuid(id);
    let event_type_str  = patch.event_type.map(|t| t.as_ref().to_owned());
    let occurred_at_str = patch.timestamp.map(encode_dt);

    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE timeline_events SET
             event_type  = COALESCE(?2, event_type),
             description = COALESCE(?3, description),
             occurred_at = COALESCE(?4, occurred_at),
             author      = COALESCE(?5, author)
           WHERE event_id = ?1",
          rusqlite::params![
            id_str,
            event_type_str,
            patch.description,
            occurred_at_str,
            patch.author,
          ],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(select_event(conn, &id_str)?)
      })
      .await?;

    raw.map(RawEvent::into_event).transpose()
  }

  async fn delete_event(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM timeline_events WHERE event_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  // ── Postmortems ───────────────────────────────────────────────────────────

  async fn get_postmortem(&self, incident_id: Uuid) -> Result<Option<Postmortem>> {
    let incident_id_str = encode_uuid(incident_id);
    let raw = self
      .conn
      .call(move |conn| Ok(select_postmortem(conn, &incident_id_str)?))
      .await?;
    raw.map(RawPostmortem::into_postmortem).transpose()
  }

  async fn insert_postmortem(&self, postmortem: Postmortem) -> Result<bool> {
    let id_str          = encode_uuid(postmortem.id);
    let incident_id_str = encode_uuid(postmortem.incident_id);
    let factors_str     = encode_list(&postmortem.contributing_factors)?;
    let actions_str     = encode_list(&postmortem.action_items)?;
    let created_at_str  = encode_dt(postmortem.created_at);
    let updated_at_str  = encode_dt(postmortem.updated_at);

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO postmortems (
             postmortem_id, incident_id, root_cause, contributing_factors,
             impact, action_items, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
           ON CONFLICT (incident_id) DO NOTHING",
          rusqlite::params![
            id_str,
            incident_id_str,
            postmortem.root_cause,
            factors_str,
            postmortem.impact,
            actions_str,
            created_at_str,
            updated_at_str,
          ],
        )?)
      })
      .await?;
    Ok(inserted > 0)
  }

  async fn update_postmortem(
    &self,
    incident_id: Uuid,
    changes: PostmortemChanges,
    at: DateTime<Utc>,
  ) -> Result<Option<Postmortem>> {
    let incident_id_str = encode_uuid(incident_id);
    let actions_str     = changes.action_items.as_deref().map(encode_list).transpose()?;
    let at_str          = encode_dt(at);

    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE postmortems SET
             root_cause   = COALESCE(?2, root_cause),
             impact       = COALESCE(?3, impact),
             action_items = COALESCE(?4, action_items),
             updated_at   = ?5
           WHERE incident_id = ?1",
          rusqlite::params![
            incident_id_str,
            changes.root_cause,
            changes.impact,
            actions_str,
            at_str,
          ],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(select_postmortem(conn, &incident_id_str)?)
      })
      .await?;

    raw.map(RawPostmortem::into_postmortem).transpose()
  }

  async fn merge_contributing_factors(
    &self,
    incident_id: Uuid,
    factors: Vec<String>,
    at: DateTime<Utc>,
  ) -> Result<Option<Postmortem>> {
    let incident_id_str = encode_uuid(incident_id);
    let at_str          = encode_dt(at);

    let raw = self
      .conn
      .call(move |conn| {
        // Read, union and write under one write lock.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let stored: Option<String> = tx
          .query_row(
            "SELECT contributing_factors FROM postmortems WHERE incident_id = ?1",
            rusqlite::params![incident_id_str],
            |r| r.get(0),
          )
          .optional()?;
        let Some(stored) = stored else {
          return Ok(None);
        };

        let mut merged: Vec<String> = serde_json::from_str(&stored).map_err(json_err)?;
        merged.extend(factors);
        let merged_str = serde_json::to_string(&dedup_factors(merged)).map_err(json_err)?;

        tx.execute(
          "UPDATE postmortems SET contributing_factors = ?2, updated_at = ?3
           WHERE incident_id = ?1",
          rusqlite::params![incident_id_str, merged_str, at_str],
        )?;
        let raw = select_postmortem(&tx, &incident_id_str)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawPostmortem::into_postmortem).transpose()
  }
}
