//! The `IncidentStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `incident-store-sqlite`). It exposes per-collection document primitives
//! only; every cross-collection rule lives in the components built on top of
//! it ([`crate::IncidentRegistry`], [`crate::TimelineLedger`],
//! [`crate::PostmortemCompiler`]).

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  incident::{Incident, IncidentFilter},
  lifecycle::IncidentChanges,
  postmortem::{Postmortem, PostmortemChanges},
  timeline::{TimelineEvent, TimelineEventPatch},
};

/// Abstraction over an incidentd storage backend.
///
/// Updates are field-level: a `None` in a patch or change set must leave the
/// stored column untouched, so that concurrent writers touching different
/// fields do not clobber one another.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait IncidentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Incidents ─────────────────────────────────────────────────────────

  fn insert_incident(
    &self,
    incident: Incident,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Returns `None` if not found.
  fn get_incident(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Incident>, Self::Error>> + Send + '_;

  /// All incidents matching `filter`, in storage-native order.
  fn list_incidents(
    &self,
    filter: IncidentFilter,
  ) -> impl Future<Output = Result<Vec<Incident>, Self::Error>> + Send + '_;

  /// Apply `changes` and return the re-read record, or `None` if no incident
  /// has this id. `changes.resolved_at` is written only when the stored
  /// value is null.
  fn update_incident(
    &self,
    id: Uuid,
    changes: IncidentChanges,
  ) -> impl Future<Output = Result<Option<Incident>, Self::Error>> + Send + '_;

  /// Returns `true` if a record was removed. Does not cascade.
  fn delete_incident(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Timeline events ───────────────────────────────────────────────────

  fn insert_event(
    &self,
    event: TimelineEvent,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_event(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<TimelineEvent>, Self::Error>> + Send + '_;

  /// Events for `incident_id`, ascending by timestamp; equal timestamps keep
  /// insertion order.
  fn list_events(
    &self,
    incident_id: Uuid,
  ) -> impl Future<Output = Result<Vec<TimelineEvent>, Self::Error>> + Send + '_;

  /// Apply `patch` and return the re-read event, or `None` if not found.
  fn update_event(
    &self,
    id: Uuid,
    patch: TimelineEventPatch,
  ) -> impl Future<Output = Result<Option<TimelineEvent>, Self::Error>> + Send + '_;

  /// Returns `true` if a record was removed.
  fn delete_event(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Postmortems ───────────────────────────────────────────────────────

  /// The postmortem for `incident_id`, if any.
  fn get_postmortem(
    &self,
    incident_id: Uuid,
  ) -> impl Future<Output = Result<Option<Postmortem>, Self::Error>> + Send + '_;

  /// Insert `postmortem` unless one already exists for its incident.
  /// Returns `false` (and writes nothing) on conflict.
  fn insert_postmortem(
    &self,
    postmortem: Postmortem,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Overwrite the supplied fields, set `updated_at = at`, and return the
  /// re-read record, or `None` if the incident has no postmortem.
  fn update_postmortem(
    &self,
    incident_id: Uuid,
    changes: PostmortemChanges,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Postmortem>, Self::Error>> + Send + '_;

  /// Set-union `factors` into the stored contributing factors as a single
  /// atomic mutation, set `updated_at = at`, and return the re-read record,
  /// or `None` if the incident has no postmortem.
  fn merge_contributing_factors(
    &self,
    incident_id: Uuid,
    factors: Vec<String>,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Postmortem>, Self::Error>> + Send + '_;
}
