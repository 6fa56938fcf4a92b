//! Handlers for `/timeline` endpoints.
//!
//! `GET` takes an incident id; `PUT` and `DELETE` take an event id.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use incident_core::{
  store::IncidentStore,
  timeline::{EventType, NewTimelineEvent, Timeline, TimelineEvent, TimelineEventPatch},
};
use serde::Deserialize;

use crate::{ApiState, error::ApiError, extract::{Caller, JsonBody}};

#[derive(Debug, Deserialize)]
pub struct AddEventBody {
  pub incident_id: String,
  pub event_type:  EventType,
  pub description: String,
  /// Defaults to the time of the request.
  pub timestamp:   Option<DateTime<Utc>>,
  /// Defaults to the caller's name, else `"system"`.
  pub author:      Option<String>,
}

/// `POST /timeline`: returns 201 + the stored [`TimelineEvent`].
pub async fn add<S>(
  State(api): State<Arc<ApiState<S>>>,
  caller: Caller,
  JsonBody(body): JsonBody<AddEventBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: IncidentStore + 'static,
{
  let author = body.author.or_else(|| caller.name().map(str::to_owned));
  let event = api
    .timeline
    .add_event(NewTimelineEvent {
      incident_id: body.incident_id,
      event_type: body.event_type,
      description: body.description,
      timestamp: body.timestamp,
      author,
    })
    .await?;
  Ok((StatusCode::CREATED, Json(event)))
}

/// `GET /timeline/{incident_id}`
pub async fn list<S>(
  State(api): State<Arc<ApiState<S>>>,
  Path(incident_id): Path<String>,
) -> Result<Json<Timeline>, ApiError>
where
  S: IncidentStore + 'static,
{
  Ok(Json(api.timeline.list_for_incident(&incident_id).await?))
}

/// `PUT /timeline/{event_id}`
pub async fn update<S>(
  State(api): State<Arc<ApiState<S>>>,
  Path(event_id): Path<String>,
  JsonBody(patch): JsonBody<TimelineEventPatch>,
) -> Result<Json<TimelineEvent>, ApiError>
where
  S: IncidentStore + 'static,
{
  Ok(Json(api.timeline.update_event(&event_id, patch).await?))
}

/// `DELETE /timeline/{event_id}`
pub async fn delete<S>(
  State(api): State<Arc<ApiState<S>>>,
  Path(event_id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: IncidentStore + 'static,
{
  api.timeline.delete_event(&event_id).await?;
  Ok(StatusCode::NO_CONTENT)
}
