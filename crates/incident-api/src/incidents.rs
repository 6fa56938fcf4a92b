//! Handlers for `/incidents` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/incidents` | Optional `?status=` and `?severity=`; returns `{count, incidents}` |
//! | `POST`   | `/incidents` | Body: [`CreateBody`]; returns 201 |
//! | `GET`    | `/incidents/{id}` | 400 on a malformed id, 404 if absent |
//! | `PUT`    | `/incidents/{id}` | Body: any subset of `title`, `description`, `severity`, `status` |
//! | `DELETE` | `/incidents/{id}` | 204; does not cascade |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use incident_core::{
  incident::{
    Incident, IncidentFilter, IncidentListing, IncidentPatch, IncidentStatus,
    NewIncident, Severity,
  },
  store::IncidentStore,
};
use serde::Deserialize;

use crate::{
  ApiState,
  error::ApiError,
  extract::{JsonBody, Query},
};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /incidents[?status=<status>][&severity=<severity>]`
pub async fn list<S>(
  State(api): State<Arc<ApiState<S>>>,
  Query(filter): Query<IncidentFilter>,
) -> Result<Json<IncidentListing>, ApiError>
where
  S: IncidentStore + 'static,
{
  Ok(Json(api.incidents.list(filter).await?))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub title:       String,
  pub description: String,
  #[serde(default)]
  pub severity:    Severity,
  #[serde(default)]
  pub status:      IncidentStatus,
}

impl From<CreateBody> for NewIncident {
  fn from(b: CreateBody) -> Self {
    NewIncident {
      title:       b.title,
      description: b.description,
      severity:    b.severity,
      status:      b.status,
    }
  }
}

/// `POST /incidents`: returns 201 + the stored [`Incident`].
pub async fn create<S>(
  State(api): State<Arc<ApiState<S>>>,
  JsonBody(body): JsonBody<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: IncidentStore + 'static,
{
  let incident = api.incidents.create(NewIncident::from(body)).await?;
  Ok((StatusCode::CREATED, Json(incident)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /incidents/{id}`
pub async fn get_one<S>(
  State(api): State<Arc<ApiState<S>>>,
  Path(id): Path<String>,
) -> Result<Json<Incident>, ApiError>
where
  S: IncidentStore + 'static,
{
  Ok(Json(api.incidents.get(&id).await?))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /incidents/{id}`
pub async fn update<S>(
  State(api): State<Arc<ApiState<S>>>,
  Path(id): Path<String>,
  JsonBody(patch): JsonBody<IncidentPatch>,
) -> Result<Json<Incident>, ApiError>
where
  S: IncidentStore + 'static,
{
  Ok(Json(api.incidents.update(&id, patch).await?))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /incidents/{id}`
pub async fn delete<S>(
  State(api): State<Arc<ApiState<S>>>,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: IncidentStore + 'static,
{
  api.incidents.delete(&id).await?;
  Ok(StatusCode::NO_CONTENT)
}
