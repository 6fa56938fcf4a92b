//! Handlers for `/postmortem/{incident_id}` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/postmortem/{id}` | 404 if the incident or its postmortem is missing |
//! | `POST` | `/postmortem/{id}/rca` | Body: `{"root_cause":"..."}`; 201 if created, else 200 |
//! | `POST` | `/postmortem/{id}/factors` | Body: `{"factors":[...]}`; 201 if created, else 200 |
//! | `POST` | `/postmortem/{id}/generate` | Body: `{"impact":"...","action_items":[...]}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use incident_core::{
  postmortem::{FinalReport, Postmortem, Upserted},
  store::IncidentStore,
};
use serde::Deserialize;

use crate::{ApiState, error::ApiError, extract::JsonBody};

fn upserted(u: Upserted) -> impl IntoResponse {
  let status = if u.created { StatusCode::CREATED } else { StatusCode::OK };
  (status, Json(u.postmortem))
}

// ─── Root cause ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RootCauseBody {
  pub root_cause: String,
}

/// `POST /postmortem/{incident_id}/rca`
pub async fn set_root_cause<S>(
  State(api): State<Arc<ApiState<S>>>,
  Path(incident_id): Path<String>,
  JsonBody(body): JsonBody<RootCauseBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: IncidentStore + 'static,
{
  let out = api
    .postmortems
    .set_root_cause(&incident_id, body.root_cause)
    .await?;
  Ok(upserted(out))
}

// ─── Contributing factors ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct FactorsBody {
  pub factors: Vec<String>,
}

/// `POST /postmortem/{incident_id}/factors`
pub async fn add_factors<S>(
  State(api): State<Arc<ApiState<S>>>,
  Path(incident_id): Path<String>,
  JsonBody(body): JsonBody<FactorsBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: IncidentStore + 'static,
{
  let out = api
    .postmortems
    .add_contributing_factors(&incident_id, body.factors)
    .await?;
  Ok(upserted(out))
}

// ─── Get ──────────────────────────────────────────────────────────────────────

/// `GET /postmortem/{incident_id}`
pub async fn get_one<S>(
  State(api): State<Arc<ApiState<S>>>,
  Path(incident_id): Path<String>,
) -> Result<Json<Postmortem>, ApiError>
where
  S: IncidentStore + 'static,
{
  Ok(Json(api.postmortems.get_for_incident(&incident_id).await?))
}

// ─── Final report ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GenerateBody {
  pub impact:       String,
  #[serde(default)]
  pub action_items: Vec<String>,
}

/// `POST /postmortem/{incident_id}/generate`: returns the incident, its full
/// timeline and the postmortem in one document.
pub async fn generate<S>(
  State(api): State<Arc<ApiState<S>>>,
  Path(incident_id): Path<String>,
  JsonBody(body): JsonBody<GenerateBody>,
) -> Result<Json<FinalReport>, ApiError>
where
  S: IncidentStore + 'static,
{
  let report = api
    .postmortems
    .generate_final_report(&incident_id, body.impact, body.action_items)
    .await?;
  Ok(Json(report))
}
