//! The incidentd server: configuration, bearer auth, CORS and the service
//! endpoints wrapped around [`incident_api::api_router`].

pub mod auth;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Json, Router, http::HeaderValue, middleware, routing::get};
use incident_core::store::IncidentStore;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::{
  cors::{AllowOrigin, Any, CorsLayer},
  trace::TraceLayer,
};

use auth::{TokenEntry, TokenSet};

pub const SERVICE_NAME: &str = "incidentd";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from defaults, `config.toml`
/// and `INCIDENTD_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:         String,
  pub port:         u16,
  pub store_path:   PathBuf,
  /// Browser origins allowed to call the API. Empty disables CORS; `"*"`
  /// allows any origin.
  #[serde(default)]
  pub cors_origins: Vec<String>,
  /// Accepted bearer tokens. Empty disables authentication.
  #[serde(default)]
  pub tokens:       Vec<TokenEntry>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:         "127.0.0.1".to_string(),
      port:         8000,
      store_path:   PathBuf::from("incidents.db"),
      cors_origins: Vec::new(),
      tokens:       Vec::new(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router for `store`.
///
/// `/` and `/health` are always public; the resource routes require a bearer
/// token whenever `config.tokens` is non-empty.
pub fn router<S>(store: Arc<S>, config: &ServerConfig) -> Result<Router, Error>
where
  S: IncidentStore + 'static,
{
  let tokens = Arc::new(TokenSet::from_entries(&config.tokens)?);
  if tokens.is_disabled() {
    tracing::warn!("no API tokens configured; authentication is disabled");
  }

  let api = incident_api::api_router(store)
    .layer(middleware::from_fn_with_state(tokens, auth::require_bearer));

  let mut app = Router::new()
    .route("/", get(service_info))
    .route("/health", get(health))
    .merge(api);

  if let Some(cors) = cors_layer(&config.cors_origins)? {
    app = app.layer(cors);
  }
  Ok(app.layer(TraceLayer::new_for_http()))
}

fn cors_layer(origins: &[String]) -> Result<Option<CorsLayer>, Error> {
  if origins.is_empty() {
    return Ok(None);
  }
  let allow = if origins.iter().any(|o| o == "*") {
    AllowOrigin::any()
  } else {
    let list = origins
      .iter()
      .map(|o| {
        HeaderValue::from_str(o).map_err(|_| Error::InvalidOrigin(o.clone()))
      })
      .collect::<Result<Vec<_>, _>>()?;
    AllowOrigin::list(list)
  };
  Ok(Some(
    CorsLayer::new()
      .allow_origin(allow)
      .allow_methods(Any)
      .allow_headers(Any),
  ))
}

// ─── Service endpoints ───────────────────────────────────────────────────────

async fn service_info() -> Json<Value> {
  Json(json!({
    "service": SERVICE_NAME,
    "version": env!("CARGO_PKG_VERSION"),
    "resources": {
      "incidents":  "/incidents",
      "timeline":   "/timeline",
      "postmortem": "/postmortem",
    },
  }))
}

async fn health() -> Json<Value> {
  Json(json!({ "status": "healthy", "service": SERVICE_NAME }))
}

// ─── Integration tests ────────────────────────────────────────────────────────
