//! JSON REST API for incidentd.
//!
//! Exposes an axum [`Router`] backed by any [`IncidentStore`]. Auth, TLS and
//! transport concerns are the caller's responsibility; an auth layer may put
//! an [`extract::Principal`] into request extensions to name the caller.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(incident_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod extract;
pub mod incidents;
pub mod postmortem;
pub mod timeline;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use incident_core::{
  IncidentRegistry, PostmortemCompiler, TimelineLedger, store::IncidentStore,
};

pub use error::ApiError;

/// The three components, wired over one shared store.
pub struct ApiState<S> {
  pub incidents:   IncidentRegistry<S>,
  pub timeline:    TimelineLedger<S>,
  pub postmortems: PostmortemCompiler<S>,
}

impl<S: IncidentStore> ApiState<S> {
  pub fn new(store: Arc<S>) -> Self {
    let incidents = IncidentRegistry::new(Arc::clone(&store));
    let timeline = TimelineLedger::new(Arc::clone(&store), incidents.clone());
    let postmortems =
      PostmortemCompiler::new(store, incidents.clone(), timeline.clone());
    Self { incidents, timeline, postmortems }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be merged or nested into any parent router
/// regardless of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: IncidentStore + 'static,
{
  Router::new()
    // Incidents
    .route("/incidents", get(incidents::list::<S>).post(incidents::create::<S>))
    .route(
      "/incidents/{id}",
      get(incidents::get_one::<S>)
        .put(incidents::update::<S>)
        .delete(incidents::delete::<S>),
    )
    // Timeline
    .route("/timeline", post(timeline::add::<S>))
    .route(
      "/timeline/{id}",
      get(timeline::list::<S>)
        .put(timeline::update::<S>)
        .delete(timeline::delete::<S>),
    )
    // Postmortems
    .route("/postmortem/{id}", get(postmortem::get_one::<S>))
    .route("/postmortem/{id}/rca", post(postmortem::set_root_cause::<S>))
    .route("/postmortem/{id}/factors", post(postmortem::add_factors::<S>))
    .route("/postmortem/{id}/generate", post(postmortem::generate::<S>))
    .with_state(Arc::new(ApiState::new(store)))
}
