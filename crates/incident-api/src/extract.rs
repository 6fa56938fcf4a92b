//! Request extractors.
//!
//! [`JsonBody`] and [`Query`] wrap axum's own extractors so that decoding
//! failures come back as [`ApiError`] (400 with a JSON error body) instead of
//! axum's plain-text rejections.

use std::convert::Infallible;

use axum::{
  extract::{FromRequest, FromRequestParts},
  http::request::Parts,
};

use crate::error::ApiError;

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct Query<T>(pub T);

/// The authenticated caller, placed in request extensions by whatever auth
/// layer sits in front of the API router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
  pub name: String,
}

/// The request's [`Principal`], if any. Never rejects.
pub struct Caller(pub Option<Principal>);

impl Caller {
  pub fn name(&self) -> Option<&str> { self.0.as_ref().map(|p| p.name.as_str()) }
}

impl<S: Send + Sync> FromRequestParts<S> for Caller {
  type Rejection = Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    Ok(Caller(parts.extensions.get::<Principal>().cloned()))
  }
}
