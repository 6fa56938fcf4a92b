//! Bearer-token authentication.
//!
//! Tokens are never stored: the config lists each one by name and the hex
//! SHA-256 digest of the token string. A request is authenticated when the
//! digest of its bearer token matches a configured entry; the entry's name
//! becomes the request's [`Principal`].

use std::sync::Arc;

use axum::{
  extract::{Request, State},
  http::HeaderMap,
  middleware::Next,
  response::Response,
};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use incident_api::extract::Principal;
use rand_core::{OsRng, RngCore as _};
use serde::Deserialize;
use sha2::{Digest as _, Sha256};

use crate::error::Error;

/// A named API token as written in the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenEntry {
  pub name:   String,
  /// Lowercase hex SHA-256 of the token.
  pub sha256: String,
}

/// The decoded set of accepted tokens. Empty means auth is disabled.
#[derive(Debug, Clone, Default)]
pub struct TokenSet {
  entries: Vec<(String, [u8; 32])>,
}

impl TokenSet {
  pub fn from_entries(entries: &[TokenEntry]) -> Result<Self, Error> {
    let entries = entries
      .iter()
      .map(|e| {
        let mut digest = [0u8; 32];
        hex::decode_to_slice(e.sha256.trim(), &mut digest).map_err(|_| {
          Error::InvalidTokenDigest { name: e.name.clone() }
        })?;
        Ok((e.name.clone(), digest))
      })
      .collect::<Result<_, Error>>()?;
    Ok(Self { entries })
  }

  pub fn is_disabled(&self) -> bool { self.entries.is_empty() }

  /// The principal owning `token`, if any.
  pub fn lookup(&self, token: &str) -> Option<Principal> {
    let digest = Sha256::digest(token.as_bytes());
    self
      .entries
      .iter()
      .find(|(_, d)| d.as_slice() == digest.as_slice())
      .map(|(name, _)| Principal { name: name.clone() })
  }
}

/// Verify the `Authorization: Bearer` header against `tokens`.
pub fn verify_bearer(headers: &HeaderMap, tokens: &TokenSet) -> Result<Principal, Error> {
  let token = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .ok_or(Error::Unauthorized)?;

  tokens.lookup(token).ok_or(Error::Unauthorized)
}

/// Middleware guarding the resource routes. Passes everything through when no
/// tokens are configured.
pub async fn require_bearer(
  State(tokens): State<Arc<TokenSet>>,
  mut req: Request,
  next: Next,
) -> Result<Response, Error> {
  if !tokens.is_disabled() {
    let principal = verify_bearer(req.headers(), &tokens).inspect_err(|_| {
      tracing::debug!(path = %req.uri().path(), "rejected unauthenticated request");
    })?;
    req.extensions_mut().insert(principal);
  }
  Ok(next.run(req).await)
}

/// Hex SHA-256 of `token`, as it appears in the config.
pub fn digest_hex(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

/// A fresh random token and its digest.
pub fn generate_token() -> (String, String) {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  let token = URL_SAFE_NO_PAD.encode(bytes);
  let digest = digest_hex(&token);
  (token, digest)
}
