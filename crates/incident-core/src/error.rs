//! Error types for `incident-core`.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// The three failure classes every operation reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// Malformed identifier or missing required field. Raised before any
  /// storage access.
  InvalidArgument,
  /// A referenced record (or a record it depends on) does not exist.
  NotFound,
  /// The store was unreachable or rejected the operation.
  StorageFailure,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid {what} id format: {raw:?}")]
  InvalidId { what: &'static str, raw: String },

  #[error("missing required field: {0}")]
  MissingField(&'static str),

  #[error("timestamp {0} is outside years 0000-9999")]
  InvalidTimestamp(DateTime<Utc>),

  #[error("incident not found: {0}")]
  IncidentNotFound(Uuid),

  #[error("timeline event not found: {0}")]
  EventNotFound(Uuid),

  #[error("postmortem not found for incident {0}")]
  PostmortemNotFound(Uuid),

  #[error("store error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::InvalidId { .. }
      | Self::MissingField(_)
      | Self::InvalidTimestamp(_) => {
        ErrorKind::InvalidArgument
      }
      Self::IncidentNotFound(_)
      | Self::EventNotFound(_)
      | Self::PostmortemNotFound(_) => ErrorKind::NotFound,
      Self::Storage(_) => ErrorKind::StorageFailure,
    }
  }

  /// Wrap a backend error. Used as `.map_err(Error::storage)` at every store
  /// call site.
  pub fn storage<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Storage(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
