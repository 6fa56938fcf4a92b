//! Core types, consistency rules, and the storage trait for incidentd.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! three components ([`IncidentRegistry`], [`TimelineLedger`],
//! [`PostmortemCompiler`]) are generic over any [`store::IncidentStore`] and
//! own every cross-resource rule: referential checks, the one-postmortem-per-
//! incident constraint, and resolution stamping.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod compiler;
pub mod error;
pub mod id;
pub mod incident;
pub mod ledger;
pub mod lifecycle;
pub mod postmortem;
pub mod registry;
pub mod store;
pub mod timeline;

#[cfg(test)]
mod memory;

pub use compiler::PostmortemCompiler;
pub use error::{Error, ErrorKind, Result};
pub use ledger::TimelineLedger;
pub use registry::IncidentRegistry;
