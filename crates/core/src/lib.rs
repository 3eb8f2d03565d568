//! `evstage-core` — identity primitives shared by the staging crates.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;

pub use error::IdError;
pub use id::EventId;
