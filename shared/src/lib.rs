//! Shared types and models for the Crop Advisory Platform
//!
//! This crate contains the request-scoped value objects that flow through the
//! advisory pipeline, plus the pure rules (soil taxonomy mapping, weather
//! reduction, advisory text) that need no I/O.

pub mod advisory;
pub mod models;
pub mod types;
pub mod validation;

pub use advisory::*;
pub use models::*;
pub use types::*;
pub use validation::*;
