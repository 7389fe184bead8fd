//! Lead intake and deal evaluation for real-estate wholesaling.
//!
//! The [`evaluation`] and [`sources`] modules are pure and synchronous; [`leads`]
//! wires them behind repository traits and an axum router.

pub mod config;
pub mod error;
pub mod evaluation;
pub mod leads;
pub mod sources;
pub mod telemetry;
