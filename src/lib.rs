//! Beacon - emergency alert backend for the personal-safety service
//!
//! Beacon records user-triggered SOS alerts with device-trust verification,
//! drives the alert resolution workflow for administrators, and aggregates
//! rolling 30-day activity statistics for the admin console.
//!
//! ## Services
//!
//! - **Alerts**: SOS alert creation, queries, and the status state machine
//! - **Devices**: per-user trusted-IP registry (up to three devices)
//! - **Reports**: cross-collection 30-day analytics and activity feed

pub mod alerts;
pub mod config;
pub mod db;
pub mod devices;
pub mod reports;
pub mod routes;
pub mod server;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{BeaconError, Result};
