//! SOS alert subsystem
//!
//! Alert creation with device-trust verification, the resolution status
//! state machine, and alert queries for the user and admin surfaces.

pub mod lifecycle;
pub mod verifier;

pub use lifecycle::{AlertService, AlertView, CreateAlert};
pub use verifier::{ip_matched, resolve_submitter, Submitter};
