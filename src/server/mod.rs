//! HTTP server for Beacon

mod http;

pub use http::{run, AppState};
