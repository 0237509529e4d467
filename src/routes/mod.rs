//! HTTP routes for Beacon

pub mod alerts;
pub mod devices;
pub mod health;
pub mod reports;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::types::BeaconError;

/// Error body shape shared by every endpoint
#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

/// Serialize a body as a JSON response with permissive CORS headers
pub(crate) fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PUT, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, x-api-key")
        .body(Full::new(Bytes::from(json)))
        .unwrap()
}

/// Map a service error to its HTTP response
pub(crate) fn error_to_response(err: &BeaconError) -> Response<Full<Bytes>> {
    json_response(
        err.status_code(),
        &MessageBody {
            message: err.to_string(),
        },
    )
}

/// CORS preflight
pub(crate) fn preflight_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PUT, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, x-api-key")
        .header("Access-Control-Max-Age", "86400")
        .body(Full::new(Bytes::new()))
        .unwrap()
}

pub(crate) fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::NOT_FOUND,
        &MessageBody {
            message: format!("Not found: {}", path),
        },
    )
}

/// Read and deserialize a JSON request body, bounded by `max_bytes`
pub(crate) async fn parse_json_body<T: for<'de> Deserialize<'de>>(
    req: Request<hyper::body::Incoming>,
    max_bytes: usize,
) -> Result<T, BeaconError> {
    let body = req
        .collect()
        .await
        .map_err(|e| BeaconError::Http(format!("Failed to read body: {}", e)))?;

    let bytes = body.to_bytes();
    if bytes.len() > max_bytes {
        return Err(BeaconError::Http("Request body too large".into()));
    }

    serde_json::from_slice(&bytes)
        .map_err(|e| BeaconError::Http(format!("Invalid JSON: {}", e)))
}
