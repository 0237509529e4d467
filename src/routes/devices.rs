//! HTTP routes for the trusted-device registry
//!
//! - `GET  /users/:id/devices` - Registered device IPs
//! - `PUT  /users/:id/devices` - Replace the full set (profile edit)
//! - `POST /users/:id/devices` - Register or confirm one device (login flow)

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use crate::routes::{error_to_response, json_response, parse_json_body};
use crate::server::AppState;
use crate::types::BeaconError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetDevicesRequest {
    #[serde(default)]
    pub ip_addresses: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddDeviceRequest {
    #[serde(default)]
    pub ip_address: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceListResponse {
    pub ip_addresses: Vec<String>,
}

/// GET /users/:id/devices
pub async fn handle_list(state: &AppState, user_id: &str) -> Response<Full<Bytes>> {
    match state.devices.list(user_id).await {
        Ok(ip_addresses) => json_response(StatusCode::OK, &DeviceListResponse { ip_addresses }),
        Err(e) => error_to_response(&e),
    }
}

/// PUT /users/:id/devices
pub async fn handle_set(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    user_id: &str,
) -> Response<Full<Bytes>> {
    let body: SetDevicesRequest = match parse_json_body(req, state.args.max_body_bytes).await {
        Ok(body) => body,
        Err(e) => return error_to_response(&e),
    };

    match state.devices.set_devices(user_id, body.ip_addresses).await {
        Ok(ip_addresses) => json_response(StatusCode::OK, &DeviceListResponse { ip_addresses }),
        Err(e) => {
            error!("Error replacing devices for user {}: {}", user_id, e);
            error_to_response(&e)
        }
    }
}

/// POST /users/:id/devices
pub async fn handle_add(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    user_id: &str,
) -> Response<Full<Bytes>> {
    let body: AddDeviceRequest = match parse_json_body(req, state.args.max_body_bytes).await {
        Ok(body) => body,
        Err(e) => return error_to_response(&e),
    };

    let ip = match body.ip_address.as_deref() {
        Some(ip) if !ip.trim().is_empty() => ip.to_string(),
        _ => {
            return error_to_response(&BeaconError::BadRequest("IP Address is required".into()))
        }
    };

    match state.devices.add_or_confirm_device(user_id, &ip).await {
        Ok(ip_addresses) => json_response(StatusCode::OK, &DeviceListResponse { ip_addresses }),
        Err(e) => {
            error!("Error registering device for user {}: {}", user_id, e);
            error_to_response(&e)
        }
    }
}
