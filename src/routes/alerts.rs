//! HTTP routes for SOS alerts
//!
//! - `POST /alerts`              - Create a new SOS alert
//! - `GET  /alerts`              - All alerts for the admin console
//! - `GET  /alerts/user/:userId` - One user's alerts
//! - `PUT  /alerts/:id/status`   - Transition an alert's status

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use crate::alerts::{AlertView, CreateAlert};
use crate::routes::{error_to_response, json_response, parse_json_body};
use crate::server::AppState;

/// Response body for alert creation
#[derive(Debug, Serialize)]
pub struct CreateAlertResponse {
    pub success: bool,
    pub alert: AlertView,
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: Option<String>,
}

/// POST /alerts
///
/// Availability first: identity problems degrade to an anonymous alert
/// inside the service, so the only client errors here are a missing IP or
/// an unreadable body.
pub async fn handle_create(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<Full<Bytes>> {
    let input: CreateAlert = match parse_json_body(req, state.args.max_body_bytes).await {
        Ok(body) => body,
        Err(e) => return error_to_response(&e),
    };

    match state.alerts.create(input).await {
        Ok(alert) => json_response(
            StatusCode::CREATED,
            &CreateAlertResponse {
                success: true,
                alert,
                message: "SOS Alert Sent Successfully",
            },
        ),
        Err(e) => {
            error!("Error creating alert: {}", e);
            error_to_response(&e)
        }
    }
}

/// GET /alerts
pub async fn handle_list_all(state: &AppState) -> Response<Full<Bytes>> {
    match state.alerts.list_all().await {
        Ok(alerts) => json_response(StatusCode::OK, &alerts),
        Err(e) => {
            error!("Error fetching alerts: {}", e);
            error_to_response(&e)
        }
    }
}

/// GET /alerts/user/:userId
pub async fn handle_list_for_user(state: &AppState, user_id: &str) -> Response<Full<Bytes>> {
    match state.alerts.list_for_user(user_id).await {
        Ok(alerts) => json_response(StatusCode::OK, &alerts),
        Err(e) => {
            error!("Error fetching user alerts: {}", e);
            error_to_response(&e)
        }
    }
}

/// PUT /alerts/:id/status
pub async fn handle_set_status(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    alert_id: &str,
) -> Response<Full<Bytes>> {
    let body: UpdateStatusRequest = match parse_json_body(req, state.args.max_body_bytes).await {
        Ok(body) => body,
        Err(e) => return error_to_response(&e),
    };

    let status = body.status.unwrap_or_default();

    match state.alerts.set_status(alert_id, &status).await {
        Ok(alert) => json_response(StatusCode::OK, &alert),
        Err(e) => {
            error!("Error updating alert {} status: {}", alert_id, e);
            error_to_response(&e)
        }
    }
}
