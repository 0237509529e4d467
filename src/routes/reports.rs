//! HTTP routes for admin reporting
//!
//! - `GET /reports`              - Full 30-day aggregation payload
//! - `GET /reports/stats`        - Quick dashboard stats
//! - `GET /reports/recent-users` - Newest non-admin users
//!
//! All three are admin endpoints: the `x-api-key` header must match the
//! configured admin key. Authorization proper (sessions, roles) lives in
//! the external account subsystem; the key only separates admin callers
//! from user callers.

use bytes::Bytes;
use chrono::Utc;
use http_body_util::Full;
use hyper::{HeaderMap, Response, StatusCode};
use tracing::error;

use crate::config::Args;
use crate::routes::{error_to_response, json_response};
use crate::server::AppState;
use crate::types::BeaconError;

/// Newest users returned by /reports/recent-users
const RECENT_USER_LIMIT: i64 = 5;

/// Check the admin API key. Dev mode leaves admin endpoints open.
fn require_admin(headers: &HeaderMap, args: &Args) -> Result<(), BeaconError> {
    if args.dev_mode {
        return Ok(());
    }

    let expected = match &args.admin_api_key {
        Some(key) => key,
        // validate() requires the key outside dev mode; unset means the
        // operator explicitly runs open
        None => return Ok(()),
    };

    let presented = headers.get("x-api-key").and_then(|v| v.to_str().ok());

    if presented == Some(expected.as_str()) {
        Ok(())
    } else {
        Err(BeaconError::Unauthorized(
            "Admin API key required".into(),
        ))
    }
}

/// GET /reports
pub async fn handle_report(headers: &HeaderMap, state: &AppState) -> Response<Full<Bytes>> {
    if let Err(e) = require_admin(headers, &state.args) {
        return error_to_response(&e);
    }

    match state.reports.report(Utc::now()).await {
        Ok(report) => json_response(StatusCode::OK, &report),
        Err(e) => {
            error!("Admin report failed: {}", e);
            error_to_response(&e)
        }
    }
}

/// GET /reports/stats
pub async fn handle_quick_stats(headers: &HeaderMap, state: &AppState) -> Response<Full<Bytes>> {
    if let Err(e) = require_admin(headers, &state.args) {
        return error_to_response(&e);
    }

    match state.reports.quick_stats(Utc::now()).await {
        Ok(stats) => json_response(StatusCode::OK, &stats),
        Err(e) => {
            error!("Admin stats failed: {}", e);
            error_to_response(&e)
        }
    }
}

/// GET /reports/recent-users
pub async fn handle_recent_users(headers: &HeaderMap, state: &AppState) -> Response<Full<Bytes>> {
    if let Err(e) = require_admin(headers, &state.args) {
        return error_to_response(&e);
    }

    match state.reports.recent_users(RECENT_USER_LIMIT).await {
        Ok(users) => json_response(StatusCode::OK, &users),
        Err(e) => {
            error!("Recent users query failed: {}", e);
            error_to_response(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn args(dev_mode: bool, key: Option<&str>) -> Args {
        Args {
            node_id: Uuid::new_v4(),
            listen: "127.0.0.1:5000".parse().unwrap(),
            mongodb_uri: "mongodb://localhost:27017".into(),
            mongodb_db: "beacon".into(),
            admin_api_key: key.map(|k| k.to_string()),
            dev_mode,
            log_level: "info".into(),
            max_body_bytes: 65536,
        }
    }

    fn headers_with_key(key: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(key) = key {
            headers.insert("x-api-key", key.parse().unwrap());
        }
        headers
    }

    #[test]
    fn test_require_admin_matches_key() {
        let args = args(false, Some("secret"));

        assert!(require_admin(&headers_with_key(Some("secret")), &args).is_ok());
        assert!(require_admin(&headers_with_key(Some("wrong")), &args).is_err());
        assert!(require_admin(&headers_with_key(None), &args).is_err());
    }

    #[test]
    fn test_require_admin_open_in_dev_mode() {
        let args = args(true, Some("secret"));
        assert!(require_admin(&headers_with_key(None), &args).is_ok());
    }
}
