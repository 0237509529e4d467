//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Each request runs as
//! an independent unit of work against the shared read-only AppState; no
//! in-process state is shared between requests.

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::alerts::AlertService;
use crate::config::Args;
use crate::db::MongoClient;
use crate::devices::DeviceStore;
use crate::reports::ActivityAggregator;
use crate::routes;
use crate::types::BeaconError;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub mongo: MongoClient,
    /// Alert creation, queries, and the status state machine
    pub alerts: AlertService,
    /// Trusted-device registry persistence
    pub devices: DeviceStore,
    /// 30-day activity aggregation
    pub reports: ActivityAggregator,
    pub started_at: Instant,
}

impl AppState {
    /// Build state and collection handles against a connected MongoDB
    pub async fn new(args: Args, mongo: MongoClient) -> Result<Self, BeaconError> {
        let alerts = AlertService::new(&mongo).await?;
        let devices = DeviceStore::new(&mongo).await?;
        let reports = ActivityAggregator::new(&mongo).await?;

        Ok(Self {
            args,
            mongo,
            alerts,
            devices,
            reports,
            started_at: Instant::now(),
        })
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), BeaconError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Beacon listening on {} as node {}",
        state.args.listen, state.args.node_id
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - admin endpoints are open");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    // Strip any query string for matching
    let path = req
        .uri()
        .path()
        .split('?')
        .next()
        .unwrap_or("")
        .to_string();

    info!("[{}] {} {}", addr, method, path);

    let response = match (method, path.as_str()) {
        // CORS preflight
        (Method::OPTIONS, _) => routes::preflight_response(),

        // Liveness probe
        (Method::GET, "/health") | (Method::GET, "/healthz") => {
            routes::health::health_check(&state).await
        }

        // Build info for deployment verification
        (Method::GET, "/version") => routes::health::version_info(),

        // ====================================================================
        // SOS alerts
        // ====================================================================
        (Method::POST, "/alerts") => {
            routes::alerts::handle_create(req, Arc::clone(&state)).await
        }

        (Method::GET, "/alerts") => routes::alerts::handle_list_all(&state).await,

        (Method::GET, p) if p.starts_with("/alerts/user/") => {
            let user_id = p.strip_prefix("/alerts/user/").unwrap_or("");
            routes::alerts::handle_list_for_user(&state, user_id).await
        }

        (Method::PUT, p) if p.starts_with("/alerts/") && p.ends_with("/status") => {
            let alert_id = p
                .strip_prefix("/alerts/")
                .and_then(|s| s.strip_suffix("/status"))
                .unwrap_or("")
                .to_string();
            routes::alerts::handle_set_status(req, Arc::clone(&state), &alert_id).await
        }

        // ====================================================================
        // Trusted-device registry
        // ====================================================================
        (Method::GET, p) if p.starts_with("/users/") && p.ends_with("/devices") => {
            let user_id = device_path_user(p);
            routes::devices::handle_list(&state, user_id).await
        }

        (Method::PUT, p) if p.starts_with("/users/") && p.ends_with("/devices") => {
            let user_id = device_path_user(p).to_string();
            routes::devices::handle_set(req, Arc::clone(&state), &user_id).await
        }

        (Method::POST, p) if p.starts_with("/users/") && p.ends_with("/devices") => {
            let user_id = device_path_user(p).to_string();
            routes::devices::handle_add(req, Arc::clone(&state), &user_id).await
        }

        // ====================================================================
        // Admin reporting
        // ====================================================================
        (Method::GET, "/reports") => {
            routes::reports::handle_report(req.headers(), &state).await
        }

        (Method::GET, "/reports/stats") => {
            routes::reports::handle_quick_stats(req.headers(), &state).await
        }

        (Method::GET, "/reports/recent-users") => {
            routes::reports::handle_recent_users(req.headers(), &state).await
        }

        (_, p) => routes::not_found_response(p),
    };

    Ok(response)
}

/// Extract `:id` from `/users/:id/devices`
fn device_path_user(path: &str) -> &str {
    path.strip_prefix("/users/")
        .and_then(|s| s.strip_suffix("/devices"))
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_path_user() {
        assert_eq!(device_path_user("/users/abc123/devices"), "abc123");
        assert_eq!(device_path_user("/users//devices"), "");
    }
}
