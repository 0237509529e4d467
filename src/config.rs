//! Configuration for Beacon
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use uuid::Uuid;

/// Beacon - emergency alert backend for the personal-safety service
#[derive(Parser, Debug, Clone)]
#[command(name = "beacon")]
#[command(about = "Emergency alert and device-trust backend")]
pub struct Args {
    /// Unique node identifier for this instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:5000")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "beacon")]
    pub mongodb_db: String,

    /// API key for admin endpoints (reports). Required outside dev mode.
    #[arg(long, env = "ADMIN_API_KEY")]
    pub admin_api_key: Option<String>,

    /// Enable development mode (admin endpoints open, relaxed checks)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Maximum accepted request body size in bytes
    #[arg(long, env = "MAX_BODY_BYTES", default_value = "65536")]
    pub max_body_bytes: usize,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode && self.admin_api_key.is_none() {
            return Err("ADMIN_API_KEY is required in production mode".to_string());
        }

        if self.max_body_bytes == 0 {
            return Err("MAX_BODY_BYTES must be greater than zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            node_id: Uuid::new_v4(),
            listen: "127.0.0.1:5000".parse().unwrap(),
            mongodb_uri: "mongodb://localhost:27017".into(),
            mongodb_db: "beacon".into(),
            admin_api_key: None,
            dev_mode: false,
            log_level: "info".into(),
            max_body_bytes: 65536,
        }
    }

    #[test]
    fn test_validate_requires_admin_key_in_production() {
        let args = base_args();
        assert!(args.validate().is_err());

        let mut with_key = base_args();
        with_key.admin_api_key = Some("secret".into());
        assert!(with_key.validate().is_ok());
    }

    #[test]
    fn test_validate_dev_mode_allows_missing_key() {
        let mut args = base_args();
        args.dev_mode = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_body_limit() {
        let mut args = base_args();
        args.dev_mode = true;
        args.max_body_bytes = 0;
        assert!(args.validate().is_err());
    }
}
