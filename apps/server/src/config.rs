use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use bookdrive_core::allocations::AllocationMode;

pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub allocation_mode: AllocationMode,
    pub log_format: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let listen_addr: SocketAddr = std::env::var("BD_LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8088".to_string())
            .parse()
            .context("Invalid BD_LISTEN_ADDR")?;
        let db_path = std::env::var("BD_DB_PATH").unwrap_or_else(|_| "./db/bookdrive.db".into());
        let cors_allow = std::env::var("BD_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let timeout_ms: u64 = std::env::var("BD_REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|_| "30000".into())
            .parse()
            .unwrap_or(30000);
        let allocation_mode = match std::env::var("BD_ALLOCATION_MODE") {
            Ok(raw) => raw
                .parse::<AllocationMode>()
                .map_err(anyhow::Error::msg)
                .context("Invalid BD_ALLOCATION_MODE")?,
            Err(_) => AllocationMode::default(),
        };
        let log_format = std::env::var("BD_LOG_FORMAT").unwrap_or_else(|_| "text".into());
        Ok(Self {
            listen_addr,
            db_path,
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
            allocation_mode,
            log_format,
        })
    }
}
