// src/config.rs

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use dotenvy::dotenv;
use url::Url;

/// Number of comparison rows shown per printed/on-screen result page.
pub const DEFAULT_PAGE_SIZE: usize = 45;

/// Upper bound accepted for a caller-supplied page size.
pub const MAX_PAGE_SIZE: usize = 500;

pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

/// Scanned sheets are photos; axum's 2 MiB default is too small for them.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// Endpoint that validates the QR code printed on the sheet.
    pub qr_service_url: Url,
    /// Endpoint that returns bubble detections for a scanned sheet.
    pub omr_service_url: Url,
    /// Main platform endpoint that stores finished evaluations.
    /// Persistence is skipped when unset.
    pub results_api_url: Option<Url>,
    pub page_size: usize,
    pub upstream_timeout_secs: u64,
    pub max_upload_bytes: usize,
    pub allowed_origins: Vec<String>,
    pub rust_log: String,
    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let bind_addr = parse_or("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)));

        let qr_service_url = required_url("QR_SERVICE_URL");
        let omr_service_url = required_url("OMR_SERVICE_URL");

        let results_api_url = env::var("RESULTS_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|v| Url::parse(&v).expect("RESULTS_API_URL must be a valid URL"));

        let page_size = parse_or("OMR_PAGE_SIZE", DEFAULT_PAGE_SIZE);
        assert!(
            (1..=MAX_PAGE_SIZE).contains(&page_size),
            "OMR_PAGE_SIZE must be between 1 and {}",
            MAX_PAGE_SIZE
        );

        let upstream_timeout_secs = parse_or("UPSTREAM_TIMEOUT_SECS", DEFAULT_UPSTREAM_TIMEOUT_SECS);
        let max_upload_bytes = parse_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES);

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string())
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let log_dir = env::var("LOG_DIR")
            .unwrap_or_else(|_| "logs".to_string());

        Self {
            bind_addr,
            qr_service_url,
            omr_service_url,
            results_api_url,
            page_size,
            upstream_timeout_secs,
            max_upload_bytes,
            allowed_origins,
            rust_log,
            log_dir,
        }
    }
}

fn required_url(key: &str) -> Url {
    let raw = env::var(key).unwrap_or_else(|_| panic!("{} must be set", key));
    Url::parse(&raw).unwrap_or_else(|e| panic!("{} is not a valid URL: {}", key, e))
}

fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{} has an invalid value '{}': {}", key, raw, e)),
        Err(_) => default,
    }
}
