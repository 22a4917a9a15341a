use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,
    pub api_prefix: String,

    // Biometric upstream
    pub biometric_api_url: String,
    pub biometric_timeout: Duration,
    pub biometric_client_id: String,
    /// Skips certificate checks on the biometric client only.
    pub biometric_accept_invalid_certs: bool,

    // Rate limiting
    pub rate_attendance_per_min: u32,

    // Logging
    pub log_dir: String,
    pub log_level: tracing::Level,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            biometric_api_url: required("BIOMETRIC_API_URL")?,
            biometric_timeout: Duration::from_secs(parsed_or("BIOMETRIC_API_TIMEOUT_SECS", 5)?),
            biometric_client_id: env::var("BIOMETRIC_CLIENT_ID")
                .unwrap_or_else(|_| "hr-portal-attendance-sync".to_string()),
            biometric_accept_invalid_certs: parsed_or("BIOMETRIC_ACCEPT_INVALID_CERTS", false)?,

            rate_attendance_per_min: parsed_or("RATE_ATTENDANCE_PER_MIN", 120)?,

            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            log_level: parsed_or("LOG_LEVEL", tracing::Level::DEBUG)?,
        })
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn parsed_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{key} is invalid: {e}")),
        Err(_) => Ok(default),
    }
}
