use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};

use crate::vacation::BookingPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    /// MySQL connection string. Without one the service keeps its data in
    /// memory.
    pub database_url: Option<String>,
    /// JSON list of employees loaded into the in-memory store at startup.
    pub seed_employees: Option<PathBuf>,
    pub api_prefix: String,

    pub booking_horizon_months: u32,
    pub pending_expiry_days: Option<u32>,
    pub reaper_interval_secs: u64,

    // Rate limiting
    pub rate_submit_per_min: u32,
    pub rate_admin_per_min: u32,
    pub rate_public_per_min: u32,

    pub log_dir: String,
    pub log_level: tracing::Level,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Self {
            server_addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            database_url: optional("DATABASE_URL"),
            seed_employees: optional("SEED_EMPLOYEES").map(PathBuf::from),
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            booking_horizon_months: parse_or("BOOKING_HORIZON_MONTHS", 2)?,
            pending_expiry_days: optional("PENDING_EXPIRY_DAYS")
                .map(|raw| parse_value("PENDING_EXPIRY_DAYS", &raw))
                .transpose()?,
            reaper_interval_secs: parse_or("REAPER_INTERVAL_SECS", 3600)?,

            rate_submit_per_min: parse_or("RATE_SUBMIT_PER_MIN", 30)?,
            rate_admin_per_min: parse_or("RATE_ADMIN_PER_MIN", 120)?,
            rate_public_per_min: parse_or("RATE_PUBLIC_PER_MIN", 600)?,

            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            log_level: parse_or("LOG_LEVEL", tracing::Level::DEBUG)?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.booking_horizon_months == 0 {
            bail!("BOOKING_HORIZON_MONTHS must be at least 1");
        }
        if self.pending_expiry_days == Some(0) {
            bail!("PENDING_EXPIRY_DAYS must be at least 1 when set");
        }
        if self.reaper_interval_secs == 0 {
            bail!("REAPER_INTERVAL_SECS must be at least 1");
        }
        for (name, rate) in [
            ("RATE_SUBMIT_PER_MIN", self.rate_submit_per_min),
            ("RATE_ADMIN_PER_MIN", self.rate_admin_per_min),
            ("RATE_PUBLIC_PER_MIN", self.rate_public_per_min),
        ] {
            if rate == 0 {
                bail!("{name} must be at least 1");
            }
        }
        if !self.api_prefix.starts_with('/') {
            bail!("API_PREFIX must start with '/', got {:?}", self.api_prefix);
        }
        Ok(())
    }

    pub fn policy(&self) -> BookingPolicy {
        BookingPolicy {
            horizon_months: self.booking_horizon_months,
            pending_expiry_days: self.pending_expiry_days,
        }
    }

    pub fn reaper_interval(&self) -> Duration {
        Duration::from_secs(self.reaper_interval_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:8080".to_string(),
            database_url: None,
            seed_employees: None,
            api_prefix: "/api".to_string(),
            booking_horizon_months: 2,
            pending_expiry_days: None,
            reaper_interval_secs: 3600,
            rate_submit_per_min: 30,
            rate_admin_per_min: 120,
            rate_public_per_min: 600,
            log_dir: "logs".to_string(),
            log_level: tracing::Level::DEBUG,
        }
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(name) {
        Some(raw) => parse_value(name, &raw),
        None => Ok(default),
    }
}

fn parse_value<T>(name: &str, raw: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("{name} has an invalid value {raw:?}"))
}
