use anyhow::{bail, Context};
use serde::Deserialize;

use crate::stats::services::DEFAULT_RECENT_WINDOW_DAYS;

const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
const MAX_RECENT_WINDOW_DAYS: i64 = 36_500;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub recent_window_days: i64,
    pub max_body_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let host = lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse_or(&lookup, "APP_PORT", 8080)?;
        let recent_window_days = parse_or(&lookup, "RECENT_WINDOW_DAYS", DEFAULT_RECENT_WINDOW_DAYS)?;
        if !(1..=MAX_RECENT_WINDOW_DAYS).contains(&recent_window_days) {
            bail!(
                "RECENT_WINDOW_DAYS must be between 1 and {}, got {}",
                MAX_RECENT_WINDOW_DAYS,
                recent_window_days
            );
        }
        let max_body_bytes = parse_or(&lookup, "MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?;
        Ok(Self {
            host,
            port,
            recent_window_days,
            max_body_bytes,
        })
    }

    pub fn recent_window(&self) -> time::Duration {
        time::Duration::days(self.recent_window_days)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid {}: {:?}", key, raw)),
        None => Ok(default),
    }
}
