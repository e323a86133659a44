use crate::config::AppConfig;
use std::sync::Arc;
use time::OffsetDateTime;

/// Source of "now" for request handling. The core never reads the clock itself.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let clock = Arc::new(SystemClock) as Arc<dyn Clock>;
        Ok(Self { config, clock })
    }

    /// State with default config and a clock frozen at 2024-06-15 12:00 UTC.
    pub fn fake() -> Self {
        struct FixedClock(OffsetDateTime);
        impl Clock for FixedClock {
            fn now(&self) -> OffsetDateTime {
                self.0
            }
        }

        let config = Arc::new(AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            recent_window_days: 30,
            max_body_bytes: 1024 * 1024,
        });
        let clock = Arc::new(FixedClock(time::macros::datetime!(2024-06-15 12:00 UTC)))
            as Arc<dyn Clock>;
        Self { config, clock }
    }
}
