use crate::*;
use confique::Config as _;
use std::{sync::OnceLock, time::Duration};

#[derive(confique::Config, Debug, Clone)]
pub struct Config {
    #[config(env = "SQLCOMPLETE_FETCH_TIMEOUT_MS", default = 5000)]
    pub fetch_timeout_ms: u64,
    #[config(env = "SQLCOMPLETE_REFRESH_ON_DDL_ONLY", default = false)]
    pub refresh_on_ddl_only: bool,
    #[config(env = "SQLCOMPLETE_SCHEMA_ONLY_AFTER_DOT", default = false)]
    pub schema_only_after_dot: bool,
    /// Restrict introspection to a single schema.
    #[config(env = "SQLCOMPLETE_SCHEMA")]
    pub schema: Option<String>,
    #[config(env = "SQLCOMPLETE_MAX_CONNECTIONS", default = 3)]
    pub max_connections: u32,
    /// Rows counted per result set before it is reported as truncated.
    #[config(env = "SQLCOMPLETE_MAX_RESULT", default = 1000)]
    pub max_result: u64,
    #[cfg(test)]
    #[config(env = "SQLCOMPLETE_CONTAINER_RAMDISKED", default = true)]
    pub container_ramdisked: bool,
    #[cfg(test)]
    #[config(env = "SQLCOMPLETE_CONTAINER_LOGS", default = false)]
    pub container_logs: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Config::builder()
            .env()
            .load()
            .map_err(|e| Error::Config(e.to_string()))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn refresh_trigger(&self) -> RefreshTrigger {
        if self.refresh_on_ddl_only {
            RefreshTrigger::DdlOnly
        } else {
            RefreshTrigger::Always
        }
    }
}

pub fn config() -> &'static Config {
    static CONFIG: OnceLock<Config> = OnceLock::new();
    CONFIG.get_or_init(|| {
        Config::from_env()
            .expect("Failed to load one or more value configuration from the current environment")
    })
}
