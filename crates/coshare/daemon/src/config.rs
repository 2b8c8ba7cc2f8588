//! Configuration for coshare-daemon

use coshare_service::LimiterConfig;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::error::{DaemonError, DaemonResult};

/// Default REST listen port.
pub const DEFAULT_PORT: u16 = 50013;

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    /// Anonymous shared-read limiting
    #[serde(default)]
    pub limiter: LimiterSettings,

    /// Access event delivery
    #[serde(default)]
    pub events: EventSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage (for development/testing)
    #[default]
    Memory,

    /// PostgreSQL storage
    Postgres {
        /// Connection URL
        url: String,

        /// Maximum connections in pool
        #[serde(default = "default_pool_size")]
        max_connections: u32,

        /// Connection timeout in seconds
        #[serde(default = "default_connection_timeout")]
        connect_timeout_secs: u64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimiterSettings {
    /// Reads admitted per token per window
    #[serde(default = "default_ceiling")]
    pub ceiling: u32,

    /// Window length in seconds, measured from a token's first read
    #[serde(default = "default_window")]
    pub window_secs: u64,

    /// How often expired windows are evicted
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for LimiterSettings {
    fn default() -> Self {
        Self {
            ceiling: default_ceiling(),
            window_secs: default_window(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

impl LimiterSettings {
    pub fn limiter_config(&self) -> LimiterConfig {
        LimiterConfig {
            ceiling: self.ceiling,
            window: Duration::from_secs(self.window_secs),
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSettings {
    /// Queue depth between request handlers and the event consumer
    #[serde(default = "default_event_capacity")]
    pub capacity: usize,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            capacity: default_event_capacity(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level, used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT))
}

fn default_pool_size() -> u32 {
    10
}

fn default_connection_timeout() -> u64 {
    5
}

fn default_ceiling() -> u32 {
    coshare_service::limiter::DEFAULT_CEILING
}

fn default_window() -> u64 {
    coshare_service::limiter::DEFAULT_WINDOW.as_secs()
}

fn default_sweep_interval() -> u64 {
    30
}

fn default_event_capacity() -> usize {
    coshare_service::DEFAULT_EVENT_CAPACITY
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration: built-in defaults, then the optional file, then
    /// `COSHARE_` environment variables (`__` separates nested keys, e.g.
    /// `COSHARE_SERVER__LISTEN_ADDR`).
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("COSHARE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Reject settings the daemon cannot run with.
    pub fn validate(&self) -> DaemonResult<()> {
        if self.limiter.ceiling == 0 {
            return Err(DaemonError::Config(
                "limiter.ceiling must be positive".to_string(),
            ));
        }
        if self.limiter.window_secs == 0 {
            return Err(DaemonError::Config(
                "limiter.window_secs must be positive".to_string(),
            ));
        }
        if self.limiter.sweep_interval_secs == 0 {
            return Err(DaemonError::Config(
                "limiter.sweep_interval_secs must be positive".to_string(),
            ));
        }
        if self.events.capacity == 0 {
            return Err(DaemonError::Config(
                "events.capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
