/// Daemon configuration
use crate::error::{DaemonError, Result};
use marquee_federation::FetcherConfig;
use marquee_sync::SyncConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DaemonConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub federation: FetcherConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub watch: WatchSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_database_url")]
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WatchSettings {
    /// Seconds between two stale-playlist sweeps
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Playlists refreshed per sweep at most
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
}

impl DaemonConfig {
    /// Load configuration from file and environment
    ///
    /// `path` defaults to `marquee.toml` in the working directory; a missing
    /// default file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from("marquee.toml");
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables, e.g. MARQUEE_SYNC__MAX_PAGES=100
        settings = settings.add_source(
            config::Environment::with_prefix("MARQUEE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.database.url.is_empty() {
            return Err(DaemonError::Config(
                "database URL is required (set MARQUEE_DATABASE__URL)".to_string(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(DaemonError::Config(
                "database.max_connections must be at least 1".to_string(),
            ));
        }

        if self.federation.request_timeout_secs == 0 || self.federation.connect_timeout_secs == 0 {
            return Err(DaemonError::Config(
                "federation timeouts must be greater than zero".to_string(),
            ));
        }

        if self.watch.interval_secs == 0 || self.watch.batch_size == 0 {
            return Err(DaemonError::Config(
                "watch.interval_secs and watch.batch_size must be greater than zero".to_string(),
            ));
        }

        self.sync.validate()?;

        Ok(())
    }
}

// Default values
impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_database_url() -> String {
    "sqlite://./data/marquee.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_interval_secs() -> u64 {
    60
}

fn default_batch_size() -> u32 {
    50
}
