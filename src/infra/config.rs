// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::core::view_model::SortOrder;
use crate::infra::errors::{Result, TaskMasterError};
use crate::infra::paths;

/// Environment override for `api.base_url`.
pub const API_URL_ENV: &str = "TASKMASTER_API_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub polling: PollingSettings,

    #[serde(default)]
    pub view: ViewConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    pub tasks_interval_seconds: u64,
    pub stats_interval_seconds: u64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            tasks_interval_seconds: 60,
            stats_interval_seconds: 60,
        }
    }
}

impl PollingSettings {
    pub fn tasks_interval(&self) -> Duration {
        Duration::from_secs(self.tasks_interval_seconds)
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub page_size: usize,
    /// Default ordering, `field:direction` (e.g. `endTime:desc`).
    pub sort: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            sort: "startTime:asc".into(),
        }
    }
}

impl ViewConfig {
    pub fn sort_order(&self) -> Result<SortOrder> {
        self.sort.parse()
    }
}

impl Config {
    /// Load config from file, falling back to defaults, then apply the
    /// environment override.
    pub fn load() -> anyhow::Result<Self> {
        let path = paths::config_file_path();
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// `TASKMASTER_API_URL` wins over the file.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api.base_url = url;
            }
        }
    }

    /// Reject settings that would make the client misbehave at runtime.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.api.base_url).map_err(|e| {
            TaskMasterError::Config(format!("invalid api.base_url '{}': {e}", self.api.base_url))
        })?;
        if self.polling.tasks_interval_seconds == 0 || self.polling.stats_interval_seconds == 0 {
            return Err(TaskMasterError::Config(
                "polling intervals must be at least 1 second".into(),
            ));
        }
        if self.view.page_size == 0 {
            return Err(TaskMasterError::Config("view.page_size must be positive".into()));
        }
        self.view.sort_order()?;
        Ok(())
    }
}
