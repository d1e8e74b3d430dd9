//! Settings file management

use serde::{Deserialize, Serialize};

use crate::logs::LogLevel;

/// Console settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Backend configuration
    #[serde(default)]
    pub backend: BackendSettings,

    /// Default project to watch
    #[serde(default)]
    pub project_id: Option<String>,

    /// API token for the platform
    #[serde(default)]
    pub api_token: Option<String>,

    /// Watch tuning
    #[serde(default)]
    pub watch: WatchTuning,

    /// Show the startup usage hint
    #[serde(default = "default_true")]
    pub show_hints: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            backend: BackendSettings::default(),
            project_id: None,
            api_token: None,
            watch: WatchTuning::default(),
            show_hints: true,
        }
    }
}

/// Backend API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Base URL for the platform API
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    /// Base URL for the preview service
    #[serde(default = "default_preview_url")]
    pub preview_base_url: String,
}

fn default_backend_url() -> String {
    "https://api.mdpress.dev/v1".to_string()
}

fn default_preview_url() -> String {
    "https://preview.mdpress.dev".to_string()
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            preview_base_url: default_preview_url(),
        }
    }
}

/// Polling and pagination tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchTuning {
    /// Tick interval in seconds
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Stop polling jobs older than this, in seconds
    #[serde(default = "default_max_age")]
    pub max_candidate_age_secs: u64,

    /// Jobs per list page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Delay before the first tick, in seconds
    #[serde(default = "default_initial_delay")]
    pub initial_delay_secs: u64,
}

fn default_interval() -> u64 {
    30
}

fn default_max_age() -> u64 {
    600
}

fn default_page_size() -> u32 {
    20
}

fn default_initial_delay() -> u64 {
    5
}

impl Default for WatchTuning {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            max_candidate_age_secs: default_max_age(),
            page_size: default_page_size(),
            initial_delay_secs: default_initial_delay(),
        }
    }
}
