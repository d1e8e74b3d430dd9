//! Application configuration options

use std::time::Duration;

use secrecy::SecretString;

use crate::storage::layout::StorageLayout;
use crate::watch::watcher::WatchSettings;
use crate::workers::watch;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Platform API base URL
    pub backend_base_url: String,

    /// Preview service base URL
    pub preview_base_url: String,

    /// API token, if the platform requires one
    pub api_token: Option<SecretString>,

    /// Project whose deployments are watched
    pub project_id: String,

    /// Job list page to load on startup
    pub initial_page: u32,

    /// Storage configuration
    pub storage: StorageOptions,

    /// Watcher tuning
    pub watch_settings: WatchSettings,

    /// Watch worker options
    pub watch_worker: watch::Options,

    /// Show the startup usage hint
    pub show_hints: bool,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            backend_base_url: "https://api.mdpress.dev/v1".to_string(),
            preview_base_url: "https://preview.mdpress.dev".to_string(),
            api_token: None,
            project_id: String::new(),
            initial_page: 1,
            storage: StorageOptions::default(),
            watch_settings: WatchSettings::default(),
            watch_worker: watch::Options::default(),
            show_hints: true,
        }
    }
}

/// Lifecycle options for the console
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}

/// Storage configuration options
#[derive(Debug, Clone, Default)]
pub struct StorageOptions {
    /// Storage layout paths
    pub layout: StorageLayout,
}
