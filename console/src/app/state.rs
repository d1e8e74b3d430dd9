//! Application state management

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::info;

use crate::app::options::AppOptions;
use crate::errors::ConsoleError;
use crate::http::client::HttpClient;
use crate::sdk::SdkLoader;
use crate::storage::prefs::{Preferences, DEFAULT_DISMISSAL_TTL};
use crate::store::jobs::JobStore;
use crate::watch::events::DeploymentUpdate;
use crate::watch::watcher::JobWatcher;

/// Main application state
pub struct AppState {
    /// Watched project
    pub project_id: String,

    /// HTTP client for platform communication
    pub http_client: Arc<HttpClient>,

    /// In-memory job list
    pub store: Arc<JobStore>,

    /// Job watcher
    pub watcher: Arc<JobWatcher<HttpClient>>,

    /// Persisted preferences
    pub prefs: Arc<Preferences>,

    /// Preview SDK loader
    pub sdk: Arc<SdkLoader>,
}

impl AppState {
    /// Initialize application state.
    ///
    /// Returns the receiving end of the watcher's update channel.
    pub fn init(
        options: &AppOptions,
    ) -> Result<(Self, UnboundedReceiver<DeploymentUpdate>), ConsoleError> {
        info!("Initializing application state...");

        let http_client = Arc::new(match &options.api_token {
            Some(token) => HttpClient::with_token(&options.backend_base_url, token.clone())?,
            None => HttpClient::new(&options.backend_base_url)?,
        });

        let store = Arc::new(JobStore::new());

        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let watcher = Arc::new(JobWatcher::new(
            http_client.clone(),
            options.project_id.clone(),
            store.clone(),
            options.watch_settings.clone(),
            events_tx,
        ));

        let prefs = Arc::new(Preferences::new(
            options.storage.layout.prefs_file(),
            DEFAULT_DISMISSAL_TTL,
        ));

        let sdk = Arc::new(SdkLoader::new(options.preview_base_url.clone()));

        let state = Self {
            project_id: options.project_id.clone(),
            http_client,
            store,
            watcher,
            prefs,
            sdk,
        };

        Ok((state, events_rx))
    }
}
