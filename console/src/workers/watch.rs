//! Watch worker for periodic status checks

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::{debug, info};

use crate::http::jobs::DeployApi;
use crate::watch::watcher::JobWatcher;

/// Watch worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Tick interval
    pub interval: Duration,

    /// Initial delay before the first tick
    pub initial_delay: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            initial_delay: Duration::from_secs(5),
        }
    }
}

/// Run the watch worker.
///
/// Each tick is awaited to completion before the next interval sleep, so
/// poll fetches never overlap; a slow fetch delays the next tick.
pub async fn run<A, S, F>(
    options: &Options,
    watcher: &JobWatcher<A>,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    A: DeployApi,
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Watch worker starting...");

    // Initial delay
    sleep_fn(options.initial_delay).await;

    loop {
        // Check for shutdown
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Watch worker shutting down...");
                return;
            }
            _ = sleep_fn(options.interval) => {
                // Continue with tick
            }
        }

        debug!("Checking deployment status...");
        watcher.tick().await;
    }
}
