//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::app::options::{AppOptions, LifecycleOptions};
use crate::app::state::AppState;
use crate::errors::ConsoleError;
use crate::models::issue::{filter_by_severity, group_by_file, IssueSeverity};
use crate::render;
use crate::watch::events::DeploymentUpdate;
use crate::workers::watch;

pub const STARTUP_HINT_KEY: &str = "startup-hint";

/// Run the console in watch mode
pub async fn run(
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ConsoleError> {
    info!("Initializing mdpress console...");

    // Create shutdown channel
    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager =
        ShutdownManager::new(shutdown_tx.clone(), options.lifecycle.clone());

    let (app_state, events) = AppState::init(&options)?;
    let app_state = Arc::new(app_state);

    if options.show_hints && !app_state.prefs.is_dismissed(STARTUP_HINT_KEY).await {
        println!(
            "{}",
            render::hint_line(
                "tip: --activate=<job-id> promotes a completed deployment; --quiet-hints silences this line"
            )
        );
    }

    // Initial load: a failed list fetch keeps the (empty) previous list and
    // is shown as a banner below the table
    if let Err(e) = app_state.watcher.load_page(options.initial_page).await {
        error!("Initial job list load failed: {}", e);
    }
    if let Err(e) = app_state.watcher.refresh_project().await {
        warn!("Project metadata load failed: {}", e);
    }
    print_job_table(&app_state).await;

    init_reporter(
        app_state.clone(),
        events,
        &mut shutdown_manager,
        shutdown_tx.subscribe(),
    )?;

    init_watch_worker(
        &options,
        app_state.clone(),
        &mut shutdown_manager,
        shutdown_tx.subscribe(),
    )?;

    tokio::select! {
        _ = shutdown_signal => {
            info!("Shutdown signal received, shutting down...");
        }
    }

    drop(shutdown_tx);
    shutdown_manager.shutdown().await
}

/// Activate a deployment and exit
pub async fn activate_once(options: AppOptions, job_id: &str) -> Result<(), ConsoleError> {
    let (app_state, _events) = AppState::init(&options)?;

    // The guard conditions need the list and the live revision
    app_state.watcher.load_page(options.initial_page).await?;
    app_state.watcher.refresh_project().await?;

    let response = app_state.watcher.activate(job_id).await?;

    let note = response
        .message
        .map(|m| format!(" ({})", m))
        .unwrap_or_default();
    println!("deployment {} is now live{}", render::short_id(job_id), note);

    match app_state.sdk.get().await {
        Ok(sdk) => println!("preview: {}", sdk.preview_url(&app_state.project_id, job_id)),
        Err(e) => warn!("Preview URL unavailable: {}", e),
    }

    Ok(())
}

/// Print the issues reported for a deployment, grouped by file, and exit
pub async fn issues_once(
    options: AppOptions,
    job_id: &str,
    min_severity: IssueSeverity,
) -> Result<(), ConsoleError> {
    let (app_state, _events) = AppState::init(&options)?;

    let issues = app_state
        .http_client
        .fetch_issues(&app_state.project_id, job_id)
        .await?;
    let issues = filter_by_severity(&issues, min_severity);

    if issues.is_empty() {
        println!("{}", render::hint_line("no issues at this severity"));
        return Ok(());
    }

    for group in group_by_file(&issues) {
        println!("{}", render::issue_group_header(&group));
        for issue in &group.issues {
            println!("{}", render::issue_line(issue));
        }
    }

    Ok(())
}

async fn print_job_table(app_state: &AppState) {
    let now = Utc::now();
    let active_rev = app_state.watcher.active_rev().await;
    let jobs = app_state.store.jobs();

    if jobs.is_empty() {
        println!("{}", render::hint_line("no deployments yet"));
    }
    for job in &jobs {
        println!("{}", render::job_row(job, active_rev.as_deref(), now));
    }

    if let Some(err) = app_state.store.last_error() {
        println!("{}", render::error_banner(&err));
    }
}

// =============================== WORKERS ======================================== //

fn init_reporter(
    app_state: Arc<AppState>,
    mut events: UnboundedReceiver<DeploymentUpdate>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), ConsoleError> {
    info!("Initializing reporter...");

    let handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Reporter shutting down...");
                    return;
                }
                update = events.recv() => {
                    match update {
                        Some(update) => report_update(&app_state, update).await,
                        None => return,
                    }
                }
            }
        }
    });

    shutdown_manager.with_reporter_handle(handle)
}

async fn report_update(app_state: &AppState, update: DeploymentUpdate) {
    let now = Utc::now();

    match update {
        DeploymentUpdate::StatusChanged {
            job,
            previous_status,
            new_status,
        } => {
            info!(
                "Deployment updated: {} {} -> {}",
                job.id, previous_status, new_status
            );

            let active_rev = app_state.watcher.active_rev().await;
            println!("{}", render::job_row(&job, active_rev.as_deref(), now));

            // A settled job may have changed the live revision server-side
            if new_status.is_terminal() {
                if let Err(e) = app_state.watcher.refresh_project().await {
                    warn!("Project refresh failed: {}", e);
                }
            }
        }
        DeploymentUpdate::Activated { job, .. } => {
            println!("deployment {} is now live", render::short_id(&job.id));
            match app_state.sdk.get().await {
                Ok(sdk) => {
                    println!("preview: {}", sdk.preview_url(&app_state.project_id, &job.id));
                }
                Err(e) => warn!("Preview URL unavailable: {}", e),
            }
        }
    }
}

fn init_watch_worker(
    options: &AppOptions,
    app_state: Arc<AppState>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), ConsoleError> {
    info!("Initializing watch worker...");

    let worker_options = options.watch_worker.clone();
    let watcher = app_state.watcher.clone();

    let handle = tokio::spawn(async move {
        watch::run(
            &worker_options,
            watcher.as_ref(),
            tokio::time::sleep,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_watch_worker_handle(handle)
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    lifecycle_options: LifecycleOptions,
    reporter_handle: Option<JoinHandle<()>>,
    watch_worker_handle: Option<JoinHandle<()>>,
}

impl ShutdownManager {
    pub fn new(shutdown_tx: broadcast::Sender<()>, lifecycle_options: LifecycleOptions) -> Self {
        Self {
            shutdown_tx,
            lifecycle_options,
            reporter_handle: None,
            watch_worker_handle: None,
        }
    }

    pub fn with_reporter_handle(&mut self, handle: JoinHandle<()>) -> Result<(), ConsoleError> {
        if self.reporter_handle.is_some() {
            return Err(ConsoleError::ShutdownError(
                "reporter_handle already set".to_string(),
            ));
        }
        self.reporter_handle = Some(handle);
        Ok(())
    }

    pub fn with_watch_worker_handle(&mut self, handle: JoinHandle<()>) -> Result<(), ConsoleError> {
        if self.watch_worker_handle.is_some() {
            return Err(ConsoleError::ShutdownError(
                "watch_worker_handle already set".to_string(),
            ));
        }
        self.watch_worker_handle = Some(handle);
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), ConsoleError> {
        let _ = self.shutdown_tx.send(());

        match tokio::time::timeout(
            self.lifecycle_options.max_shutdown_delay,
            self.shutdown_impl(),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "Shutdown timed out after {:?}, forcing shutdown...",
                    self.lifecycle_options.max_shutdown_delay
                );
                std::process::exit(1);
            }
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), ConsoleError> {
        info!("Shutting down mdpress console...");

        // 1. Watch worker
        if let Some(handle) = self.watch_worker_handle.take() {
            handle
                .await
                .map_err(|e| ConsoleError::ShutdownError(e.to_string()))?;
        }

        // 2. Reporter
        if let Some(handle) = self.reporter_handle.take() {
            handle
                .await
                .map_err(|e| ConsoleError::ShutdownError(e.to_string()))?;
        }

        info!("Shutdown complete");
        Ok(())
    }
}
