//! Deployment job watcher
//!
//! Keeps one project's job list loaded and the freshest job's status current.
//! Only the newest job is re-fetched on a tick; everything else changes via
//! full list reloads.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::errors::ConsoleError;
use crate::http::jobs::{ActivateResponse, DeployApi};
use crate::models::job::Job;
use crate::models::project::Project;
use crate::store::jobs::JobStore;
use crate::utils::{calc_exp_backoff, CooldownOptions};
use crate::watch::events::DeploymentUpdate;
use crate::watch::state::{PollState, Transition};

/// Watcher tuning
#[derive(Debug, Clone)]
pub struct WatchSettings {
    /// Jobs older than this are never polled
    pub max_candidate_age: Duration,

    /// Jobs per list page
    pub page_size: u32,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            max_candidate_age: Duration::from_secs(600),
            page_size: 20,
        }
    }
}

/// Reload failure tracking
#[derive(Debug, Clone)]
struct ReloadCooldown {
    err_streak: u32,
    cooldown_ends_at: DateTime<Utc>,
}

impl Default for ReloadCooldown {
    fn default() -> Self {
        Self {
            err_streak: 0,
            cooldown_ends_at: DateTime::<Utc>::MIN_UTC,
        }
    }
}

impl ReloadCooldown {
    fn is_in_cooldown(&self, now: DateTime<Utc>) -> bool {
        now < self.cooldown_ends_at
    }
}

/// Job watcher for a single project
pub struct JobWatcher<A: DeployApi> {
    api: Arc<A>,
    project_id: String,
    store: Arc<JobStore>,
    settings: WatchSettings,
    state: RwLock<PollState>,
    project: RwLock<Option<Project>>,
    reload: RwLock<ReloadCooldown>,
    cooldown_options: CooldownOptions,
    events: UnboundedSender<DeploymentUpdate>,
}

impl<A: DeployApi> JobWatcher<A> {
    /// Create a new watcher
    pub fn new(
        api: Arc<A>,
        project_id: String,
        store: Arc<JobStore>,
        settings: WatchSettings,
        events: UnboundedSender<DeploymentUpdate>,
    ) -> Self {
        Self {
            api,
            project_id,
            store,
            settings,
            state: RwLock::new(PollState::new()),
            project: RwLock::new(None),
            reload: RwLock::new(ReloadCooldown::default()),
            cooldown_options: CooldownOptions::default(),
            events,
        }
    }

    /// Current poll state snapshot
    pub async fn poll_state(&self) -> PollState {
        self.state.read().await.clone()
    }

    /// Cached project metadata
    pub async fn project(&self) -> Option<Project> {
        self.project.read().await.clone()
    }

    /// Cached live revision id
    pub async fn active_rev(&self) -> Option<String> {
        self.project.read().await.as_ref().and_then(|p| p.active_rev.clone())
    }

    /// Re-fetch project metadata
    pub async fn refresh_project(&self) -> Result<(), ConsoleError> {
        let project = self.api.get_project(&self.project_id).await?;
        debug!(
            "Project {} refreshed, activeRev: {:?}",
            project.id, project.active_rev
        );
        *self.project.write().await = Some(project);
        Ok(())
    }

    /// Load a page of jobs, replacing the list wholesale.
    ///
    /// On failure the previous list is retained and the error is recorded on
    /// the store; repeated failures back off before the next reload attempt.
    pub async fn load_page(&self, page: u32) -> Result<(), ConsoleError> {
        // Check cooldown
        {
            let reload = self.reload.read().await;
            if reload.is_in_cooldown(Utc::now()) {
                debug!("Job list reload in cooldown, skipping...");
                return Ok(());
            }
        }

        match self
            .api
            .list_jobs(&self.project_id, page, self.settings.page_size)
            .await
        {
            Ok(response) => {
                debug!(
                    "Loaded {} jobs (page {})",
                    response.jobs.len(),
                    response.pagination.page
                );
                self.store.replace_page(response.jobs, response.pagination);

                let mut reload = self.reload.write().await;
                reload.err_streak = 0;
                drop(reload);

                self.evaluate().await;
                Ok(())
            }
            Err(e) => {
                let mut reload = self.reload.write().await;
                reload.err_streak += 1;

                let cooldown = calc_exp_backoff(&self.cooldown_options, reload.err_streak);
                reload.cooldown_ends_at = Utc::now()
                    + chrono::Duration::from_std(cooldown)
                        .unwrap_or_else(|_| chrono::Duration::seconds(1));

                error!(
                    "Job list reload failed (attempt {}), cooldown until {}: {}",
                    reload.err_streak, reload.cooldown_ends_at, e
                );
                drop(reload);

                self.store.set_error(e.to_string());
                Err(e)
            }
        }
    }

    /// Reload the currently loaded page
    pub async fn refresh_jobs(&self) -> Result<(), ConsoleError> {
        self.load_page(self.store.current_page()).await
    }

    /// Re-derive the poll state from the newest job in the list.
    ///
    /// Called on every list change and at every tick; eligibility always
    /// uses wall-clock now, so a candidate crossing the age cutoff stops
    /// polling at the next evaluation no matter what triggered it.
    pub async fn evaluate(&self) -> Transition {
        let candidate = self.store.newest();
        let now = Utc::now();

        let mut state = self.state.write().await;
        let transition = state.advance(candidate.as_ref(), now, self.settings.max_candidate_age);

        match transition {
            Transition::Started => {
                if let Some(job_id) = state.target() {
                    info!("Polling started for job {}", job_id);
                }
            }
            Transition::Stopped => {
                info!("Polling stopped");
            }
            Transition::Unchanged => {}
        }

        transition
    }

    /// One poll tick: re-check eligibility, then fetch the candidate's fresh
    /// status. A failed single-job fetch falls back to a full list reload
    /// rather than retrying the fetch.
    pub async fn tick(&self) {
        self.evaluate().await;

        let target = {
            let state = self.state.read().await;
            state.target().map(String::from)
        };

        let Some(job_id) = target else {
            return;
        };

        match self.api.job_status(&self.project_id, &job_id).await {
            Ok(response) => {
                self.reconcile(response.job).await;
            }
            Err(e) => {
                // Transient: recover via the list instead of surfacing
                debug!(
                    "Status fetch for job {} failed, falling back to list reload: {}",
                    job_id, e
                );
                let _ = self.refresh_jobs().await;
            }
        }
    }

    /// Merge a freshly fetched job into the list at its existing position
    /// and emit a status-change event when the status actually moved.
    async fn reconcile(&self, fresh: Job) {
        let job_id = fresh.id.clone();
        let new_status = fresh.status;

        match self.store.merge_job(fresh.clone()) {
            Some(previous_status) => {
                if previous_status != new_status {
                    info!(
                        "Job {} status: {} -> {}",
                        job_id, previous_status, new_status
                    );
                    let _ = self.events.send(DeploymentUpdate::StatusChanged {
                        job: fresh,
                        previous_status,
                        new_status,
                    });
                }
            }
            None => {
                // A reload landed in between; the next evaluation re-targets
                debug!("Polled job {} is no longer in the list", job_id);
            }
        }

        self.evaluate().await;
    }

    /// Mark a completed job as the project's live deployment.
    ///
    /// The cached `activeRev` is never updated optimistically; it changes
    /// only through the confirmed re-fetch after the mutation succeeds.
    pub async fn activate(&self, job_id: &str) -> Result<ActivateResponse, ConsoleError> {
        let job = self
            .store
            .get(job_id)
            .ok_or_else(|| ConsoleError::NotFound(format!("job {}", job_id)))?;

        if !job.status.is_completed() {
            return Err(ConsoleError::ActivationError(format!(
                "job {} is {}, only completed jobs can be activated",
                job_id, job.status
            )));
        }

        if self.active_rev().await.as_deref() == Some(job_id) {
            return Err(ConsoleError::ActivationError(format!(
                "job {} is already the live deployment",
                job_id
            )));
        }

        let response = self.api.activate_deployment(&self.project_id, job_id).await?;
        if !response.success {
            return Err(ConsoleError::ActivationError(
                response
                    .message
                    .unwrap_or_else(|| "activation rejected by the backend".to_string()),
            ));
        }

        info!("Job {} activated", job_id);

        // Reflect server-side effects before anyone reads activeRev
        if let Err(e) = self.refresh_jobs().await {
            warn!("Job list reload after activation failed: {}", e);
        }
        if let Err(e) = self.refresh_project().await {
            warn!("Project refresh after activation failed: {}", e);
        }

        let job = self.store.get(job_id).unwrap_or(job);
        let _ = self.events.send(DeploymentUpdate::Activated {
            job,
            response: response.clone(),
        });

        Ok(response)
    }
}
