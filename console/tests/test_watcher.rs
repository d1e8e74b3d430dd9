//! Watcher integration tests against a mock platform API

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio_test::assert_ok;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver};

use mdpress_console::errors::ConsoleError;
use mdpress_console::http::jobs::{
    ActivateResponse, DeployApi, JobListResponse, JobStatusResponse,
};
use mdpress_console::models::job::{Job, JobStatus, Pagination};
use mdpress_console::models::project::Project;
use mdpress_console::store::jobs::JobStore;
use mdpress_console::watch::events::DeploymentUpdate;
use mdpress_console::watch::state::PollState;
use mdpress_console::watch::watcher::{JobWatcher, WatchSettings};
use mdpress_console::workers::watch;

fn create_test_job(id: &str, status: JobStatus, age_secs: i64) -> Job {
    let now = Utc::now();
    Job {
        id: id.to_string(),
        status,
        created_at: now - chrono::Duration::seconds(age_secs),
        updated_at: now,
        input: None,
        user_id: None,
    }
}

struct MockApi {
    jobs: Mutex<Vec<Job>>,
    project: Mutex<Project>,
    list_calls: AtomicUsize,
    status_calls: AtomicUsize,
    activate_calls: AtomicUsize,
    fail_list: AtomicBool,
    fail_status: AtomicBool,
    reject_activation: AtomicBool,
}

impl MockApi {
    fn new(jobs: Vec<Job>, active_rev: Option<&str>) -> Self {
        Self {
            jobs: Mutex::new(jobs),
            project: Mutex::new(Project {
                id: "proj-1".to_string(),
                name: "Docs".to_string(),
                active_rev: active_rev.map(String::from),
                repo: None,
            }),
            list_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            activate_calls: AtomicUsize::new(0),
            fail_list: AtomicBool::new(false),
            fail_status: AtomicBool::new(false),
            reject_activation: AtomicBool::new(false),
        }
    }

    fn set_status(&self, job_id: &str, status: JobStatus) {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(job) = jobs.iter_mut().find(|j| j.id == job_id) {
            job.status = status;
        }
    }

    fn set_jobs(&self, jobs: Vec<Job>) {
        *self.jobs.lock().unwrap() = jobs;
    }
}

#[async_trait]
impl DeployApi for MockApi {
    async fn list_jobs(
        &self,
        _project_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<JobListResponse, ConsoleError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(ConsoleError::ApiError("502: bad gateway".to_string()));
        }
        let jobs = self.jobs.lock().unwrap().clone();
        let total = jobs.len() as u64;
        Ok(JobListResponse {
            success: true,
            jobs,
            pagination: Pagination {
                page,
                limit,
                total,
                total_pages: 1,
            },
        })
    }

    async fn job_status(
        &self,
        _project_id: &str,
        job_id: &str,
    ) -> Result<JobStatusResponse, ConsoleError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_status.load(Ordering::SeqCst) {
            return Err(ConsoleError::ApiError("504: gateway timeout".to_string()));
        }
        let job = self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .find(|j| j.id == job_id)
            .cloned()
            .ok_or_else(|| ConsoleError::NotFound(format!("job {}", job_id)))?;
        Ok(JobStatusResponse { success: true, job })
    }

    async fn activate_deployment(
        &self,
        _project_id: &str,
        job_id: &str,
    ) -> Result<ActivateResponse, ConsoleError> {
        self.activate_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_activation.load(Ordering::SeqCst) {
            return Ok(ActivateResponse {
                success: false,
                message: Some("quota exceeded".to_string()),
            });
        }
        self.project.lock().unwrap().active_rev = Some(job_id.to_string());
        Ok(ActivateResponse {
            success: true,
            message: None,
        })
    }

    async fn get_project(&self, _project_id: &str) -> Result<Project, ConsoleError> {
        Ok(self.project.lock().unwrap().clone())
    }
}

type Fixture = (
    Arc<MockApi>,
    Arc<JobStore>,
    Arc<JobWatcher<MockApi>>,
    UnboundedReceiver<DeploymentUpdate>,
);

fn fixture(jobs: Vec<Job>, active_rev: Option<&str>) -> Fixture {
    let api = Arc::new(MockApi::new(jobs, active_rev));
    let store = Arc::new(JobStore::new());
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let watcher = Arc::new(JobWatcher::new(
        api.clone(),
        "proj-1".to_string(),
        store.clone(),
        WatchSettings::default(),
        events_tx,
    ));
    (api, store, watcher, events_rx)
}

#[tokio::test]
async fn test_load_starts_polling_for_fresh_pending_job() {
    let (_api, _store, watcher, _events) =
        fixture(vec![create_test_job("abc123", JobStatus::Pending, 10)], None);

    tokio_test::assert_ok!(watcher.refresh_jobs().await);

    let state = watcher.poll_state().await;
    assert!(state.is_polling());
    assert_eq!(state.target(), Some("abc123"));
}

#[tokio::test]
async fn test_settled_or_stale_jobs_stay_idle() {
    // Terminal status
    let (_api, _store, watcher, _events) = fixture(
        vec![create_test_job("abc123", JobStatus::Completed, 10)],
        None,
    );
    watcher.refresh_jobs().await.unwrap();
    assert_eq!(watcher.poll_state().await, PollState::Idle);

    // Pending but past the age cutoff
    let (_api, _store, watcher, _events) = fixture(
        vec![create_test_job("abc123", JobStatus::Pending, 660)],
        None,
    );
    watcher.refresh_jobs().await.unwrap();
    assert_eq!(watcher.poll_state().await, PollState::Idle);
}

#[tokio::test]
async fn test_aging_out_cancels_on_list_reevaluation() {
    let (api, _store, watcher, _events) =
        fixture(vec![create_test_job("abc123", JobStatus::Pending, 30)], None);

    watcher.refresh_jobs().await.unwrap();
    assert!(watcher.poll_state().await.is_polling());

    // The same job reappears past the 10-minute cutoff; the next list
    // re-evaluation cancels polling without waiting for a tick boundary
    api.set_jobs(vec![create_test_job("abc123", JobStatus::Pending, 601)]);
    watcher.refresh_jobs().await.unwrap();

    assert_eq!(watcher.poll_state().await, PollState::Idle);
}

#[tokio::test]
async fn test_tick_reconciles_in_place_and_emits_once() {
    let (api, store, watcher, mut events) = fixture(
        vec![
            create_test_job("abc123", JobStatus::Pending, 10),
            create_test_job("older", JobStatus::Completed, 900),
        ],
        None,
    );
    watcher.refresh_jobs().await.unwrap();

    // Backend moves the job to running before the next tick
    api.set_status("abc123", JobStatus::Running);
    watcher.tick().await;

    // Replaced in place at index 0
    let jobs = store.jobs();
    assert_eq!(jobs[0].id, "abc123");
    assert_eq!(jobs[0].status, JobStatus::Running);
    assert_eq!(jobs[1].id, "older");

    // Exactly one edge-triggered event
    match events.try_recv().unwrap() {
        DeploymentUpdate::StatusChanged {
            job,
            previous_status,
            new_status,
        } => {
            assert_eq!(job.id, "abc123");
            assert_eq!(previous_status, JobStatus::Pending);
            assert_eq!(new_status, JobStatus::Running);
        }
        other => panic!("unexpected update: {:?}", other),
    }
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

    // Status settled, polling stops
    assert_eq!(watcher.poll_state().await, PollState::Idle);
}

#[tokio::test]
async fn test_unchanged_status_emits_nothing() {
    let (api, _store, watcher, mut events) =
        fixture(vec![create_test_job("abc123", JobStatus::Pending, 10)], None);
    watcher.refresh_jobs().await.unwrap();

    watcher.tick().await;
    watcher.tick().await;

    assert_eq!(api.status_calls.load(Ordering::SeqCst), 2);
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    assert!(watcher.poll_state().await.is_polling());
}

#[tokio::test]
async fn test_status_fetch_failure_falls_back_to_list_reload() {
    let (api, store, watcher, mut events) =
        fixture(vec![create_test_job("abc123", JobStatus::Pending, 10)], None);
    watcher.refresh_jobs().await.unwrap();
    let lists_before = api.list_calls.load(Ordering::SeqCst);

    api.fail_status.store(true, Ordering::SeqCst);
    api.set_status("abc123", JobStatus::Running);
    watcher.tick().await;

    // Recovered via the list: one reload, no user-facing error
    assert_eq!(api.list_calls.load(Ordering::SeqCst), lists_before + 1);
    assert!(store.last_error().is_none());
    assert_eq!(store.get("abc123").unwrap().status, JobStatus::Running);

    // The reload path does not produce a status-change event
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_list_failure_keeps_previous_list() {
    let (api, store, watcher, _events) =
        fixture(vec![create_test_job("abc123", JobStatus::Pending, 10)], None);
    watcher.refresh_jobs().await.unwrap();

    api.fail_list.store(true, Ordering::SeqCst);
    assert!(watcher.refresh_jobs().await.is_err());

    assert_eq!(store.len(), 1);
    assert_eq!(store.get("abc123").unwrap().status, JobStatus::Pending);
    assert!(store.last_error().is_some());
}

#[tokio::test]
async fn test_activation_updates_active_rev_only_after_reload() {
    let (api, _store, watcher, mut events) = fixture(
        vec![
            create_test_job("new", JobStatus::Completed, 120),
            create_test_job("old", JobStatus::Completed, 900),
        ],
        Some("old"),
    );
    watcher.refresh_jobs().await.unwrap();
    watcher.refresh_project().await.unwrap();
    assert_eq!(watcher.active_rev().await.as_deref(), Some("old"));

    let lists_before = api.list_calls.load(Ordering::SeqCst);
    let response = watcher.activate("new").await.unwrap();
    assert!(response.success);

    // Confirmed re-fetches happened and the cached rev now reflects them
    assert_eq!(api.activate_calls.load(Ordering::SeqCst), 1);
    assert_eq!(api.list_calls.load(Ordering::SeqCst), lists_before + 1);
    assert_eq!(watcher.active_rev().await.as_deref(), Some("new"));

    match events.try_recv().unwrap() {
        DeploymentUpdate::Activated { job, response } => {
            assert_eq!(job.id, "new");
            assert!(response.success);
        }
        other => panic!("unexpected update: {:?}", other),
    }
}

#[tokio::test]
async fn test_activation_guards() {
    let (api, _store, watcher, mut events) = fixture(
        vec![
            create_test_job("running", JobStatus::Running, 60),
            create_test_job("live", JobStatus::Completed, 900),
        ],
        Some("live"),
    );
    watcher.refresh_jobs().await.unwrap();
    watcher.refresh_project().await.unwrap();

    // Not completed
    assert!(matches!(
        watcher.activate("running").await,
        Err(ConsoleError::ActivationError(_))
    ));

    // Already the live revision
    assert!(matches!(
        watcher.activate("live").await,
        Err(ConsoleError::ActivationError(_))
    ));

    // Unknown id
    assert!(matches!(
        watcher.activate("ghost").await,
        Err(ConsoleError::NotFound(_))
    ));

    assert_eq!(api.activate_calls.load(Ordering::SeqCst), 0);
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_rejected_activation_leaves_active_rev_alone() {
    let (api, _store, watcher, mut events) = fixture(
        vec![create_test_job("new", JobStatus::Completed, 120)],
        Some("old"),
    );
    watcher.refresh_jobs().await.unwrap();
    watcher.refresh_project().await.unwrap();

    api.reject_activation.store(true, Ordering::SeqCst);
    assert!(matches!(
        watcher.activate("new").await,
        Err(ConsoleError::ActivationError(_))
    ));

    assert_eq!(watcher.active_rev().await.as_deref(), Some("old"));
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test(start_paused = true)]
async fn test_worker_issues_no_fetches_after_shutdown() {
    let (api, _store, watcher, _events) =
        fixture(vec![create_test_job("abc123", JobStatus::Pending, 10)], None);
    watcher.refresh_jobs().await.unwrap();

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::broadcast::channel::<()>(1);
    let options = watch::Options {
        interval: Duration::from_secs(30),
        initial_delay: Duration::from_secs(0),
    };

    let worker = watcher.clone();
    let handle = tokio::spawn(async move {
        watch::run(
            &options,
            worker.as_ref(),
            tokio::time::sleep,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    // Let a few ticks fire
    tokio::time::sleep(Duration::from_secs(95)).await;
    let ticks_before = api.status_calls.load(Ordering::SeqCst);
    assert!(ticks_before >= 1);

    // Tear the worker down
    shutdown_tx.send(()).unwrap();
    handle.await.unwrap();

    // Time keeps passing, no further fetches are issued
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(api.status_calls.load(Ordering::SeqCst), ticks_before);
}
