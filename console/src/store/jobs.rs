//! In-memory job list store

use std::sync::RwLock;

use crate::models::job::{Job, JobStatus, Pagination};

#[derive(Debug, Default)]
struct ListState {
    jobs: Vec<Job>,
    pagination: Option<Pagination>,
    last_error: Option<String>,
}

/// Holds the most recent page of deployment jobs for a project.
///
/// The list is kept in the order the backend returned it (newest first);
/// merges never reorder.
#[derive(Default)]
pub struct JobStore {
    inner: RwLock<ListState>,
}

impl JobStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list and pagination metadata wholesale.
    ///
    /// Clears any recorded list error.
    pub fn replace_page(&self, jobs: Vec<Job>, pagination: Pagination) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.jobs = jobs;
        inner.pagination = Some(pagination);
        inner.last_error = None;
    }

    /// Record a list-fetch error, leaving the previous list untouched
    pub fn set_error(&self, message: String) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.last_error = Some(message);
    }

    /// Replace a job in place at its current index.
    ///
    /// Returns the previous status when the id was present; a job that is no
    /// longer in the list is left alone and `None` is returned.
    pub fn merge_job(&self, job: Job) -> Option<JobStatus> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let slot = inner.jobs.iter_mut().find(|j| j.id == job.id)?;
        let previous = slot.status;
        *slot = job;
        Some(previous)
    }

    /// The most-recently-created job (index 0)
    pub fn newest(&self) -> Option<Job> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.jobs.first().cloned()
    }

    /// Look up a job by id
    pub fn get(&self, job_id: &str) -> Option<Job> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.jobs.iter().find(|j| j.id == job_id).cloned()
    }

    /// Snapshot of the current page
    pub fn jobs(&self) -> Vec<Job> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.jobs.clone()
    }

    /// Current pagination metadata
    pub fn pagination(&self) -> Option<Pagination> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.pagination.clone()
    }

    /// Page number of the loaded list, defaulting to the first page
    pub fn current_page(&self) -> u32 {
        self.pagination().map(|p| p.page.max(1)).unwrap_or(1)
    }

    /// The last recorded list error, if any
    pub fn last_error(&self) -> Option<String> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.last_error.clone()
    }

    /// Number of jobs on the loaded page
    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.jobs.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
