//! Job API client

use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::ConsoleError;
use crate::http::client::HttpClient;
use crate::models::job::{Job, Pagination};
use crate::models::project::Project;

/// Job list page response
#[derive(Debug, Clone, Deserialize)]
pub struct JobListResponse {
    #[serde(default)]
    pub success: bool,
    pub jobs: Vec<Job>,
    #[serde(default)]
    pub pagination: Pagination,
}

/// Single job status response
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatusResponse {
    #[serde(default)]
    pub success: bool,
    pub job: Job,
}

/// Activation mutation response
#[derive(Debug, Clone, Deserialize)]
pub struct ActivateResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Platform deployment API, as one seam so the watcher can be driven
/// against a substitute in tests.
#[async_trait]
pub trait DeployApi: Send + Sync {
    /// Fetch one page of a project's deployment jobs, newest first
    async fn list_jobs(
        &self,
        project_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<JobListResponse, ConsoleError>;

    /// Fetch a single job's fresh state by id
    async fn job_status(
        &self,
        project_id: &str,
        job_id: &str,
    ) -> Result<JobStatusResponse, ConsoleError>;

    /// Mark a job as the project's live deployment
    async fn activate_deployment(
        &self,
        project_id: &str,
        job_id: &str,
    ) -> Result<ActivateResponse, ConsoleError>;

    /// Fetch project metadata (carries `activeRev`)
    async fn get_project(&self, project_id: &str) -> Result<Project, ConsoleError>;
}

#[async_trait]
impl DeployApi for HttpClient {
    async fn list_jobs(
        &self,
        project_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<JobListResponse, ConsoleError> {
        let path = format!(
            "/projects/{}/jobs?page={}&limit={}",
            project_id, page, limit
        );
        self.get(&path).await
    }

    async fn job_status(
        &self,
        project_id: &str,
        job_id: &str,
    ) -> Result<JobStatusResponse, ConsoleError> {
        let path = format!("/projects/{}/jobs/{}", project_id, job_id);
        self.get(&path).await
    }

    async fn activate_deployment(
        &self,
        project_id: &str,
        job_id: &str,
    ) -> Result<ActivateResponse, ConsoleError> {
        let path = format!("/projects/{}/jobs/{}/activate", project_id, job_id);
        self.post(&path, &serde_json::json!({})).await
    }

    async fn get_project(&self, project_id: &str) -> Result<Project, ConsoleError> {
        self.fetch_project(project_id).await
    }
}
