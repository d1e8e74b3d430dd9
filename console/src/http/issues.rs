//! Deploy issue API client

use serde::Deserialize;

use crate::errors::ConsoleError;
use crate::http::client::HttpClient;
use crate::models::issue::DeployIssue;

/// Issue list response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct IssueListResponse {
    #[serde(default)]
    pub success: bool,
    pub issues: Vec<DeployIssue>,
}

impl HttpClient {
    /// Fetch the issues reported for one deployment job
    pub async fn fetch_issues(
        &self,
        project_id: &str,
        job_id: &str,
    ) -> Result<Vec<DeployIssue>, ConsoleError> {
        let path = format!("/projects/{}/jobs/{}/issues", project_id, job_id);
        let response: IssueListResponse = self.get(&path).await?;
        Ok(response.issues)
    }
}
