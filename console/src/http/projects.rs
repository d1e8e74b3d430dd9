//! Project API client

use serde::Deserialize;

use crate::errors::ConsoleError;
use crate::http::client::HttpClient;
use crate::models::project::Project;

/// Project response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectResponse {
    #[serde(default)]
    pub success: bool,
    pub project: Project,
}

impl HttpClient {
    /// Fetch project metadata
    pub async fn fetch_project(&self, project_id: &str) -> Result<Project, ConsoleError> {
        let path = format!("/projects/{}", project_id);
        let response: ProjectResponse = self.get(&path).await?;
        Ok(response.project)
    }
}
