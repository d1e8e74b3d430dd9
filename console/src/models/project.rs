//! Project models

use serde::{Deserialize, Serialize};

/// A project on the platform
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique project ID
    pub id: String,

    /// Display name
    pub name: String,

    /// Job id currently served as the live deployment
    #[serde(default)]
    pub active_rev: Option<String>,

    /// Linked source repository, if any
    #[serde(default)]
    pub repo: Option<RepoLink>,
}

/// Repository linkage metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoLink {
    pub provider: String,
    pub owner: String,
    pub name: String,

    #[serde(default)]
    pub default_branch: Option<String>,
}
