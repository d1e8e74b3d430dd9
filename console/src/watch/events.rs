//! Deployment update events

use crate::http::jobs::ActivateResponse;
use crate::models::job::{Job, JobStatus};

/// Notification sent to the hosting view when deployment state changes
#[derive(Debug, Clone)]
pub enum DeploymentUpdate {
    /// A polled status check observed a change. Edge-triggered: emitted once
    /// per observed change, never for an unchanged status.
    StatusChanged {
        job: Job,
        previous_status: JobStatus,
        new_status: JobStatus,
    },

    /// A deployment was manually activated
    Activated {
        job: Job,
        response: ActivateResponse,
    },
}
