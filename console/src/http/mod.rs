pub mod client;
pub mod issues;
pub mod jobs;
pub mod projects;
