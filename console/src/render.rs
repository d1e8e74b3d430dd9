//! Terminal presentation helpers

use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};

use crate::models::issue::{DeployIssue, IssueGroup, IssueSeverity};
use crate::models::job::{Job, JobStatus};

/// Colored badge for a job status
pub fn status_badge(status: JobStatus) -> ColoredString {
    match status {
        JobStatus::Pending | JobStatus::Queued => status.as_str().yellow(),
        JobStatus::Running | JobStatus::InProgress => status.as_str().blue(),
        JobStatus::Completed => status.as_str().green(),
        JobStatus::Failed | JobStatus::Error => status.as_str().red(),
    }
}

/// Relative time for recent timestamps, absolute beyond a week.
///
/// Timestamps in the future render absolute.
pub fn relative_time(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = now.signed_duration_since(ts).num_seconds();

    if secs < 0 {
        return ts.format("%Y-%m-%d %H:%M").to_string();
    }

    match secs {
        0..=59 => "just now".to_string(),
        60..=3599 => format!("{}m ago", secs / 60),
        3600..=86_399 => format!("{}h ago", secs / 3600),
        86_400..=604_799 => format!("{}d ago", secs / 86_400),
        _ => ts.format("%Y-%m-%d %H:%M").to_string(),
    }
}

/// First eight characters of an id
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// One list row for a job
pub fn job_row(job: &Job, active_rev: Option<&str>, now: DateTime<Utc>) -> String {
    let label = job
        .input
        .as_ref()
        .and_then(|input| {
            input
                .commit_message
                .clone()
                .or_else(|| input.branch.clone())
        })
        .unwrap_or_default();

    let live = if active_rev == Some(job.id.as_str()) {
        format!(" {}", "live".green().bold())
    } else {
        String::new()
    };

    format!(
        "{}  {}  {}  {}{}",
        short_id(&job.id),
        status_badge(job.status),
        relative_time(job.created_at, now),
        label,
        live
    )
}

/// Inline error banner for a failed list load
pub fn error_banner(message: &str) -> String {
    format!(
        "{} {} (kept the previous list; will retry)",
        "error:".red().bold(),
        message
    )
}

/// Destructive message for a failed mutation
pub fn destructive(message: &str) -> String {
    format!("{} {}", "failed:".red().bold(), message)
}

/// Dimmed hint line
pub fn hint_line(message: &str) -> String {
    message.dimmed().to_string()
}

/// Coarse content classification for rendering file paths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Markdown,
    Image,
    Stylesheet,
    Script,
    Data,
    Other,
}

impl ContentKind {
    /// Classify by file extension, parsed once
    pub fn from_path(path: &str) -> Self {
        let ext = path
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "md" | "markdown" => ContentKind::Markdown,
            "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" => ContentKind::Image,
            "css" => ContentKind::Stylesheet,
            "js" | "mjs" | "ts" => ContentKind::Script,
            "json" | "yaml" | "yml" | "toml" | "csv" => ContentKind::Data,
            _ => ContentKind::Other,
        }
    }
}

/// Glyph for a content kind
pub fn content_glyph(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Markdown => "md",
        ContentKind::Image => "img",
        ContentKind::Stylesheet => "css",
        ContentKind::Script => "js",
        ContentKind::Data => "data",
        ContentKind::Other => "file",
    }
}

/// One line for a deployment issue
pub fn issue_line(issue: &DeployIssue) -> String {
    let severity = match issue.severity {
        IssueSeverity::Error => issue.severity.as_str().red(),
        IssueSeverity::Warning => issue.severity.as_str().yellow(),
        IssueSeverity::Info => issue.severity.as_str().dimmed(),
    };

    match &issue.file {
        Some(file) => format!(
            "  [{}] {} {}: {}",
            content_glyph(ContentKind::from_path(file)),
            severity,
            file,
            issue.message
        ),
        None => format!("  {} {}", severity, issue.message),
    }
}

/// Header line for an issue group
pub fn issue_group_header(group: &IssueGroup) -> String {
    let name = group.file.as_deref().unwrap_or("(project)");
    format!("{} ({} issues)", name.bold(), group.issues.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_time_buckets() {
        let now = Utc::now();

        assert_eq!(relative_time(now - chrono::Duration::seconds(5), now), "just now");
        assert_eq!(relative_time(now - chrono::Duration::minutes(4), now), "4m ago");
        assert_eq!(relative_time(now - chrono::Duration::hours(2), now), "2h ago");
        assert_eq!(relative_time(now - chrono::Duration::days(3), now), "3d ago");

        let old = now - chrono::Duration::days(30);
        assert_eq!(
            relative_time(old, now),
            old.format("%Y-%m-%d %H:%M").to_string()
        );
    }

    #[test]
    fn test_content_kind_from_path() {
        assert_eq!(ContentKind::from_path("docs/intro.md"), ContentKind::Markdown);
        assert_eq!(ContentKind::from_path("logo.PNG"), ContentKind::Image);
        assert_eq!(ContentKind::from_path("theme.css"), ContentKind::Stylesheet);
        assert_eq!(ContentKind::from_path("data.yaml"), ContentKind::Data);
        assert_eq!(ContentKind::from_path("Makefile"), ContentKind::Other);
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("abc123def456"), "abc123de");
        assert_eq!(short_id("ab"), "ab");
    }
}
