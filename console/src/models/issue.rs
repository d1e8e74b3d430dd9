//! Deployment issue models and grouping

use serde::{Deserialize, Serialize};

/// Issue severity, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IssueSeverity {
    Error,
    Warning,
    Info,
}

impl IssueSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueSeverity::Error => "error",
            IssueSeverity::Warning => "warning",
            IssueSeverity::Info => "info",
        }
    }
}

impl std::str::FromStr for IssueSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(IssueSeverity::Error),
            "warning" | "warn" => Ok(IssueSeverity::Warning),
            "info" => Ok(IssueSeverity::Info),
            _ => Err(format!("Unknown issue severity: {}", s)),
        }
    }
}

impl Serialize for IssueSeverity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for IssueSeverity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A single issue reported for a deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployIssue {
    pub severity: IssueSeverity,

    /// Source file the issue points at; absent for project-level issues
    #[serde(default)]
    pub file: Option<String>,

    pub message: String,

    /// Rule or check that produced the issue
    #[serde(default)]
    pub rule: Option<String>,
}

/// Issues for one file, ordered most severe first
#[derive(Debug, Clone)]
pub struct IssueGroup {
    /// File path, or `None` for project-level issues
    pub file: Option<String>,
    pub issues: Vec<DeployIssue>,
}

impl IssueGroup {
    pub fn worst_severity(&self) -> Option<IssueSeverity> {
        self.issues.iter().map(|i| i.severity).min()
    }
}

/// Keep only issues at or above the given severity
pub fn filter_by_severity(issues: &[DeployIssue], min: IssueSeverity) -> Vec<DeployIssue> {
    issues
        .iter()
        .filter(|i| i.severity <= min)
        .cloned()
        .collect()
}

/// Group issues by file.
///
/// Groups are ordered worst severity first, then by path; project-level
/// issues (no file) sort ahead of file-scoped ones of equal severity.
/// Within a group, issues keep severity order.
pub fn group_by_file(issues: &[DeployIssue]) -> Vec<IssueGroup> {
    let mut groups: Vec<IssueGroup> = Vec::new();

    for issue in issues {
        match groups.iter_mut().find(|g| g.file == issue.file) {
            Some(group) => group.issues.push(issue.clone()),
            None => groups.push(IssueGroup {
                file: issue.file.clone(),
                issues: vec![issue.clone()],
            }),
        }
    }

    for group in &mut groups {
        group.issues.sort_by_key(|i| i.severity);
    }

    groups.sort_by(|a, b| {
        a.worst_severity()
            .cmp(&b.worst_severity())
            .then_with(|| a.file.cmp(&b.file))
    });

    groups
}
