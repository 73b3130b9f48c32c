use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildState {
    Success,
    Failed,
    Started,
    Canceled,
    Unknown,
}

impl BuildState {
    pub fn from_circle(status: &str) -> Self {
        match status {
            "success" | "fixed" => Self::Success,
            "failed" | "failing" | "infrastructure_fail" | "timedout" | "no_tests" => Self::Failed,
            "running" | "queued" | "scheduled" | "not_running" => Self::Started,
            "canceled" => Self::Canceled,
            _ => Self::Unknown,
        }
    }

    pub fn from_travis(state: &str) -> Self {
        match state {
            "passed" | "success" => Self::Success,
            "failed" | "errored" => Self::Failed,
            "created" | "received" | "queued" | "started" => Self::Started,
            "canceled" => Self::Canceled,
            _ => Self::Unknown,
        }
    }
}

/// Commit behind a build. Services rarely report all three fields, so any
/// of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Commit {
    pub created: Option<DateTime<Utc>>,
    pub author: Option<String>,
    pub hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Build {
    pub repository: String,
    pub branch: String,
    pub started: Option<DateTime<Utc>>,
    pub state: BuildState,
    pub commit: Commit,
}
