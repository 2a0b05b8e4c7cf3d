use serde::{Deserialize, Deserializer, Serialize};

use crate::schedule::{format_timestamp, ONE_SHOT_MARKER, ONE_TIME_LABEL, PENDING_LABEL};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct JobId(pub String);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Start,
    Stop,
    Restart,
    Status,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Stop => "stop",
            Action::Restart => "restart",
            Action::Status => "status",
        }
    }

    /// Status queries are read-only and skip the confirmation prompt.
    pub fn requires_confirmation(&self) -> bool {
        !matches!(self, Action::Status)
    }

    pub fn is_schedulable(&self) -> bool {
        !matches!(self, Action::Status)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Action {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "start" => Ok(Action::Start),
            "stop" => Ok(Action::Stop),
            "restart" => Ok(Action::Restart),
            "status" => Ok(Action::Status),
            _ => Err(anyhow::anyhow!("Unknown action: {}", s)),
        }
    }
}

/// Positional job arguments as the backend stores them: `[action, servers, cluster_aware]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobArgs(pub String, pub Vec<String>, pub bool);

impl JobArgs {
    pub fn action(&self) -> &str {
        &self.0
    }

    pub fn servers(&self) -> &[String] {
        &self.1
    }

    pub fn cluster_aware(&self) -> bool {
        self.2
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Job {
    pub id: JobId,
    pub trigger: String,
    pub args: JobArgs,
    #[serde(default, deserialize_with = "absent_or_none")]
    pub next_run_time: Option<String>,
}

impl Job {
    pub fn is_one_shot(&self) -> bool {
        self.trigger.contains(ONE_SHOT_MARKER)
    }

    pub fn schedule_label(&self) -> String {
        if self.is_one_shot() {
            ONE_TIME_LABEL.to_string()
        } else {
            self.trigger.clone()
        }
    }

    pub fn next_run_label(&self) -> String {
        match &self.next_run_time {
            Some(raw) => format_timestamp(raw),
            None => PENDING_LABEL.to_string(),
        }
    }
}

// The backend stringifies a missing next run as "None".
fn absent_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_empty() && v != "None"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryStatus {
    Success,
    Skipped,
    Failure,
}

impl HistoryStatus {
    pub fn classify(status: &str) -> Self {
        match status {
            "SUCCESS" => HistoryStatus::Success,
            "SKIPPED" => HistoryStatus::Skipped,
            _ => HistoryStatus::Failure,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub action: String,
    #[serde(default)]
    pub targets: Vec<String>,
    pub status: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_aware: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub was: Option<String>,
}

impl HistoryEntry {
    pub fn outcome(&self) -> HistoryStatus {
        HistoryStatus::classify(&self.status)
    }

    pub fn timestamp_label(&self) -> String {
        format_timestamp(&self.timestamp)
    }
}
