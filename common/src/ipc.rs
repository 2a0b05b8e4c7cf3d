use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::job::{Action, HistoryEntry, Job};
use crate::server::{Server, WasId};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerList {
    #[serde(default)]
    pub servers: Vec<Server>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionRequest {
    pub action: Action,
    pub servers: Vec<String>,
    pub was: WasId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub detail: Option<ErrorDetail>,
    #[serde(default)]
    pub returncode: Option<i32>,
}

impl ActionResult {
    /// Most specific failure text: stderr, then the backend detail, then a generic message.
    pub fn failure_message(&self) -> String {
        if let Some(stderr) = self.stderr.as_deref().filter(|s| !s.is_empty()) {
            return stderr.to_string();
        }
        if let Some(detail) = &self.detail {
            let msg = detail.message();
            if !msg.is_empty() {
                return msg;
            }
        }
        "Action failed".to_string()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobList {
    #[serde(default)]
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateJobRequest {
    pub action: Action,
    pub servers: Vec<String>,
    pub cron: String,
    pub cluster_aware: bool,
    pub was: WasId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatedJob {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub job_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryList {
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemTime {
    pub time: String,
}

/// Cluster name to member server names.
pub type Clusters = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReloadResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<ErrorDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldError {
    #[serde(default)]
    pub loc: Vec<serde_json::Value>,
    pub msg: String,
}

impl FieldError {
    fn field(&self) -> String {
        match self.loc.last() {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }
}

/// The `detail` member of a backend error body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Fields(Vec<FieldError>),
    Other(serde_json::Value),
}

impl ErrorDetail {
    pub fn message(&self) -> String {
        match self {
            ErrorDetail::Message(msg) => msg.clone(),
            ErrorDetail::Fields(errors) => errors
                .iter()
                .map(|e| format!("{}: {}", e.field(), e.msg))
                .collect::<Vec<_>>()
                .join("\n"),
            ErrorDetail::Other(value) => value.to_string(),
        }
    }
}

impl std::fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}
