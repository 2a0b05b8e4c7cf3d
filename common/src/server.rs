use serde::{Deserialize, Serialize};

/// Identifier of a WAS environment, e.g. `konetic`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct WasId(pub String);

impl WasId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for WasId {
    fn default() -> Self {
        Self(crate::DEFAULT_WAS.to_string())
    }
}

impl std::fmt::Display for WasId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Server {
    pub name: String,
    pub status: String,
}

impl Server {
    pub fn new(name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: status.into(),
        }
    }

    pub fn class(&self) -> StatusClass {
        StatusClass::classify(&self.status)
    }
}

/// Display bucket for a free-form status string. Never used to gate actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Running,
    Shutdown,
    Stopped,
    Unknown,
}

impl StatusClass {
    pub fn classify(status: &str) -> Self {
        let status = status.to_uppercase();
        if status.contains("RUNNING") {
            StatusClass::Running
        } else if status.contains("SHUTDOWN") {
            StatusClass::Shutdown
        } else if status.contains("STOPPED") {
            StatusClass::Stopped
        } else {
            StatusClass::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusClass::Running => "running",
            StatusClass::Shutdown => "shutdown",
            StatusClass::Stopped => "stopped",
            StatusClass::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for StatusClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
