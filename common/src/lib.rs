pub mod ipc;
pub mod job;
pub mod schedule;
pub mod server;

pub use ipc::{
    ActionRequest, ActionResult, Clusters, CreateJobRequest, CreatedJob, ErrorBody, ErrorDetail,
    FieldError, HistoryList, JobList, ReloadResult, ServerList, SystemTime,
};
pub use job::{Action, HistoryEntry, HistoryStatus, Job, JobArgs, JobId};
pub use schedule::{compose_daily_cron, parse_system_time, ONE_TIME_LABEL, PENDING_LABEL};
pub use server::{Server, StatusClass, WasId};

// Backend endpoints
pub const CONTAINER_API: &str = "/api/container";
pub const CONTAINER_LIST_API: &str = "/api/container/list";
pub const JOBS_API: &str = "/api/jobs";
pub const HISTORY_API: &str = "/api/jobs/history";
pub const TIME_API: &str = "/api/time";
pub const CLUSTERS_API: &str = "/api/clusters";
pub const RELOAD_CONFIG_API: &str = "/api/config/reload";

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_WAS: &str = "konetic";
/// WAS environments offered when no config lists them.
pub const DEFAULT_WAS_VARIANTS: &[&str] = &["konetic", "jeus"];

pub const DEFAULT_CONFIG_PATH: &str = "/etc/wasctl/config.yaml";
pub const DEFAULT_LOG_FILE: &str = "/var/log/wasctl/console.log";

// Fallback paths for non-root users. The local config is layered over the system one.
pub const USER_CONFIG_PATH: &str = "wasctl.yaml";
pub const USER_LOG_FILE: &str = "wasctl-console.log";
