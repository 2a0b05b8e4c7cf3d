//! In-memory collaborators for controller tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use common::{
    ActionRequest, ActionResult, Clusters, CreateJobRequest, CreatedJob, ErrorDetail,
    HistoryEntry, Job, JobArgs, JobId, ReloadResult, Server, WasId,
};
use reqwest::StatusCode;
use tokio::sync::Notify;

use crate::api::{ApiError, ApiResult, Backend};
use crate::config::SelectionPolicy;
use crate::controller::Controller;
use crate::notifier::{Level, Notice, Notifier, Prompt};
use crate::state::AppState;
use crate::was::WasContext;

fn unavailable() -> ApiError {
    ApiError::Status {
        status: StatusCode::SERVICE_UNAVAILABLE,
        detail: None,
    }
}

#[derive(Default)]
struct Inner {
    servers: HashMap<String, Vec<Server>>,
    jobs: Vec<Job>,
    history: Vec<HistoryEntry>,
    time: Option<String>,
    action_result: Option<ActionResult>,
    create_rejection: Option<(StatusCode, Option<ErrorDetail>)>,
    fail_list: bool,
    fail_jobs: bool,
    fail_execute: bool,
    fail_delete: bool,
    holds: HashMap<String, Arc<Notify>>,
    execute_hold: Option<Arc<Notify>>,

    calls: Vec<&'static str>,
    list_calls: Vec<String>,
    executed: Vec<ActionRequest>,
    created: Vec<CreateJobRequest>,
    deleted: Vec<JobId>,
}

/// Scriptable [`Backend`] that records every request.
#[derive(Default)]
pub struct FakeBackend {
    inner: Mutex<Inner>,
}

impl FakeBackend {
    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    pub fn with_servers(self, was: &str, servers: &[(&str, &str)]) -> Self {
        self.set_servers(was, servers);
        self
    }

    pub fn with_jobs(self, jobs: Vec<Job>) -> Self {
        self.set_jobs(jobs);
        self
    }

    pub fn with_history(self, history: Vec<HistoryEntry>) -> Self {
        self.lock().history = history;
        self
    }

    pub fn with_time(self, time: &str) -> Self {
        self.set_time(Some(time.to_string()));
        self
    }

    pub fn with_action_result(self, result: ActionResult) -> Self {
        self.set_action_result(result);
        self
    }

    pub fn set_servers(&self, was: &str, servers: &[(&str, &str)]) {
        let servers = servers.iter().map(|(n, s)| Server::new(*n, *s)).collect();
        self.lock().servers.insert(was.to_string(), servers);
    }

    pub fn set_jobs(&self, jobs: Vec<Job>) {
        self.lock().jobs = jobs;
    }

    pub fn set_time(&self, time: Option<String>) {
        self.lock().time = time;
    }

    pub fn set_action_result(&self, result: ActionResult) {
        self.lock().action_result = Some(result);
    }

    pub fn reject_create(&self, status: StatusCode, detail: Option<ErrorDetail>) {
        self.lock().create_rejection = Some((status, detail));
    }

    pub fn fail_list(&self, fail: bool) {
        self.lock().fail_list = fail;
    }

    pub fn fail_jobs(&self, fail: bool) {
        self.lock().fail_jobs = fail;
    }

    pub fn fail_execute(&self, fail: bool) {
        self.lock().fail_execute = fail;
    }

    pub fn fail_delete(&self, fail: bool) {
        self.lock().fail_delete = fail;
    }

    /// Park the next inventory request for `was` until the returned handle is notified.
    pub fn hold_next_list(&self, was: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.lock().holds.insert(was.to_string(), notify.clone());
        notify
    }

    /// Park the next action request until the returned handle is notified.
    pub fn hold_next_execute(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.lock().execute_hold = Some(notify.clone());
        notify
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.lock().calls.clone()
    }

    pub fn list_calls(&self) -> Vec<String> {
        self.lock().list_calls.clone()
    }

    pub fn executed(&self) -> Vec<ActionRequest> {
        self.lock().executed.clone()
    }

    pub fn created(&self) -> Vec<CreateJobRequest> {
        self.lock().created.clone()
    }

    pub fn deleted(&self) -> Vec<JobId> {
        self.lock().deleted.clone()
    }
}

impl Backend for FakeBackend {
    async fn list_servers(&self, was: &WasId) -> ApiResult<Vec<Server>> {
        let hold = {
            let mut inner = self.lock();
            inner.calls.push("list");
            inner.list_calls.push(was.to_string());
            inner.holds.remove(was.as_str())
        };
        if let Some(hold) = hold {
            hold.notified().await;
        }
        let inner = self.lock();
        if inner.fail_list {
            return Err(unavailable());
        }
        Ok(inner.servers.get(was.as_str()).cloned().unwrap_or_default())
    }

    async fn execute(&self, request: &ActionRequest) -> ApiResult<ActionResult> {
        let hold = {
            let mut inner = self.lock();
            inner.calls.push("execute");
            inner.execute_hold.take()
        };
        if let Some(hold) = hold {
            hold.notified().await;
        }
        let mut inner = self.lock();
        if inner.fail_execute {
            return Err(unavailable());
        }
        inner.executed.push(request.clone());
        Ok(inner.action_result.clone().unwrap_or(ActionResult {
            success: true,
            ..ActionResult::default()
        }))
    }

    async fn list_jobs(&self) -> ApiResult<Vec<Job>> {
        let mut inner = self.lock();
        inner.calls.push("jobs");
        if inner.fail_jobs {
            return Err(unavailable());
        }
        Ok(inner.jobs.clone())
    }

    async fn create_job(&self, request: &CreateJobRequest) -> ApiResult<CreatedJob> {
        let mut inner = self.lock();
        inner.calls.push("create");
        if let Some((status, detail)) = inner.create_rejection.clone() {
            return Err(ApiError::Status { status, detail });
        }
        inner.created.push(request.clone());
        Ok(CreatedJob {
            success: true,
            job_id: Some(format!("job-{}", inner.created.len())),
        })
    }

    async fn delete_job(&self, id: &JobId) -> ApiResult<()> {
        let mut inner = self.lock();
        inner.calls.push("delete");
        if inner.fail_delete {
            return Err(ApiError::Status {
                status: StatusCode::NOT_FOUND,
                detail: Some(ErrorDetail::Message("Job not found".into())),
            });
        }
        inner.deleted.push(id.clone());
        Ok(())
    }

    async fn history(&self) -> ApiResult<Vec<HistoryEntry>> {
        let mut inner = self.lock();
        inner.calls.push("history");
        Ok(inner.history.clone())
    }

    async fn system_time(&self) -> ApiResult<String> {
        let mut inner = self.lock();
        inner.calls.push("time");
        inner.time.clone().ok_or_else(unavailable)
    }

    async fn clusters(&self) -> ApiResult<Clusters> {
        let mut inner = self.lock();
        inner.calls.push("clusters");
        let mut clusters = Clusters::new();
        clusters.insert("web".into(), vec!["web1".into(), "web2".into()]);
        Ok(clusters)
    }

    async fn reload_config(&self) -> ApiResult<ReloadResult> {
        let mut inner = self.lock();
        inner.calls.push("reload");
        Ok(ReloadResult { success: true, count: 2 })
    }
}

/// Collects every notice.
#[derive(Default)]
pub struct Notices(Mutex<Vec<Notice>>);

impl Notices {
    pub fn all(&self) -> Vec<Notice> {
        self.0.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.all()
            .into_iter()
            .filter(|n| n.level == Level::Error)
            .map(|n| n.message)
            .collect()
    }
}

impl Notifier for Notices {
    fn notify(&self, notice: Notice) {
        self.0.lock().unwrap().push(notice);
    }
}

/// Gives the same answer to every prompt and remembers the questions.
pub struct ScriptedPrompt {
    answer: bool,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

impl Prompt for ScriptedPrompt {
    async fn confirm(&self, message: &str) -> bool {
        self.asked.lock().unwrap().push(message.to_string());
        self.answer
    }
}

/// Controller over `backend` with WAS variants `konetic` (active) and `jeus`.
pub fn controller(
    backend: FakeBackend,
    answer: bool,
) -> (Controller<FakeBackend, ScriptedPrompt>, Arc<Notices>) {
    let was = WasContext::new(WasId::new("konetic"), vec![WasId::new("jeus")]);
    let state = AppState::new(was, SelectionPolicy::Sticky);
    let notices = Arc::new(Notices::default());
    let c = Controller::new(state, backend, ScriptedPrompt::new(answer), notices.clone());
    (c, notices)
}

pub fn sample_job(id: &str, trigger: &str) -> Job {
    Job {
        id: JobId(id.into()),
        trigger: trigger.into(),
        args: JobArgs("start".into(), vec!["web1".into()], false),
        next_run_time: None,
    }
}

pub fn sample_history(status: &str) -> HistoryEntry {
    HistoryEntry {
        timestamp: "2024-01-01 03:30:00".into(),
        action: "start".into(),
        targets: vec!["web1".into()],
        status: status.into(),
        detail: String::new(),
        id: None,
        job_id: None,
        cluster_aware: None,
        was: None,
    }
}
