//! HTTP boundary to the container-manager backend.
//!
//! [`Backend`] is the seam the controller talks through; [`ApiClient`] is the
//! `reqwest` implementation used by both binaries.

use std::future::Future;
use std::time::Duration;

use common::{
    ActionRequest, ActionResult, Clusters, CreateJobRequest, CreatedJob, ErrorBody, ErrorDetail,
    HistoryEntry, HistoryList, Job, JobId, JobList, ReloadResult, Server, ServerList, SystemTime,
    WasId,
};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Network failure or a body that could not be read.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    /// Non-2xx answer, with the backend's `detail` when it sent one.
    #[error("HTTP {status}{}", .detail.as_ref().map(|d| format!(": {}", d)).unwrap_or_default())]
    Status {
        status: StatusCode,
        detail: Option<ErrorDetail>,
    },
    /// 2xx answer whose body did not match the expected shape.
    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn detail(&self) -> Option<&ErrorDetail> {
        match self {
            ApiError::Status { detail, .. } => detail.as_ref(),
            _ => None,
        }
    }

    /// Flattened backend detail when present, else the error's own text.
    pub fn user_message(&self) -> String {
        match self.detail() {
            Some(detail) => detail.message(),
            None => self.to_string(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Every endpoint the panel consumes.
pub trait Backend: Send + Sync + 'static {
    fn list_servers(&self, was: &WasId) -> impl Future<Output = ApiResult<Vec<Server>>> + Send;

    fn execute(&self, request: &ActionRequest) -> impl Future<Output = ApiResult<ActionResult>> + Send;

    fn list_jobs(&self) -> impl Future<Output = ApiResult<Vec<Job>>> + Send;

    fn create_job(&self, request: &CreateJobRequest) -> impl Future<Output = ApiResult<CreatedJob>> + Send;

    fn delete_job(&self, id: &JobId) -> impl Future<Output = ApiResult<()>> + Send;

    fn history(&self) -> impl Future<Output = ApiResult<Vec<HistoryEntry>>> + Send;

    fn system_time(&self) -> impl Future<Output = ApiResult<String>> + Send;

    fn clusters(&self) -> impl Future<Output = ApiResult<Clusters>> + Send;

    fn reload_config(&self) -> impl Future<Output = ApiResult<ReloadResult>> + Send;
}

pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ApiResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self.client.get(self.url(path)).send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let status = response.status();
    let body = response.bytes().await?;
    if !status.is_success() {
        return Err(status_error(status, &body));
    }
    Ok(serde_json::from_slice(&body)?)
}

fn status_error(status: StatusCode, body: &[u8]) -> ApiError {
    let detail = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail);
    ApiError::Status { status, detail }
}

impl Backend for ApiClient {
    async fn list_servers(&self, was: &WasId) -> ApiResult<Vec<Server>> {
        let response = self
            .client
            .get(self.url(common::CONTAINER_LIST_API))
            .query(&[("was", was.as_str())])
            .send()
            .await?;
        let list: ServerList = decode(response).await?;
        Ok(list.servers)
    }

    async fn execute(&self, request: &ActionRequest) -> ApiResult<ActionResult> {
        let response = self
            .client
            .post(self.url(common::CONTAINER_API))
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;
        // Error answers carry `{detail}`, which decodes as an unsuccessful result.
        match serde_json::from_slice::<ActionResult>(&body) {
            Ok(result) if status.is_success() || !result.success => Ok(result),
            Ok(_) => Err(status_error(status, &body)),
            Err(_) if !status.is_success() => Err(status_error(status, &body)),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_jobs(&self) -> ApiResult<Vec<Job>> {
        let list: JobList = self.get(common::JOBS_API).await?;
        Ok(list.jobs)
    }

    async fn create_job(&self, request: &CreateJobRequest) -> ApiResult<CreatedJob> {
        let response = self
            .client
            .post(self.url(common::JOBS_API))
            .json(request)
            .send()
            .await?;
        decode(response).await
    }

    async fn delete_job(&self, id: &JobId) -> ApiResult<()> {
        let url = self.url(&format!("{}/{}", common::JOBS_API, id));
        let response = self.client.delete(url).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.bytes().await?;
        Err(status_error(status, &body))
    }

    async fn history(&self) -> ApiResult<Vec<HistoryEntry>> {
        let list: HistoryList = self.get(common::HISTORY_API).await?;
        Ok(list.history)
    }

    async fn system_time(&self) -> ApiResult<String> {
        let time: SystemTime = self.get(common::TIME_API).await?;
        Ok(time.time)
    }

    async fn clusters(&self) -> ApiResult<Clusters> {
        self.get(common::CLUSTERS_API).await
    }

    async fn reload_config(&self) -> ApiResult<ReloadResult> {
        self.get(common::RELOAD_CONFIG_API).await
    }
}

#[cfg(test)]
mod tests {
    use common::Action;
    use mockito::{Matcher, Server as MockServer};

    use super::*;

    fn client(server: &MockServer) -> ApiClient {
        ApiClient::new(server.url(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn trailing_slash_is_dropped_from_base_url() {
        let mut server = MockServer::new_async().await;
        let mock = server
            .mock("GET", "/api/time")
            .with_status(200)
            .with_body(r#"{"time": "2024-01-01 03:30:00"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(format!("{}/", server.url()), Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), server.url());
        client.system_time().await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn lists_servers_for_the_requested_was() {
        let mut server = MockServer::new_async().await;
        let mock = server
            .mock("GET", "/api/container/list")
            .match_query(Matcher::UrlEncoded("was".into(), "konetic".into()))
            .with_status(200)
            .with_body(r#"{"servers": [{"name": "web1", "status": "RUNNING"}, {"name": "web2", "status": "STOPPED"}]}"#)
            .create_async()
            .await;

        let servers = client(&server).list_servers(&WasId::new("konetic")).await.unwrap();
        assert_eq!(servers, vec![Server::new("web1", "RUNNING"), Server::new("web2", "STOPPED")]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn list_failure_keeps_backend_detail() {
        let mut server = MockServer::new_async().await;
        server
            .mock("GET", "/api/container/list")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"detail": "WAS configuration for 'nope' not found."}"#)
            .create_async()
            .await;

        let err = client(&server).list_servers(&WasId::new("nope")).await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status, .. } if status == StatusCode::BAD_REQUEST));
        assert_eq!(err.user_message(), "WAS configuration for 'nope' not found.");
    }

    #[tokio::test]
    async fn execute_posts_action_body() {
        let mut server = MockServer::new_async().await;
        let mock = server
            .mock("POST", "/api/container")
            .match_body(Matcher::Json(serde_json::json!({
                "action": "restart", "servers": ["web2"], "was": "konetic"
            })))
            .with_status(200)
            .with_body(r#"{"success": true, "stdout": "ok", "stderr": "", "returncode": 0}"#)
            .create_async()
            .await;

        let request = ActionRequest {
            action: Action::Restart,
            servers: vec!["web2".into()],
            was: WasId::new("konetic"),
        };
        let result = client(&server).execute(&request).await.unwrap();
        assert!(result.success);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn execute_error_status_becomes_failed_result() {
        let mut server = MockServer::new_async().await;
        server
            .mock("POST", "/api/container")
            .with_status(500)
            .with_body(r#"{"detail": "manage_container.sh script not found."}"#)
            .create_async()
            .await;

        let request = ActionRequest {
            action: Action::Stop,
            servers: vec!["web1".into()],
            was: WasId::new("konetic"),
        };
        let result = client(&server).execute(&request).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.failure_message(), "manage_container.sh script not found.");
    }

    #[tokio::test]
    async fn create_job_validation_errors_are_structured() {
        let mut server = MockServer::new_async().await;
        server
            .mock("POST", "/api/jobs")
            .with_status(422)
            .with_body(r#"{"detail": [{"loc": ["body", "servers"], "msg": "field required"}]}"#)
            .create_async()
            .await;

        let request = CreateJobRequest {
            action: Action::Start,
            servers: vec![],
            cron: "30 3 * * *".into(),
            cluster_aware: false,
            was: WasId::new("konetic"),
        };
        let err = client(&server).create_job(&request).await.unwrap_err();
        assert_eq!(err.user_message(), "servers: field required");
    }

    #[tokio::test]
    async fn delete_job_maps_404() {
        let mut server = MockServer::new_async().await;
        server
            .mock("DELETE", "/api/jobs/deadbeef")
            .with_status(404)
            .with_body(r#"{"detail": "Job not found"}"#)
            .create_async()
            .await;

        let err = client(&server).delete_job(&JobId("deadbeef".into())).await.unwrap_err();
        assert_eq!(err.user_message(), "Job not found");
    }

    #[tokio::test]
    async fn reads_system_time_and_history() {
        let mut server = MockServer::new_async().await;
        server
            .mock("GET", "/api/time")
            .with_body(r#"{"time": "2024-01-01 12:00:00"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/api/jobs/history")
            .with_body(r#"{"history": [{"timestamp": "2024-01-01 03:30:00", "action": "start", "targets": ["web1"], "status": "SKIPPED", "detail": "No eligible servers to run."}]}"#)
            .create_async()
            .await;

        let api = client(&server);
        assert_eq!(api.system_time().await.unwrap(), "2024-01-01 12:00:00");
        let history = api.history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].targets, vec!["web1".to_string()]);
    }

    #[tokio::test]
    async fn garbage_body_is_a_decode_error() {
        let mut server = MockServer::new_async().await;
        server
            .mock("GET", "/api/jobs")
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let err = client(&server).list_jobs().await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
