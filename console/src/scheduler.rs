//! Client side of the job scheduler: the creation dialog, job creation and cancellation.

use common::{compose_daily_cron, Action, Clusters, CreateJobRequest, JobId};

use crate::api::{ApiError, ApiResult, Backend};
use crate::controller::Controller;
use crate::error::ConsoleError;
use crate::notifier::{Notice, Prompt};
use crate::poller::RefreshOrigin;

pub const EMPTY_SERVERS_ALERT: &str = "Please select at least one server.";
pub const DELETE_CONFIRMATION: &str = "Are you sure you want to delete this task?";

/// Contents of the job creation dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDraft {
    pub action: Action,
    pub servers: Vec<String>,
    pub hour: String,
    pub minute: String,
    pub cluster_aware: bool,
}

impl Default for JobDraft {
    fn default() -> Self {
        Self {
            action: Action::Start,
            servers: Vec::new(),
            hour: "00".to_string(),
            minute: "00".to_string(),
            cluster_aware: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Rejected before sending; the alert text.
    Invalid(String),
    Created(Option<String>),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deletion {
    Declined,
    Deleted,
    Failed,
}

fn creation_error(e: &ApiError) -> String {
    match e {
        ApiError::Status { detail: None, .. } => "Failed".to_string(),
        _ => e.user_message(),
    }
}

impl<B: Backend, P: Prompt> Controller<B, P> {
    /// Open a fresh dialog and return the servers it offers.
    pub fn open_job_dialog(&self) -> Vec<String> {
        self.with_state(|s| {
            s.job_dialog = Some(JobDraft::default());
            s.inventory.iter().map(|server| server.name.clone()).collect()
        })
    }

    pub fn close_job_dialog(&self) {
        self.with_state(|s| s.job_dialog = None);
    }

    pub async fn submit_job(&self, draft: JobDraft) -> Submission {
        if draft.servers.is_empty() {
            self.notify(Notice::alert(EMPTY_SERVERS_ALERT));
            return Submission::Invalid(EMPTY_SERVERS_ALERT.to_string());
        }
        if !draft.action.is_schedulable() {
            let message = ConsoleError::NotSchedulable(draft.action).to_string();
            self.notify(Notice::alert(message.clone()));
            return Submission::Invalid(message);
        }
        let cron = match compose_daily_cron(&draft.hour, &draft.minute) {
            Ok(cron) => cron,
            Err(e) => {
                let message = e.to_string();
                self.notify(Notice::alert(message.clone()));
                return Submission::Invalid(message);
            }
        };

        let was = self.with_state(|s| s.was.current().clone());
        let request = CreateJobRequest {
            action: draft.action,
            servers: draft.servers,
            cron,
            cluster_aware: draft.cluster_aware,
            was,
        };
        log::info!("Scheduling {} on {:?} at {:?}", request.action, request.servers, request.cron);

        match self.backend().create_job(&request).await {
            Ok(created) => {
                self.notify(Notice::success("Schedule created successfully"));
                self.close_job_dialog();
                let _ = self.refresh_jobs().await;
                let _ = self.refresh_inventory(RefreshOrigin::AfterCommand).await;
                Submission::Created(created.job_id)
            }
            Err(e) => {
                let message = creation_error(&e);
                log::error!("Failed to create job: {}", e);
                self.notify(Notice::alert(format!("Error creating schedule:\n{}", message)));
                Submission::Failed(message)
            }
        }
    }

    pub async fn delete_job(&self, id: &JobId) -> Deletion {
        if !self.prompt().confirm(DELETE_CONFIRMATION).await {
            return Deletion::Declined;
        }
        self.remove_job(id).await
    }

    /// Cancel a job the user already agreed to delete.
    pub async fn remove_job(&self, id: &JobId) -> Deletion {
        match self.backend().delete_job(id).await {
            Ok(()) => {
                self.notify(Notice::success("Job cancelled"));
                let _ = self.refresh_jobs().await;
                let _ = self.refresh_inventory(RefreshOrigin::AfterCommand).await;
                Deletion::Deleted
            }
            Err(e) => {
                log::error!("Failed to delete job {}: {}", id, e);
                self.notify(Notice::error("Failed to delete job"));
                Deletion::Failed
            }
        }
    }

    /// Cluster membership used by cluster-aware jobs.
    pub async fn clusters(&self) -> ApiResult<Clusters> {
        self.backend().clusters().await.map_err(|e| {
            self.notify(Notice::error(format!("Failed to load clusters: {}", e.user_message())));
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use common::ErrorDetail;
    use reqwest::StatusCode;

    use crate::notifier::Level;
    use crate::testing::{controller, sample_job, FakeBackend};

    use super::*;

    fn draft(servers: &[&str], hour: &str, minute: &str) -> JobDraft {
        JobDraft {
            action: Action::Start,
            servers: servers.iter().map(|s| s.to_string()).collect(),
            hour: hour.into(),
            minute: minute.into(),
            cluster_aware: false,
        }
    }

    fn fleet() -> FakeBackend {
        FakeBackend::default().with_servers("konetic", &[("web1", "RUNNING"), ("web2", "STOPPED")])
    }

    #[tokio::test]
    async fn submits_daily_cron_and_refreshes() {
        let (c, notices) = controller(fleet(), true);
        c.load().await;
        assert_eq!(c.open_job_dialog(), vec!["web1", "web2"]);
        c.backend().set_jobs(vec![sample_job("j1", "date[2024-01-02 03:30:00]")]);
        let lists_before = c.backend().list_calls().len();

        let mut d = draft(&["web1"], "03", "30");
        d.cluster_aware = true;
        let outcome = c.submit_job(d).await;

        assert_eq!(outcome, Submission::Created(Some("job-1".into())));
        let created = c.backend().created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].cron, "30 3 * * *");
        assert_eq!(created[0].servers, vec!["web1".to_string()]);
        assert!(created[0].cluster_aware);
        assert_eq!(created[0].was.as_str(), "konetic");

        c.with_state(|s| {
            assert!(s.job_dialog.is_none());
            assert_eq!(s.job_count(), 1);
        });
        assert_eq!(c.backend().list_calls().len(), lists_before + 1);
        assert_eq!(notices.all().last().map(|n| n.level), Some(Level::Success));
    }

    #[tokio::test]
    async fn empty_server_list_is_blocked_with_alert() {
        let (c, notices) = controller(fleet(), true);
        c.open_job_dialog();
        let outcome = c.submit_job(draft(&[], "03", "30")).await;
        assert_eq!(outcome, Submission::Invalid(EMPTY_SERVERS_ALERT.into()));
        assert!(c.backend().created().is_empty());
        assert_eq!(notices.all()[0].level, Level::Alert);
        c.with_state(|s| assert!(s.job_dialog.is_some()));
    }

    #[tokio::test]
    async fn out_of_range_time_is_blocked() {
        let (c, _) = controller(fleet(), true);
        let outcome = c.submit_job(draft(&["web1"], "25", "00")).await;
        assert!(matches!(outcome, Submission::Invalid(_)));
        assert!(c.backend().created().is_empty());
    }

    #[tokio::test]
    async fn status_cannot_be_scheduled() {
        let (c, _) = controller(fleet(), true);
        let mut d = draft(&["web1"], "03", "30");
        d.action = Action::Status;
        assert!(matches!(c.submit_job(d).await, Submission::Invalid(_)));
    }

    #[tokio::test]
    async fn field_errors_are_flattened_into_the_alert() {
        let fake = fleet();
        fake.reject_create(
            StatusCode::UNPROCESSABLE_ENTITY,
            serde_json::from_str::<ErrorDetail>(
                r#"[{"loc": ["body", "servers"], "msg": "field required"}]"#,
            )
            .ok(),
        );
        let (c, notices) = controller(fake, true);
        c.open_job_dialog();

        let outcome = c.submit_job(draft(&["web1"], "03", "30")).await;

        assert_eq!(outcome, Submission::Failed("servers: field required".into()));
        let alert = &notices.all()[0];
        assert_eq!(alert.level, Level::Alert);
        assert!(alert.message.contains("servers: field required"));
        c.with_state(|s| assert!(s.job_dialog.is_some()));
    }

    #[tokio::test]
    async fn string_detail_is_shown_directly_and_bare_status_is_generic() {
        let fake = fleet();
        fake.reject_create(
            StatusCode::BAD_REQUEST,
            Some(ErrorDetail::Message("invalid literal for int()".into())),
        );
        let (c, _) = controller(fake, true);
        let outcome = c.submit_job(draft(&["web1"], "03", "30")).await;
        assert_eq!(outcome, Submission::Failed("invalid literal for int()".into()));

        c.backend().reject_create(StatusCode::INTERNAL_SERVER_ERROR, None);
        let outcome = c.submit_job(draft(&["web1"], "03", "30")).await;
        assert_eq!(outcome, Submission::Failed("Failed".into()));
    }

    #[tokio::test]
    async fn delete_confirms_then_refreshes_jobs_and_inventory() {
        let fake = fleet().with_jobs(vec![sample_job("j1", "cron[hour='3']")]);
        let (c, notices) = controller(fake, true);
        c.load().await;
        c.backend().set_jobs(vec![]);
        let lists_before = c.backend().list_calls().len();

        let outcome = c.delete_job(&JobId("j1".into())).await;

        assert_eq!(outcome, Deletion::Deleted);
        assert_eq!(c.prompt().asked(), vec![DELETE_CONFIRMATION.to_string()]);
        assert_eq!(c.backend().deleted(), vec![JobId("j1".into())]);
        c.with_state(|s| assert_eq!(s.job_count(), 0));
        assert_eq!(c.backend().list_calls().len(), lists_before + 1);
        assert_eq!(notices.all()[0].message, "Job cancelled");
    }

    #[tokio::test]
    async fn declined_delete_does_nothing() {
        let (c, _) = controller(fleet(), false);
        assert_eq!(c.delete_job(&JobId("j1".into())).await, Deletion::Declined);
        assert!(c.backend().deleted().is_empty());
    }

    #[tokio::test]
    async fn remove_job_skips_the_prompt() {
        let (c, _) = controller(fleet(), false);
        assert_eq!(c.remove_job(&JobId("j1".into())).await, Deletion::Deleted);
        assert!(c.prompt().asked().is_empty());
        assert_eq!(c.backend().deleted(), vec![JobId("j1".into())]);
    }

    #[tokio::test]
    async fn failed_delete_is_generic() {
        let fake = fleet();
        fake.fail_delete(true);
        let (c, notices) = controller(fake, true);
        assert_eq!(c.delete_job(&JobId("j1".into())).await, Deletion::Failed);
        assert_eq!(notices.errors(), vec!["Failed to delete job".to_string()]);
    }
}
