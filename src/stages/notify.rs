use crate::core::config::TaskDefaults;
use crate::core::error::PipelineError;
use crate::core::executor::{RunResult, TaskState};
use crate::core::task::{RunContext, TaskAction};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

const STAGE: &str = "notify";

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &str) -> Result<(), PipelineError>;
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    channel: &'a str,
    text: &'a str,
}

/// Posts messages to a Slack incoming webhook.
pub struct SlackWebhookNotifier {
    webhook_url: String,
    channel: String,
}

impl SlackWebhookNotifier {
    pub fn new(webhook_url: &str, channel: &str) -> Self {
        SlackWebhookNotifier {
            webhook_url: webhook_url.to_string(),
            channel: channel.to_string(),
        }
    }
}

#[async_trait]
impl Notifier for SlackWebhookNotifier {
    async fn send(&self, message: &str) -> Result<(), PipelineError> {
        let client = reqwest::Client::builder()
            .user_agent("fxflow/0.1")
            .build()
            .map_err(|e| PipelineError::adapter(STAGE, e))?;
        let payload = WebhookPayload {
            channel: &self.channel,
            text: message,
        };

        let response = client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PipelineError::adapter(STAGE, format!("request error: {e}")))?;
        debug!(status = %response.status(), "Webhook responded");

        if !response.status().is_success() {
            return Err(PipelineError::adapter(
                STAGE,
                format!("HTTP error: {}", response.status()),
            ));
        }
        Ok(())
    }
}

/// Used when no webhook is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &str) -> Result<(), PipelineError> {
        info!(target: "fxflow::notify", "{message}");
        Ok(())
    }
}

pub fn success_message() -> String {
    concat!(
        ":tada: :confetti_ball: *Forex Data Pipeline Execution Completed Successfully!* :confetti_ball: :tada:\n",
        "> :heavy_check_mark: All tasks finished successfully without errors.\n",
        "> :chart_with_upwards_trend: The latest forex data has been processed and is now up-to-date.\n",
        "> :rocket: Great job team! Keep up the good work!\n",
        " \n",
    )
    .to_string()
}

pub fn failure_message(result: &RunResult, defaults: &TaskDefaults) -> String {
    let mut message = format!(
        ":rotating_light: *Forex Data Pipeline run for {} failed* :rotating_light:\n",
        result.scheduled_date
    );
    if let Some(task) = result.failed_task()
        && let TaskState::Failed { error } = &task.state
    {
        message.push_str(&format!(
            "> :x: Task `{}` failed after {} attempt(s): {}\n",
            task.id, task.attempts, error
        ));
    }
    let skipped = result
        .tasks
        .iter()
        .filter(|t| matches!(t.state, TaskState::Skipped { .. }))
        .count();
    message.push_str(&format!("> :fast_forward: {skipped} downstream task(s) skipped.\n"));
    message.push_str(&format!("> Owner: {}", defaults.owner));
    if let Some(email) = &defaults.email {
        message.push_str(&format!(" <{email}>"));
    }
    message.push('\n');
    message
}

/// The final task of the graph: reports success.
pub struct NotifyStage {
    notifier: Arc<dyn Notifier>,
}

impl NotifyStage {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        NotifyStage { notifier }
    }
}

#[async_trait]
impl TaskAction for NotifyStage {
    async fn execute(&self, _ctx: &RunContext) -> Result<(), PipelineError> {
        self.notifier.send(&success_message()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::executor::{RunStatus, TaskReport};
    use chrono::NaiveDate;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_webhook_posts_channel_and_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_json(serde_json::json!({
                "channel": "#monitoring",
                "text": success_message(),
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = SlackWebhookNotifier::new(&format!("{}/hook", server.uri()), "#monitoring");
        NotifyStage::new(Arc::new(notifier))
            .execute(&RunContext::for_test())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_webhook_error_status_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let notifier = SlackWebhookNotifier::new(&server.uri(), "#monitoring");
        let err = notifier.send("hello").await.unwrap_err();
        assert!(matches!(err, PipelineError::AdapterFailure { ref stage, .. } if stage == STAGE));
    }

    #[test]
    fn test_success_message_text() {
        let message = success_message();
        assert!(message.starts_with(":tada: :confetti_ball: *Forex Data Pipeline Execution"));
        assert!(message.contains("> :rocket: Great job team! Keep up the good work!\n"));
        assert_eq!(message.lines().count(), 5);
    }

    #[test]
    fn test_failure_message_names_failed_task() {
        let report = |id: &str, state: TaskState, attempts| TaskReport {
            id: id.to_string(),
            state,
            attempts,
            duration: Duration::ZERO,
        };
        let result = RunResult {
            run_id: "r1".to_string(),
            scheduled_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            status: RunStatus::Failed,
            tasks: vec![
                report("download_rates", TaskState::Failed { error: "boom".to_string() }, 4),
                report("bulk_copy", TaskState::Skipped { blocked_by: "download_rates".to_string() }, 0),
            ],
        };
        let defaults = TaskDefaults {
            email: Some("fx@example.com".to_string()),
            ..TaskDefaults::default()
        };

        let message = failure_message(&result, &defaults);
        assert!(message.contains("2024-01-02"));
        assert!(message.contains("`download_rates` failed after 4 attempt(s): boom"));
        assert!(message.contains("1 downstream task(s) skipped"));
        assert!(message.contains("Owner: fxflow <fx@example.com>"));
    }
}
