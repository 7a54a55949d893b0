//! Notification delivery — outbound call to the notification endpoint.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use taskbeat_core::config::DispatchConfig;
use taskbeat_core::error::{Result, TaskBeatError};
use taskbeat_state::ReminderRecord;

/// Delivery seam. A failed delivery leaves the reminder in place so the
/// next poll retries it; implementations therefore see at-least-once
/// semantics and receivers should dedupe by `taskId` + `reminderTime`.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, reminder: &ReminderRecord) -> Result<()>;
}

pub struct HttpNotifier {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpNotifier {
    pub fn new(config: &DispatchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TaskBeatError::config(format!("notifier client: {e}")))?;
        Ok(Self {
            endpoint: format!("{}/api/v1/notifications", config.api_url.trim_end_matches('/')),
            client,
        })
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn deliver(&self, reminder: &ReminderRecord) -> Result<()> {
        let payload = serde_json::json!({
            "userId": reminder.user_id,
            "taskId": reminder.task_id,
            "title": format!("Reminder: {}", reminder.title),
            "message": format!("Your task \"{}\" is due soon!", reminder.title),
            "timestamp": Utc::now().to_rfc3339(),
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| TaskBeatError::delivery(format!("notification send failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(TaskBeatError::delivery(format!(
                "notification endpoint returned {status}: {text}"
            )));
        }

        tracing::info!(task_id = %reminder.task_id, "Delivered reminder notification");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_built_from_api_url() {
        let notifier = HttpNotifier::new(&DispatchConfig {
            api_url: "http://chat-api:8000/".into(),
            api_token: None,
            timeout_secs: 10,
        })
        .unwrap();
        assert_eq!(notifier.endpoint, "http://chat-api:8000/api/v1/notifications");
    }
}
