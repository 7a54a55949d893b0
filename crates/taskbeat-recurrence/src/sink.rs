//! Task creation — outbound call to the task-management endpoint.

use std::time::Duration;

use async_trait::async_trait;
use taskbeat_core::config::DispatchConfig;
use taskbeat_core::error::{Result, TaskBeatError};

use crate::rule::NewTaskPayload;

/// Creation seam for next-occurrence tasks. Failures are returned to
/// the caller to log and move on — a missed recurrence is recoverable
/// by hand, not worth crashing over.
#[async_trait]
pub trait TaskSink: Send + Sync {
    /// Create the task for `user_id`, overriding any user field in the
    /// payload. Returns the created task as the endpoint reports it.
    async fn create(&self, payload: &NewTaskPayload, user_id: &str) -> Result<serde_json::Value>;
}

pub struct HttpTaskSink {
    endpoint: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl HttpTaskSink {
    pub fn new(config: &DispatchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TaskBeatError::config(format!("task sink client: {e}")))?;
        Ok(Self {
            endpoint: format!("{}/api/v1/tasks", config.api_url.trim_end_matches('/')),
            token: config.api_token.clone(),
            client,
        })
    }
}

#[async_trait]
impl TaskSink for HttpTaskSink {
    async fn create(&self, payload: &NewTaskPayload, user_id: &str) -> Result<serde_json::Value> {
        let mut body = serde_json::to_value(payload)?;
        // The owning user always wins over anything in the payload —
        // guards against cross-user task creation.
        body["user_id"] = serde_json::Value::String(user_id.to_string());

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| TaskBeatError::delivery(format!("task creation failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(TaskBeatError::delivery(format!(
                "task endpoint returned {status}: {text}"
            )));
        }

        let created: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| TaskBeatError::delivery(format!("task creation body: {e}")))?;
        tracing::info!(created_id = ?created.get("id"), "Created next recurring task");
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_built_from_api_url() {
        let sink = HttpTaskSink::new(&DispatchConfig {
            api_url: "http://chat-api:8000".into(),
            api_token: Some("secret".into()),
            timeout_secs: 10,
        })
        .unwrap();
        assert_eq!(sink.endpoint, "http://chat-api:8000/api/v1/tasks");
        assert_eq!(sink.token.as_deref(), Some("secret"));
    }
}
