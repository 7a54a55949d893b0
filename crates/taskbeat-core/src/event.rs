//! Canonical lifecycle event model and envelope normalizer.
//!
//! Inbound events arrive as CloudEvents-style envelopes:
//! `{ type, data: { task, userId, action?, changes? } }`. The event bus
//! tags events with namespaced type strings (`com.todo.task.created`),
//! while some publishers also set a short `action` field. All of that
//! string variety is translated here, in one place, into a closed enum.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TaskBeatError};

/// What happened to the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskAction {
    Created,
    Updated,
    Completed,
    Deleted,
    /// Unrecognized event type. Callers ignore these rather than
    /// failing the batch.
    Unknown,
}

impl TaskAction {
    /// Resolve from a namespaced event-type tag like `com.todo.task.created`.
    /// Only `…task.<action>` tags count; other entities stay unknown.
    fn from_type_tag(tag: &str) -> Option<Self> {
        let mut parts = tag.rsplit('.');
        let action = parts.next()?;
        if parts.next() != Some("task") {
            return None;
        }
        Self::from_short(action)
    }

    /// Resolve from a short action field like `CREATED`.
    fn from_short(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "created" => Some(Self::Created),
            "updated" => Some(Self::Updated),
            "completed" => Some(Self::Completed),
            "deleted" => Some(Self::Deleted),
            _ => None,
        }
    }
}

/// Snapshot of the task fields this service reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// Minutes before the due date at which the reminder fires.
    #[serde(default, alias = "reminder_offset")]
    pub reminder_offset_minutes: Option<i64>,
    #[serde(default)]
    pub recurrence_rule: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub status: String,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// One inbound lifecycle event, normalized. Consumed synchronously by
/// exactly one engine and then discarded — never persisted.
#[derive(Debug, Clone)]
pub struct TaskEvent {
    pub task_id: String,
    pub user_id: String,
    pub action: TaskAction,
    pub task: TaskSnapshot,
    /// Prior-state diff, when the publisher includes one. Only used to
    /// detect due-date removal.
    pub changes: Option<serde_json::Value>,
}

/// Convert a raw envelope into a [`TaskEvent`].
///
/// Fails with [`TaskBeatError::MalformedEvent`] when the task id or
/// user id cannot be determined; such events are logged and dropped,
/// never retried.
pub fn normalize(envelope: &serde_json::Value) -> Result<TaskEvent> {
    // Tolerate both a full envelope and a bare data payload.
    let data = envelope.get("data").unwrap_or(envelope);

    let task_value = data
        .get("task")
        .ok_or_else(|| TaskBeatError::malformed("envelope has no task"))?;
    let task: TaskSnapshot = serde_json::from_value(task_value.clone())
        .map_err(|e| TaskBeatError::malformed(format!("bad task snapshot: {e}")))?;
    if task.id.is_empty() {
        return Err(TaskBeatError::malformed("task id is empty"));
    }

    let user_id = data
        .get("userId")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| TaskBeatError::malformed("userId missing"))?
        .to_string();

    let action = envelope
        .get("type")
        .and_then(|v| v.as_str())
        .and_then(TaskAction::from_type_tag)
        .or_else(|| {
            data.get("action")
                .and_then(|v| v.as_str())
                .and_then(TaskAction::from_short)
        })
        .unwrap_or(TaskAction::Unknown);

    Ok(TaskEvent {
        task_id: task.id.clone(),
        user_id,
        action,
        task,
        changes: data.get("changes").cloned(),
    })
}
