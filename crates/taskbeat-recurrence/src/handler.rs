//! Task-completion handler — regenerates recurring tasks.

use std::sync::Arc;

use taskbeat_core::error::{Result, TaskBeatError};
use taskbeat_core::event::TaskEvent;

use crate::rule::{next_task, RecurrenceRule};
use crate::sink::TaskSink;

pub struct CompletionHandler {
    sink: Arc<dyn TaskSink>,
}

impl CompletionHandler {
    pub fn new(sink: Arc<dyn TaskSink>) -> Self {
        Self { sink }
    }

    /// Handle a completed task. Non-recurring tasks and exhausted rules
    /// are normal no-ops; an invalid rule is a validation error the
    /// caller reports without retrying (bad data never fixes itself).
    pub async fn handle(&self, event: &TaskEvent) -> Result<()> {
        let task = &event.task;
        let Some(rule_str) = task.recurrence_rule.as_deref() else {
            tracing::debug!(task_id = %task.id, "No recurrence rule, skipping");
            return Ok(());
        };

        let rule = RecurrenceRule::parse(rule_str).map_err(|e| {
            TaskBeatError::validation(format!(
                "invalid recurrence rule for task {}: {e}",
                task.id
            ))
        })?;

        // Prefer the actual completion timestamp; fall back to
        // last-modified when the publisher omitted it.
        let last = task.completed_at.unwrap_or(task.updated_at);

        let Some(next_due) = rule.next_occurrence(last) else {
            tracing::info!(task_id = %task.id, "Recurrence rule exhausted, no further occurrences");
            return Ok(());
        };
        tracing::info!(task_id = %task.id, %next_due, "Calculated next occurrence");

        let payload = next_task(task, &rule, next_due);
        let created = self.sink.create(&payload, &event.user_id).await?;
        tracing::info!(
            task_id = %task.id,
            created_id = ?created.get("id"),
            "Created next occurrence"
        );
        Ok(())
    }
}
