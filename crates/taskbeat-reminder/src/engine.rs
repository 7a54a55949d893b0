//! Reminder engine — the only writer of reminder state.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use taskbeat_core::error::Result;
use taskbeat_core::event::TaskSnapshot;
use taskbeat_state::{ReminderRecord, ReminderStore};

/// Minutes before the due date when no offset is set on the task.
const DEFAULT_OFFSET_MINUTES: i64 = 15;

/// The sweep runs once a minute; the due window reaches back this far
/// so a poll that fires up to 59s late still catches every reminder.
const DUE_WINDOW_SECONDS: i64 = 60;

pub struct ReminderEngine {
    store: Arc<dyn ReminderStore>,
}

impl ReminderEngine {
    pub fn new(store: Arc<dyn ReminderStore>) -> Self {
        Self { store }
    }

    /// Schedule a reminder for a task.
    ///
    /// No-op when the task has no due date or the computed reminder
    /// time is not strictly in the future. Returns the persisted record
    /// when one was created.
    pub async fn schedule(
        &self,
        task: &TaskSnapshot,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ReminderRecord>> {
        let Some(due_date) = task.due_date else {
            tracing::debug!(task_id = %task.id, "Task has no due date, skipping reminder");
            return Ok(None);
        };

        let offset = task
            .reminder_offset_minutes
            .unwrap_or(DEFAULT_OFFSET_MINUTES);
        let reminder_time = due_date - Duration::minutes(offset);

        if reminder_time <= now {
            tracing::debug!(
                task_id = %task.id,
                %reminder_time,
                "Reminder time already passed, not scheduling"
            );
            return Ok(None);
        }

        let record = ReminderRecord {
            task_id: task.id.clone(),
            user_id: user_id.to_string(),
            title: task.title.clone(),
            due_date,
            reminder_time,
            scheduled: true,
        };
        self.store.save(record.clone()).await?;
        tracing::info!(task_id = %task.id, %reminder_time, "Scheduled reminder");
        Ok(Some(record))
    }

    /// Replace any existing reminder for the task with a fresh one.
    ///
    /// Always delete-then-recreate so derived fields can never go
    /// stale. Idempotent when no record exists.
    pub async fn reschedule(
        &self,
        task: &TaskSnapshot,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ReminderRecord>> {
        self.store.remove(&task.id).await?;
        self.schedule(task, user_id, now).await
    }

    /// Remove the reminder for a task. Idempotent.
    pub async fn cancel(&self, task_id: &str) -> Result<()> {
        self.store.remove(task_id).await?;
        tracing::info!(task_id = %task_id, "Cancelled reminder");
        Ok(())
    }

    /// Reminders whose fire time falls in the half-open window
    /// `(now - 60s, now]` and are still flagged scheduled.
    pub async fn due_reminders(&self, now: DateTime<Utc>) -> Result<Vec<ReminderRecord>> {
        let window_start = now - Duration::seconds(DUE_WINDOW_SECONDS);
        let due = self
            .store
            .list()
            .await?
            .into_iter()
            .filter(|r| r.scheduled && r.reminder_time > window_start && r.reminder_time <= now)
            .collect();
        Ok(due)
    }
}
