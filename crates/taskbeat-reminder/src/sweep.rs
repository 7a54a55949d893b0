//! Due-reminder sweep — the periodic deliver-then-cancel pass.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use taskbeat_core::error::Result;

use crate::engine::ReminderEngine;
use crate::notify::Notifier;

pub struct ReminderSweep {
    engine: Arc<ReminderEngine>,
    notifier: Arc<dyn Notifier>,
}

impl ReminderSweep {
    pub fn new(engine: Arc<ReminderEngine>, notifier: Arc<dyn Notifier>) -> Self {
        Self { engine, notifier }
    }

    /// One sweep pass: fetch due reminders, deliver each, cancel after
    /// a successful delivery. A failure on one reminder is logged and
    /// the rest of the batch still runs; the failed reminder stays in
    /// the store and is retried on the next pass. Returns the number
    /// delivered.
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<usize> {
        let due = self.engine.due_reminders(now).await?;
        if due.is_empty() {
            tracing::debug!("No due reminders");
            return Ok(0);
        }

        tracing::info!(count = due.len(), "Found due reminders");
        let mut delivered = 0;
        for reminder in due {
            match self.notifier.deliver(&reminder).await {
                Ok(()) => {
                    if let Err(e) = self.engine.cancel(&reminder.task_id).await {
                        tracing::error!(
                            task_id = %reminder.task_id,
                            "Delivered but failed to cancel reminder: {e}"
                        );
                        continue;
                    }
                    delivered += 1;
                }
                Err(e) => {
                    // Left scheduled: the next poll retries it.
                    tracing::error!(task_id = %reminder.task_id, "Failed to deliver reminder: {e}");
                }
            }
        }
        Ok(delivered)
    }

    /// Drive [`tick`](Self::tick) on a fixed cadence. Ticks that would
    /// fire while a slow pass is still running are skipped to the next
    /// boundary; the deliver-then-cancel ordering keeps overlapping
    /// passes across process instances safe (at worst a duplicate
    /// delivery, never a lost one).
    pub async fn run(&self, poll_interval_secs: u64) {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(poll_interval_secs));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            if let Err(e) = self.tick(Utc::now()).await {
                tracing::error!("Reminder sweep failed: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use taskbeat_core::error::TaskBeatError;
    use taskbeat_core::event::TaskSnapshot;
    use taskbeat_state::memory::MemoryReminderStore;
    use taskbeat_state::ReminderRecord;

    /// Records deliveries; fails for one configured task id.
    #[derive(Default)]
    struct RecordingNotifier {
        delivered: Mutex<Vec<String>>,
        fail_for: Option<String>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn deliver(&self, reminder: &ReminderRecord) -> Result<()> {
            if self.fail_for.as_deref() == Some(reminder.task_id.as_str()) {
                return Err(TaskBeatError::delivery("endpoint down"));
            }
            self.delivered
                .lock()
                .expect("lock")
                .push(reminder.task_id.clone());
            Ok(())
        }
    }

    fn task(id: &str, due_date: &str) -> TaskSnapshot {
        TaskSnapshot {
            id: id.into(),
            title: "Water plants".into(),
            description: None,
            due_date: Some(due_date.parse().unwrap()),
            reminder_offset_minutes: None,
            recurrence_rule: None,
            priority: None,
            category: None,
            status: "pending".into(),
            completed_at: None,
            updated_at: "2024-01-01T00:00:00Z".parse().unwrap(),
        }
    }

    async fn setup(
        fail_for: Option<&str>,
    ) -> (Arc<ReminderEngine>, Arc<RecordingNotifier>, ReminderSweep) {
        let engine = Arc::new(ReminderEngine::new(Arc::new(MemoryReminderStore::new())));
        let notifier = Arc::new(RecordingNotifier {
            delivered: Mutex::new(vec![]),
            fail_for: fail_for.map(String::from),
        });
        let sweep = ReminderSweep::new(engine.clone(), notifier.clone());
        (engine, notifier, sweep)
    }

    #[tokio::test]
    async fn test_tick_delivers_and_cancels() {
        let (engine, notifier, sweep) = setup(None).await;
        let scheduled_at = "2024-06-01T09:00:00Z".parse().unwrap();
        engine
            .schedule(&task("t-1", "2024-06-01T10:15:00Z"), "u-1", scheduled_at)
            .await
            .unwrap();

        let now = "2024-06-01T10:00:30Z".parse().unwrap();
        let delivered = sweep.tick(now).await.unwrap();

        assert_eq!(delivered, 1);
        assert_eq!(*notifier.delivered.lock().expect("lock"), vec!["t-1"]);
        // Delivered reminder is gone; a second tick redelivers nothing.
        assert_eq!(sweep.tick(now).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_tick_isolates_per_reminder_failures() {
        let (engine, notifier, sweep) = setup(Some("t-bad")).await;
        let scheduled_at = "2024-06-01T09:00:00Z".parse().unwrap();
        engine
            .schedule(&task("t-bad", "2024-06-01T10:15:00Z"), "u-1", scheduled_at)
            .await
            .unwrap();
        engine
            .schedule(&task("t-good", "2024-06-01T10:15:00Z"), "u-1", scheduled_at)
            .await
            .unwrap();

        let now = "2024-06-01T10:00:30Z".parse().unwrap();
        let delivered = sweep.tick(now).await.unwrap();

        // The good reminder went out despite the bad one failing.
        assert_eq!(delivered, 1);
        assert_eq!(*notifier.delivered.lock().expect("lock"), vec!["t-good"]);
        // The failed reminder is still scheduled for the next poll.
        let remaining = engine.due_reminders(now).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].task_id, "t-bad");
    }

    #[tokio::test]
    async fn test_tick_with_nothing_due() {
        let (_, notifier, sweep) = setup(None).await;
        let now = "2024-06-01T10:00:00Z".parse().unwrap();
        assert_eq!(sweep.tick(now).await.unwrap(), 0);
        assert!(notifier.delivered.lock().expect("lock").is_empty());
    }
}
