//! In-memory reminder store — tests and single-process local runs.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use taskbeat_core::error::{Result, TaskBeatError};

use crate::{ReminderRecord, ReminderStore};

#[derive(Default)]
pub struct MemoryReminderStore {
    records: Mutex<HashMap<String, ReminderRecord>>,
}

impl MemoryReminderStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, ReminderRecord>>> {
        self.records
            .lock()
            .map_err(|e| TaskBeatError::state(e.to_string()))
    }
}

#[async_trait]
impl ReminderStore for MemoryReminderStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn save(&self, record: ReminderRecord) -> Result<()> {
        self.lock()?.insert(record.task_id.clone(), record);
        Ok(())
    }

    async fn get(&self, task_id: &str) -> Result<Option<ReminderRecord>> {
        Ok(self.lock()?.get(task_id).cloned())
    }

    async fn remove(&self, task_id: &str) -> Result<()> {
        self.lock()?.remove(task_id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ReminderRecord>> {
        Ok(self.lock()?.values().cloned().collect())
    }
}
