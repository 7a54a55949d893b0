//! HTTP reminder store — Dapr-style state API over a sidecar.
//!
//! The underlying store is plain key/value with no native scan, so a
//! secondary index key holds the set of live task ids. `save` and
//! `remove` keep the index current; `list` reads the index and bulk-gets
//! its members. Index updates are whole-value replaces keyed alongside
//! the records; last writer wins, which is acceptable for derived,
//! recomputable reminder state.

use async_trait::async_trait;
use taskbeat_core::config::StateStoreConfig;
use taskbeat_core::error::{Result, TaskBeatError};

use crate::{ReminderRecord, ReminderStore};

const INDEX_KEY: &str = "reminder-index";
const BULK_PARALLELISM: u32 = 10;

pub struct HttpReminderStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpReminderStore {
    pub fn new(config: &StateStoreConfig) -> Self {
        Self {
            base_url: format!(
                "{}/{}",
                config.url.trim_end_matches('/'),
                config.store_name
            ),
            client: reqwest::Client::new(),
        }
    }

    fn record_key(task_id: &str) -> String {
        format!("reminder-{task_id}")
    }

    fn key_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(key))
    }

    async fn put(&self, key: &str, value: serde_json::Value) -> Result<()> {
        let body = serde_json::json!([{ "key": key, "value": value }]);
        let resp = self
            .client
            .post(&self.base_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| TaskBeatError::state(format!("state put failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(TaskBeatError::state(format!(
                "state put returned {}",
                resp.status()
            )));
        }
        Ok(())
    }

    async fn fetch(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let resp = self
            .client
            .get(self.key_url(key))
            .send()
            .await
            .map_err(|e| TaskBeatError::state(format!("state get failed: {e}")))?;

        // Missing key is "not found", not an error.
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(TaskBeatError::state(format!(
                "state get returned {}",
                resp.status()
            )));
        }
        let body = resp
            .bytes()
            .await
            .map_err(|e| TaskBeatError::state(format!("state get body: {e}")))?;
        if body.is_empty() {
            return Ok(None);
        }
        let value = serde_json::from_slice(&body)?;
        Ok(Some(value))
    }

    async fn read_index(&self) -> Result<Vec<String>> {
        match self.fetch(INDEX_KEY).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    async fn write_index(&self, task_ids: Vec<String>) -> Result<()> {
        self.put(INDEX_KEY, serde_json::json!(task_ids)).await
    }

    async fn index_add(&self, task_id: &str) -> Result<()> {
        let ids = self.read_index().await?;
        if let Some(ids) = index_with(ids, task_id) {
            self.write_index(ids).await?;
        }
        Ok(())
    }

    async fn index_remove(&self, task_id: &str) -> Result<()> {
        let ids = self.read_index().await?;
        if let Some(ids) = index_without(ids, task_id) {
            self.write_index(ids).await?;
        }
        Ok(())
    }
}

/// Index with `task_id` added, or `None` when it was already present
/// (no write needed).
fn index_with(mut ids: Vec<String>, task_id: &str) -> Option<Vec<String>> {
    if ids.iter().any(|id| id == task_id) {
        return None;
    }
    ids.push(task_id.to_string());
    Some(ids)
}

/// Index with `task_id` removed, or `None` when it was absent.
fn index_without(mut ids: Vec<String>, task_id: &str) -> Option<Vec<String>> {
    let before = ids.len();
    ids.retain(|id| id != task_id);
    if ids.len() == before {
        return None;
    }
    Some(ids)
}

/// Decode a bulk-get response. Index entries can go stale between the
/// index read and the bulk get; misses and undecodable values are
/// skipped instead of failing the sweep.
fn decode_bulk_items(items: Vec<serde_json::Value>) -> Vec<ReminderRecord> {
    let mut records = Vec::with_capacity(items.len());
    for item in items {
        let Some(data) = item.get("data").filter(|d| !d.is_null()) else {
            continue;
        };
        match serde_json::from_value::<ReminderRecord>(data.clone()) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(key = ?item.get("key"), "Skipping undecodable reminder: {e}");
            }
        }
    }
    records
}

#[async_trait]
impl ReminderStore for HttpReminderStore {
    fn name(&self) -> &str {
        "http"
    }

    async fn save(&self, record: ReminderRecord) -> Result<()> {
        let key = Self::record_key(&record.task_id);
        let task_id = record.task_id.clone();
        self.put(&key, serde_json::to_value(&record)?).await?;
        self.index_add(&task_id).await?;
        tracing::debug!(task_id = %task_id, "Saved reminder to state store");
        Ok(())
    }

    async fn get(&self, task_id: &str) -> Result<Option<ReminderRecord>> {
        match self.fetch(&Self::record_key(task_id)).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn remove(&self, task_id: &str) -> Result<()> {
        let resp = self
            .client
            .delete(self.key_url(&Self::record_key(task_id)))
            .send()
            .await
            .map_err(|e| TaskBeatError::state(format!("state delete failed: {e}")))?;
        // Deleting a nonexistent key is a no-op for the caller.
        if !resp.status().is_success() && resp.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(TaskBeatError::state(format!(
                "state delete returned {}",
                resp.status()
            )));
        }
        self.index_remove(task_id).await?;
        tracing::debug!(task_id = %task_id, "Removed reminder from state store");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ReminderRecord>> {
        let ids = self.read_index().await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = ids.iter().map(|id| Self::record_key(id)).collect();
        let body = serde_json::json!({
            "keys": keys,
            "parallelism": BULK_PARALLELISM,
        });
        let resp = self
            .client
            .post(format!("{}/bulk", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| TaskBeatError::state(format!("state bulk get failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(TaskBeatError::state(format!(
                "state bulk get returned {}",
                resp.status()
            )));
        }
        let items: Vec<serde_json::Value> = resp
            .json()
            .await
            .map_err(|e| TaskBeatError::state(format!("state bulk get body: {e}")))?;
        Ok(decode_bulk_items(items))
    }
}
