//! Service configuration — TOML file plus environment overrides.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TaskBeatError};

/// Top-level TaskBeat configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TaskBeatConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub state_store: StateStoreConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateStoreConfig {
    /// Backend selector: "http" or "memory".
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Base URL of the state API sidecar.
    #[serde(default = "default_state_url")]
    pub url: String,
    /// Named store within the state API.
    #[serde(default = "default_store_name")]
    pub store_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Base URL of the task-management API (notifications + task creation).
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Bearer token attached to task-creation calls.
    #[serde(default)]
    pub api_token: Option<String>,
    /// Outbound request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Reminder poll cadence in seconds.
    #[serde(default = "default_poll_secs")]
    pub poll_interval_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    3002
}
fn default_backend() -> String {
    "http".into()
}
fn default_state_url() -> String {
    "http://localhost:3500/v1.0/state".into()
}
fn default_store_name() -> String {
    "statestore".into()
}
fn default_api_url() -> String {
    "http://chat-api:8000".into()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_poll_secs() -> u64 {
    60
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

impl Default for StateStoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            url: default_state_url(),
            store_name: default_store_name(),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { poll_interval_secs: default_poll_secs() }
    }
}

impl TaskBeatConfig {
    /// Load from a TOML file, then apply environment overrides.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                let text = std::fs::read_to_string(p)?;
                toml::from_str(&text)
                    .map_err(|e| TaskBeatError::config(format!("invalid config {p}: {e}")))?
            }
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Environment variables mirror the original deployment surface.
    fn apply_env(&mut self) {
        if let Ok(port) = std::env::var("TASKBEAT_PORT") {
            if let Ok(port) = port.parse() {
                self.gateway.port = port;
            }
        }
        if let Ok(url) = std::env::var("STATE_STORE_URL") {
            self.state_store.url = url;
        }
        if let Ok(name) = std::env::var("STATE_STORE_NAME") {
            self.state_store.store_name = name;
        }
        if let Ok(url) = std::env::var("CHAT_API_URL") {
            self.dispatch.api_url = url;
        }
        if let Ok(token) = std::env::var("USER_TOKEN") {
            self.dispatch.api_token = Some(token);
        }
    }
}
