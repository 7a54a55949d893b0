//! # TaskBeat Core
//! Shared types for the task-lifecycle event processor:
//! unified errors, service configuration, and the canonical
//! lifecycle event model + envelope normalizer.

pub mod config;
pub mod error;
pub mod event;

pub use config::TaskBeatConfig;
pub use error::{Result, TaskBeatError};
pub use event::{normalize, TaskAction, TaskEvent, TaskSnapshot};
