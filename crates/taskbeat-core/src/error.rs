//! Unified error types for TaskBeat.

use thiserror::Error;

/// Result type alias using TaskBeatError.
pub type Result<T> = std::result::Result<T, TaskBeatError>;

#[derive(Error, Debug)]
pub enum TaskBeatError {
    // Event errors — dropped after logging, never retried
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("Validation error: {0}")]
    Validation(String),

    // State store errors — transient, recoverable by the next poll
    #[error("State store error: {0}")]
    State(String),

    // Dispatch errors — transient, recoverable by the next poll
    #[error("Delivery error: {0}")]
    Delivery(String),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("{0}")]
    Other(String),
}

impl TaskBeatError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedEvent(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    pub fn delivery(msg: impl Into<String>) -> Self {
        Self::Delivery(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Errors where redelivering the same input can never succeed.
    /// The gateway acknowledges these so the transport drops the message.
    pub fn is_droppable(&self) -> bool {
        matches!(self, Self::MalformedEvent(_) | Self::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TaskBeatError::State("timeout".into());
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn test_error_constructors() {
        let e1 = TaskBeatError::malformed("test");
        assert!(matches!(e1, TaskBeatError::MalformedEvent(_)));

        let e2 = TaskBeatError::validation("test");
        assert!(matches!(e2, TaskBeatError::Validation(_)));

        let e3 = TaskBeatError::delivery("test");
        assert!(matches!(e3, TaskBeatError::Delivery(_)));
    }

    #[test]
    fn test_droppable_classification() {
        assert!(TaskBeatError::malformed("no task id").is_droppable());
        assert!(TaskBeatError::validation("bad rule").is_droppable());
        assert!(!TaskBeatError::state("store down").is_droppable());
        assert!(!TaskBeatError::delivery("503").is_droppable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TaskBeatError = io_err.into();
        assert!(matches!(err, TaskBeatError::Io(_)));
    }
}
