//! # TaskBeat Recurrence
//! Pure recurrence-rule evaluation plus the task-completion handler
//! that turns a completed recurring task into its next occurrence.
//!
//! The engine owns no state: it is a function from
//! `(rule, last occurrence)` to `next occurrence | none`. Rule
//! invalidity is a parse error; rule exhaustion is a normal `None` —
//! callers must never treat the two the same.

pub mod handler;
pub mod rule;
pub mod sink;

pub use handler::CompletionHandler;
pub use rule::{next_task, Frequency, NewTaskPayload, RecurrenceRule};
pub use sink::{HttpTaskSink, TaskSink};
