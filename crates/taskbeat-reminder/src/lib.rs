//! # TaskBeat Reminder
//! Owns the reminder lifecycle: schedule on create, reschedule on
//! update, cancel on complete/delete, and a one-minute sweep that
//! delivers due reminders.
//!
//! Delivery is at-least-once: a reminder is only removed after the
//! notification call succeeds, so a slow or failed delivery is retried
//! by the next poll. Receivers should dedupe by `taskId` +
//! `reminderTime`.

pub mod engine;
pub mod notify;
pub mod sweep;

pub use engine::ReminderEngine;
pub use notify::{HttpNotifier, Notifier};
pub use sweep::ReminderSweep;
