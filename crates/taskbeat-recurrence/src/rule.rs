//! Recurrence rules.
//!
//! Grammar: `<freq>[;interval=<n>][;until=<YYYY-MM-DD>][;count=<n>]`
//! where `<freq>` is one of `daily|weekly|monthly|yearly`
//! (case-insensitive) and `interval >= 1`. `until` and `count` are end
//! conditions: the rule is exhausted once the next occurrence would
//! fall past `until`, or once `count` further occurrences have been
//! generated. `count` advances by being decremented on the rule string
//! carried to each next task, so evaluation stays stateless.

use std::fmt;

use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use serde::Serialize;
use taskbeat_core::error::{Result, TaskBeatError};
use taskbeat_core::event::TaskSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            "yearly" => Some(Self::Yearly),
            _ => None,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    pub interval: u32,
    pub until: Option<NaiveDate>,
    pub count: Option<u32>,
}

impl RecurrenceRule {
    /// Parse and validate a rule string. Invalid rules are rejected,
    /// never silently defaulted.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TaskBeatError::validation("empty recurrence rule"));
        }

        let mut parts = s.split(';');
        let freq_part = parts.next().unwrap_or_default().trim();
        let frequency = Frequency::parse(freq_part).ok_or_else(|| {
            TaskBeatError::validation(format!("unrecognized frequency: {freq_part:?}"))
        })?;

        let mut rule = Self {
            frequency,
            interval: 1,
            until: None,
            count: None,
        };

        for part in parts {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| TaskBeatError::validation(format!("malformed clause: {part:?}")))?;
            match key.trim() {
                "interval" => {
                    // Parsing straight into u32 rejects negatives and
                    // out-of-range values alike.
                    let interval: u32 = value.trim().parse().map_err(|_| {
                        TaskBeatError::validation(format!("bad interval: {value:?}"))
                    })?;
                    if interval < 1 {
                        return Err(TaskBeatError::validation(format!(
                            "interval must be positive, got {interval}"
                        )));
                    }
                    rule.interval = interval;
                }
                "until" => {
                    rule.until = Some(value.trim().parse().map_err(|_| {
                        TaskBeatError::validation(format!("bad until date: {value:?}"))
                    })?);
                }
                "count" => {
                    rule.count = Some(value.trim().parse().map_err(|_| {
                        TaskBeatError::validation(format!("bad count: {value:?}"))
                    })?);
                }
                other => {
                    return Err(TaskBeatError::validation(format!(
                        "unknown clause: {other:?}"
                    )));
                }
            }
        }
        Ok(rule)
    }

    /// Whether a rule string parses cleanly.
    pub fn is_valid(s: &str) -> bool {
        Self::parse(s).is_ok()
    }

    /// One frequency step past `last`, or `None` when the rule's end
    /// condition is already satisfied (recurrence exhausted — expected
    /// steady-state, not an error).
    pub fn next_occurrence(&self, last: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.count == Some(0) {
            return None;
        }

        let next = match self.frequency {
            Frequency::Daily => last.checked_add_signed(Duration::days(self.interval as i64))?,
            Frequency::Weekly => last.checked_add_signed(Duration::weeks(self.interval as i64))?,
            Frequency::Monthly => last.checked_add_months(Months::new(self.interval))?,
            Frequency::Yearly => {
                let months = self.interval.checked_mul(12)?;
                last.checked_add_months(Months::new(months))?
            }
        };

        if let Some(until) = self.until {
            if next.date_naive() > until {
                return None;
            }
        }
        Some(next)
    }

    /// The rule to carry on the next occurrence: identical, with
    /// `count` one closer to exhaustion.
    pub fn decremented(&self) -> Self {
        Self {
            count: self.count.map(|c| c.saturating_sub(1)),
            ..self.clone()
        }
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};interval={}", self.frequency, self.interval)?;
        if let Some(until) = self.until {
            write!(f, ";until={until}")?;
        }
        if let Some(count) = self.count {
            write!(f, ";count={count}")?;
        }
        Ok(())
    }
}

/// Payload for the downstream task-creation call. Carries no id and no
/// completion fields so the task service assigns a fresh identity.
#[derive(Debug, Clone, Serialize)]
pub struct NewTaskPayload {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub recurrence_rule: String,
    pub due_date: DateTime<Utc>,
    pub status: String,
}

/// Build the next occurrence of a completed recurring task.
pub fn next_task(
    task: &TaskSnapshot,
    rule: &RecurrenceRule,
    next_due: DateTime<Utc>,
) -> NewTaskPayload {
    NewTaskPayload {
        title: task.title.clone(),
        description: task.description.clone(),
        priority: task.priority.clone(),
        category: task.category.clone(),
        recurrence_rule: rule.decremented().to_string(),
        due_date: next_due,
        status: "pending".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_minimal() {
        let rule = RecurrenceRule::parse("weekly;interval=1").unwrap();
        assert_eq!(rule.frequency, Frequency::Weekly);
        assert_eq!(rule.interval, 1);
        assert!(rule.until.is_none());
        assert!(rule.count.is_none());
    }

    #[test]
    fn test_parse_defaults_interval_to_one() {
        let rule = RecurrenceRule::parse("daily").unwrap();
        assert_eq!(rule.interval, 1);
    }

    #[test]
    fn test_parse_case_insensitive_frequency() {
        assert!(RecurrenceRule::is_valid("WEEKLY;interval=2"));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(!RecurrenceRule::is_valid(""));
        assert!(!RecurrenceRule::is_valid("fortnightly"));
        assert!(!RecurrenceRule::is_valid("weekly;interval=-2"));
        assert!(!RecurrenceRule::is_valid("weekly;interval=0"));
        assert!(!RecurrenceRule::is_valid("weekly;interval=abc"));
        // Larger than u32 — rejected rather than silently truncated.
        assert!(!RecurrenceRule::is_valid("daily;interval=4294967297"));
        assert!(!RecurrenceRule::is_valid("weekly;until=sometime"));
        assert!(!RecurrenceRule::is_valid("weekly;cadence=2"));
        assert!(!RecurrenceRule::is_valid("weekly;interval"));
    }

    #[test]
    fn test_parse_end_conditions() {
        let rule = RecurrenceRule::parse("monthly;interval=2;until=2024-12-31;count=5").unwrap();
        assert_eq!(rule.interval, 2);
        assert_eq!(rule.until, Some("2024-12-31".parse().unwrap()));
        assert_eq!(rule.count, Some(5));
    }

    #[test]
    fn test_weekly_step() {
        let rule = RecurrenceRule::parse("weekly;interval=1").unwrap();
        assert_eq!(
            rule.next_occurrence(at("2024-01-01T00:00:00Z")),
            Some(at("2024-01-08T00:00:00Z"))
        );
    }

    #[test]
    fn test_weekly_until_exhausted() {
        let rule = RecurrenceRule::parse("weekly;interval=1;until=2024-01-05").unwrap();
        assert_eq!(rule.next_occurrence(at("2024-01-01T00:00:00Z")), None);
    }

    #[test]
    fn test_until_inclusive_on_the_day() {
        let rule = RecurrenceRule::parse("weekly;interval=1;until=2024-01-08").unwrap();
        assert_eq!(
            rule.next_occurrence(at("2024-01-01T09:30:00Z")),
            Some(at("2024-01-08T09:30:00Z"))
        );
    }

    #[test]
    fn test_monthly_step() {
        let rule = RecurrenceRule::parse("monthly;interval=1").unwrap();
        assert_eq!(
            rule.next_occurrence(at("2024-03-15T12:00:00Z")),
            Some(at("2024-04-15T12:00:00Z"))
        );
    }

    #[test]
    fn test_monthly_clamps_at_month_end() {
        let rule = RecurrenceRule::parse("monthly;interval=1").unwrap();
        assert_eq!(
            rule.next_occurrence(at("2024-01-31T08:00:00Z")),
            Some(at("2024-02-29T08:00:00Z"))
        );
    }

    #[test]
    fn test_daily_and_yearly_intervals() {
        let daily = RecurrenceRule::parse("daily;interval=3").unwrap();
        assert_eq!(
            daily.next_occurrence(at("2024-01-01T00:00:00Z")),
            Some(at("2024-01-04T00:00:00Z"))
        );

        let yearly = RecurrenceRule::parse("yearly;interval=1").unwrap();
        assert_eq!(
            yearly.next_occurrence(at("2024-06-01T00:00:00Z")),
            Some(at("2025-06-01T00:00:00Z"))
        );
    }

    #[test]
    fn test_yearly_interval_overflow_is_none() {
        let rule = RecurrenceRule::parse("yearly;interval=4294967295").unwrap();
        // 12x the interval overflows u32; no panic, just no occurrence.
        assert_eq!(rule.next_occurrence(at("2024-01-01T00:00:00Z")), None);
    }

    #[test]
    fn test_count_zero_is_exhausted() {
        let rule = RecurrenceRule::parse("daily;count=0").unwrap();
        assert_eq!(rule.next_occurrence(at("2024-01-01T00:00:00Z")), None);
    }

    #[test]
    fn test_display_round_trips() {
        let rule = RecurrenceRule::parse("monthly;interval=2;until=2024-12-31;count=3").unwrap();
        assert_eq!(RecurrenceRule::parse(&rule.to_string()).unwrap(), rule);
    }

    fn snapshot() -> TaskSnapshot {
        TaskSnapshot {
            id: "t-1".into(),
            title: "Pay rent".into(),
            description: Some("First of the month".into()),
            due_date: Some(at("2024-03-01T09:00:00Z")),
            reminder_offset_minutes: Some(30),
            recurrence_rule: Some("monthly;interval=1;count=2".into()),
            priority: Some("high".into()),
            category: Some("finance".into()),
            status: "completed".into(),
            completed_at: Some(at("2024-03-01T10:00:00Z")),
            updated_at: at("2024-03-01T10:00:00Z"),
        }
    }

    #[test]
    fn test_next_task_payload() {
        let task = snapshot();
        let rule = RecurrenceRule::parse(task.recurrence_rule.as_deref().unwrap()).unwrap();
        let payload = next_task(&task, &rule, at("2024-04-01T10:00:00Z"));

        assert_eq!(payload.title, "Pay rent");
        assert_eq!(payload.status, "pending");
        assert_eq!(payload.due_date, at("2024-04-01T10:00:00Z"));
        assert_eq!(payload.priority.as_deref(), Some("high"));
        assert_eq!(payload.recurrence_rule, "monthly;interval=1;count=1");

        // No identity or completion fields make it onto the wire.
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("id").is_none());
        assert!(json.get("completed_at").is_none());
        assert!(json.get("user_id").is_none());
    }
}
