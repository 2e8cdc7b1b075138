//! Canonical reminder and list model.
//!
//! Every record that leaves the gateway is converted into these types by the
//! [`normalize`](crate::normalize) module, whatever shape the native store
//! reported it in.

use chrono::{DateTime, NaiveDate, Utc};

/// Maximum reminder name length, in characters.
pub const MAX_NAME_CHARS: usize = 500;
/// Maximum reminder body length, in characters.
pub const MAX_BODY_CHARS: usize = 5000;
/// Maximum length of a new list's name, in characters.
pub const MAX_LIST_NAME_CHARS: usize = 200;
/// Maximum search query length, in characters.
pub const MAX_QUERY_CHARS: usize = 200;
/// Highest priority value.
pub const MAX_PRIORITY: u8 = 9;

/// The single due-date slot of a reminder.
///
/// All-day and timed dues are mutually exclusive: writing one replaces the
/// other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueDate {
    /// A calendar day with no time-of-day component.
    AllDay(NaiveDate),
    /// A specific instant.
    Timed(DateTime<Utc>),
}

impl DueDate {
    /// Instant used for ordering. All-day dates compare at UTC midnight.
    pub fn sort_instant(&self) -> DateTime<Utc> {
        match self {
            DueDate::AllDay(date) => date.and_time(chrono::NaiveTime::MIN).and_utc(),
            DueDate::Timed(at) => *at,
        }
    }

    pub fn is_all_day(&self) -> bool {
        matches!(self, DueDate::AllDay(_))
    }
}

/// Coarse priority bucket for a 0–9 priority value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityLevel {
    None,
    Low,
    Medium,
    High,
}

impl PriorityLevel {
    /// 0 = none, 1–4 = low, 5–8 = medium, 9 = high.
    pub fn from_value(priority: u8) -> Self {
        match priority {
            0 => PriorityLevel::None,
            1..=4 => PriorityLevel::Low,
            5..=8 => PriorityLevel::Medium,
            _ => PriorityLevel::High,
        }
    }
}

/// A single reminder in canonical form.
#[derive(Debug, Clone, PartialEq)]
pub struct Reminder {
    /// Opaque native identifier.
    pub id: String,
    /// Reminder title.
    pub name: String,
    /// Optional free-form notes.
    pub body: Option<String>,
    /// Whether the reminder is marked complete.
    pub completed: bool,
    /// When it was completed. Present only while `completed` is true.
    pub completion_date: Option<DateTime<Utc>>,
    /// Due slot, if set.
    pub due: Option<DueDate>,
    /// Earliest absolute alarm.
    pub remind_me_date: Option<DateTime<Utc>>,
    /// Priority 0 (none) through 9 (high).
    pub priority: u8,
    pub creation_date: DateTime<Utc>,
    pub last_modified_date: DateTime<Utc>,
    /// Name of the owning list (a copy, not a reference).
    pub list_name: String,
}

impl Reminder {
    /// True iff the due slot holds a date without time of day.
    pub fn is_all_day(&self) -> bool {
        self.due.is_some_and(|d| d.is_all_day())
    }

    /// Timed due instant, if the due slot is timed.
    pub fn due_date(&self) -> Option<DateTime<Utc>> {
        match self.due {
            Some(DueDate::Timed(at)) => Some(at),
            _ => None,
        }
    }

    /// All-day due date, if the due slot is all-day.
    pub fn all_day_due_date(&self) -> Option<NaiveDate> {
        match self.due {
            Some(DueDate::AllDay(date)) => Some(date),
            _ => None,
        }
    }

    pub fn priority_level(&self) -> PriorityLevel {
        PriorityLevel::from_value(self.priority)
    }
}

/// A reminder list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderList {
    /// Opaque native identifier.
    pub id: String,
    /// Display name; the only addressing key exposed to callers.
    pub name: String,
    /// Number of incomplete reminders in this list.
    pub reminder_count: usize,
}
