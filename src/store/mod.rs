//! Native reminder store port used by the gateway process.
//!
//! The gateway operations in [`crate::gateway`] are written against the
//! [`NativeStore`] trait, which mirrors the primitive surface of Apple's
//! EventKit: an access check, list enumeration, a reminder fetch, and
//! single-object saves and removals that commit immediately.
//!
//! Implementations:
//! - [`eventkit::EventKitStore`] on macOS
//! - [`unavailable::UnavailableStore`] on every other platform
//! - [`memory::MemoryStore`] for tests and in-process use
//!
//! Native records keep the store's own shape (date components, raw alarm
//! list, unclamped priority); [`crate::normalize`] turns them into the
//! canonical model.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::DueDate;

#[cfg(target_os = "macos")]
pub mod eventkit;
pub mod memory;
pub mod unavailable;

/// Calendar components of a native due date.
///
/// A due date carrying only `year`, `month` and `day` is an all-day date;
/// any time component makes it a timed date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateParts {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: Option<u32>,
    pub minute: Option<u32>,
    pub second: Option<u32>,
    /// Offset of the components' time zone from UTC. `None` means the local
    /// time zone.
    pub utc_offset_secs: Option<i32>,
}

impl DateParts {
    /// Date-only components.
    pub fn date(year: i32, month: u32, day: u32) -> Self {
        Self {
            year,
            month,
            day,
            hour: None,
            minute: None,
            second: None,
            utc_offset_secs: None,
        }
    }

    pub fn has_time(&self) -> bool {
        self.hour.is_some() || self.minute.is_some() || self.second.is_some()
    }
}

/// An alarm attached to a native reminder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativeAlarm {
    /// Fixed trigger time, for absolute alarms.
    pub absolute_date: Option<DateTime<Utc>>,
    /// Offset from the due date, for relative alarms.
    pub relative_offset_secs: Option<f64>,
}

impl NativeAlarm {
    pub fn absolute(at: DateTime<Utc>) -> Self {
        Self {
            absolute_date: Some(at),
            relative_offset_secs: None,
        }
    }
}

/// A reminder list as reported by the native store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeList {
    pub id: String,
    pub title: String,
}

/// A reminder as reported by the native store.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeReminder {
    pub id: String,
    pub list_id: String,
    pub list_title: String,
    pub title: String,
    pub notes: Option<String>,
    pub completed: bool,
    pub completion_date: Option<DateTime<Utc>>,
    pub due: Option<DateParts>,
    pub alarms: Vec<NativeAlarm>,
    /// Raw native priority; not guaranteed to be within 0–9.
    pub priority: i64,
    pub creation_date: Option<DateTime<Utc>>,
    pub last_modified_date: Option<DateTime<Utc>>,
}

/// Field values for a new reminder.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderDraft {
    pub title: String,
    pub notes: Option<String>,
    pub due: Option<DueDate>,
    /// Replaces all alarms with one absolute alarm at this time.
    pub alarm: Option<DateTime<Utc>>,
    pub priority: u8,
}

/// Field changes for an existing reminder. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReminderChanges {
    pub title: Option<String>,
    /// `Some(None)` clears the notes.
    pub notes: Option<Option<String>>,
    pub due: Option<DueDate>,
    pub alarm: Option<DateTime<Utc>>,
    pub priority: Option<u8>,
    /// `true` stamps the completion date with now, `false` clears it.
    pub completed: Option<bool>,
}

impl ReminderChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.notes.is_none()
            && self.due.is_none()
            && self.alarm.is_none()
            && self.priority.is_none()
            && self.completed.is_none()
    }
}

/// Abstraction over the OS reminder store.
///
/// Every mutating method commits before returning.
pub trait NativeStore: Send + Sync {
    /// Verify full access, prompting the user and blocking up to `timeout`
    /// when access has not been determined yet.
    fn ensure_access(&self, timeout: Duration) -> Result<()>;

    /// All reminder lists.
    fn lists(&self) -> Result<Vec<NativeList>>;

    /// Reminders in `list_id`, or in every list when `None`.
    fn reminders(&self, list_id: Option<&str>, timeout: Duration) -> Result<Vec<NativeReminder>>;

    fn create_list(&self, title: &str) -> Result<NativeList>;

    /// Remove a list together with every reminder it contains.
    fn delete_list(&self, list_id: &str) -> Result<()>;

    fn create_reminder(&self, list_id: &str, draft: &ReminderDraft) -> Result<NativeReminder>;

    fn update_reminder(&self, reminder_id: &str, changes: &ReminderChanges)
    -> Result<NativeReminder>;

    fn delete_reminder(&self, reminder_id: &str) -> Result<()>;
}

/// The native store for the current platform.
///
/// EventKit on macOS; elsewhere a store that refuses every call with a
/// diagnostic permission error.
pub fn platform_store() -> Arc<dyn NativeStore> {
    #[cfg(target_os = "macos")]
    {
        Arc::new(eventkit::EventKitStore::new())
    }
    #[cfg(not(target_os = "macos"))]
    {
        Arc::new(unavailable::UnavailableStore)
    }
}
