//! Parameter structs accepted by the core operations.
//!
//! The same structs are the JSON payloads sent to the gateway process, so
//! they serialize with camelCase field names and omit absent options.

use serde::{Deserialize, Serialize};

use crate::error::{ReminderError, Result};
use crate::model::{
    MAX_BODY_CHARS, MAX_LIST_NAME_CHARS, MAX_NAME_CHARS, MAX_PRIORITY, MAX_QUERY_CHARS,
};

/// Payload of `createReminder`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReminderParams {
    pub name: String,
    pub list_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// ISO 8601; a date-only value is treated as all-day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// `YYYY-MM-DD`. Wins over `due_date` when both are given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_day_due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remind_me_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
}

/// Payload of `updateReminder`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReminderParams {
    /// Current name of the reminder to update.
    pub reminder_name: String,
    pub list_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
    /// An empty string clears the body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_day_due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remind_me_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl UpdateReminderParams {
    /// Whether any field besides the locator is set.
    pub fn has_changes(&self) -> bool {
        self.new_name.is_some()
            || self.body.is_some()
            || self.due_date.is_some()
            || self.all_day_due_date.is_some()
            || self.remind_me_date.is_some()
            || self.priority.is_some()
            || self.completed.is_some()
    }
}

/// Payload of `deleteReminder`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReminderParams {
    pub reminder_name: String,
    pub list_name: String,
}

/// Payload of `listReminders` and `countReminders`.
///
/// `query` is set for searches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRemindersParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

/// Caller options for a search. `query` is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRemindersParams {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

impl From<SearchRemindersParams> for ListRemindersParams {
    fn from(p: SearchRemindersParams) -> Self {
        Self {
            list_name: p.list_name,
            completed: p.completed,
            limit: p.limit,
            offset: p.offset,
            query: Some(p.query),
        }
    }
}

/// Payload of `createList` and `deleteList`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListNameParams {
    pub name: String,
}

// ─── Field checks shared by the client and the gateway ──────────────────────

/// Trim `value` and require it to be non-empty and at most `max_chars`.
pub fn require_text(field: &str, value: &str, max_chars: usize) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ReminderError::Validation(format!(
            "{field} is required and cannot be empty"
        )));
    }
    if trimmed.chars().count() > max_chars {
        return Err(ReminderError::Validation(format!(
            "{field} exceeds {max_chars} characters"
        )));
    }
    Ok(trimmed.to_owned())
}

/// Require `value` to be non-blank without altering it. Names that refer to
/// existing lists and reminders are matched exactly as given.
pub fn require_present<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    if value.trim().is_empty() {
        return Err(ReminderError::Validation(format!(
            "{field} is required and cannot be empty"
        )));
    }
    Ok(value)
}

pub fn check_name(name: &str) -> Result<String> {
    require_text("name", name, MAX_NAME_CHARS)
}

pub fn check_list_name(name: &str) -> Result<String> {
    require_text("listName", name, MAX_LIST_NAME_CHARS)
}

pub fn check_body(body: &str) -> Result<()> {
    if body.chars().count() > MAX_BODY_CHARS {
        return Err(ReminderError::Validation(format!(
            "body exceeds {MAX_BODY_CHARS} characters"
        )));
    }
    Ok(())
}

pub fn check_priority(priority: u8) -> Result<()> {
    if priority > MAX_PRIORITY {
        return Err(ReminderError::Validation(format!(
            "priority must be between 0 and {MAX_PRIORITY}, got {priority}"
        )));
    }
    Ok(())
}

pub fn check_query(query: &str) -> Result<String> {
    require_text("query", query, MAX_QUERY_CHARS)
}
