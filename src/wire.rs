//! JSON records exchanged with the gateway process.
//!
//! Field names are camelCase. Timestamps are ISO 8601 strings in UTC with
//! optional fractional seconds; all-day dates are `YYYY-MM-DD`.

use serde::{Deserialize, Serialize};

/// A reminder as carried in gateway results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireReminder {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<String>,
    /// Timed due instant. Absent when the due slot is all-day or empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// All-day due date. Absent when the due slot is timed or empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_day_due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remind_me_date: Option<String>,
    #[serde(default)]
    pub priority: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_date: Option<String>,
    pub list_name: String,
}

/// A reminder list as carried in gateway results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireList {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub reminder_count: usize,
}

/// Result of `listReminders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePage {
    pub reminders: Vec<WireReminder>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub has_more: bool,
}

/// Result of `countReminders`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResult {
    pub count: usize,
}

/// Result of the delete operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedResult {
    pub deleted: bool,
}
