//! Store used on platforms without EventKit.
//!
//! Every operation fails with [`ReminderError::Permission`] and a diagnostic
//! message, so callers see a clean error envelope instead of a crash.

use std::time::Duration;

use crate::error::{ReminderError, Result};

use super::{NativeList, NativeReminder, NativeStore, ReminderChanges, ReminderDraft};

/// A [`NativeStore`] that refuses every call.
pub struct UnavailableStore;

fn unavailable<T>() -> Result<T> {
    Err(ReminderError::Permission(
        "Reminders store is only available on macOS. \
         Run the gateway on a Mac with Reminders access granted."
            .to_owned(),
    ))
}

impl NativeStore for UnavailableStore {
    fn ensure_access(&self, _timeout: Duration) -> Result<()> {
        unavailable()
    }

    fn lists(&self) -> Result<Vec<NativeList>> {
        unavailable()
    }

    fn reminders(&self, _list_id: Option<&str>, _timeout: Duration) -> Result<Vec<NativeReminder>> {
        unavailable()
    }

    fn create_list(&self, _title: &str) -> Result<NativeList> {
        unavailable()
    }

    fn delete_list(&self, _list_id: &str) -> Result<()> {
        unavailable()
    }

    fn create_reminder(&self, _list_id: &str, _draft: &ReminderDraft) -> Result<NativeReminder> {
        unavailable()
    }

    fn update_reminder(
        &self,
        _reminder_id: &str,
        _changes: &ReminderChanges,
    ) -> Result<NativeReminder> {
        unavailable()
    }

    fn delete_reminder(&self, _reminder_id: &str) -> Result<()> {
        unavailable()
    }
}
