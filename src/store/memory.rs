//! In-memory [`NativeStore`] implementation.
//!
//! Used by tests and by in-process callers that want the full gateway
//! semantics without a macOS runtime. State lives only as long as the value.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::{ReminderError, Result};
use crate::normalize;

use super::{
    NativeAlarm, NativeList, NativeReminder, NativeStore, ReminderChanges, ReminderDraft,
};

/// Simulated authorization state of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessState {
    Granted,
    Denied,
    /// Not yet asked; the simulated prompt answers with `grant`.
    Undetermined { grant: bool },
    /// The prompt never gets an answer; access requests run out their timeout.
    Unanswered,
}

struct State {
    access: AccessState,
    lists: Vec<NativeList>,
    reminders: Vec<NativeReminder>,
    stall_fetches: bool,
}

/// An in-memory reminder store.
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Empty store with access granted.
    pub fn new() -> Self {
        Self::with_access(AccessState::Granted)
    }

    /// Empty store that refuses access.
    pub fn denied() -> Self {
        Self::with_access(AccessState::Denied)
    }

    pub fn with_access(access: AccessState) -> Self {
        Self {
            state: Mutex::new(State {
                access,
                lists: Vec::new(),
                reminders: Vec::new(),
                stall_fetches: false,
            }),
        }
    }

    /// Store seeded with `lists` and `reminders`, access granted.
    pub fn seeded(lists: Vec<NativeList>, reminders: Vec<NativeReminder>) -> Self {
        Self {
            state: Mutex::new(State {
                access: AccessState::Granted,
                lists,
                reminders,
                stall_fetches: false,
            }),
        }
    }

    /// Make every reminder fetch hang until its timeout elapses.
    pub fn stall_fetches(self) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.stall_fetches = true;
        }
        self
    }

    /// Current authorization state.
    pub fn access(&self) -> AccessState {
        self.state
            .lock()
            .map(|s| s.access)
            .unwrap_or(AccessState::Denied)
    }

    pub fn snapshot_lists(&self) -> Vec<NativeList> {
        self.state
            .lock()
            .map(|s| s.lists.clone())
            .unwrap_or_default()
    }

    pub fn snapshot_reminders(&self) -> Vec<NativeReminder> {
        self.state
            .lock()
            .map(|s| s.reminders.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| ReminderError::Gateway("memory store lock poisoned".to_owned()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn new_id(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4())
}

fn apply_alarm(reminder: &mut NativeReminder, alarm: Option<DateTime<Utc>>) {
    if let Some(at) = alarm {
        reminder.alarms = vec![NativeAlarm::absolute(at)];
    }
}

impl NativeStore for MemoryStore {
    fn ensure_access(&self, timeout: Duration) -> Result<()> {
        let mut state = self.lock()?;
        let access = state.access;
        match access {
            AccessState::Unanswered => {
                drop(state);
                std::thread::sleep(timeout);
                Err(ReminderError::Timeout(format!(
                    "no answer to the Reminders access request after {timeout:?}"
                )))
            }
            AccessState::Granted => Ok(()),
            AccessState::Denied => Err(ReminderError::Permission(
                "Reminders access was denied".to_owned(),
            )),
            AccessState::Undetermined { grant } => {
                state.access = if grant {
                    AccessState::Granted
                } else {
                    AccessState::Denied
                };
                if grant {
                    Ok(())
                } else {
                    Err(ReminderError::Permission(
                        "Reminders access was denied".to_owned(),
                    ))
                }
            }
        }
    }

    fn lists(&self) -> Result<Vec<NativeList>> {
        Ok(self.lock()?.lists.clone())
    }

    fn reminders(&self, list_id: Option<&str>, timeout: Duration) -> Result<Vec<NativeReminder>> {
        let state = self.lock()?;
        if state.stall_fetches {
            drop(state);
            std::thread::sleep(timeout);
            return Err(ReminderError::Timeout(format!(
                "reminder fetch did not complete within {timeout:?}"
            )));
        }
        Ok(state
            .reminders
            .iter()
            .filter(|r| list_id.is_none_or(|id| r.list_id == id))
            .cloned()
            .collect())
    }

    fn create_list(&self, title: &str) -> Result<NativeList> {
        let mut state = self.lock()?;
        let list = NativeList {
            id: new_id("list"),
            title: title.to_owned(),
        };
        state.lists.push(list.clone());
        Ok(list)
    }

    fn delete_list(&self, list_id: &str) -> Result<()> {
        let mut state = self.lock()?;
        let pos = state
            .lists
            .iter()
            .position(|l| l.id == list_id)
            .ok_or_else(|| ReminderError::NotFound(format!("list {list_id} not found")))?;
        state.lists.remove(pos);
        state.reminders.retain(|r| r.list_id != list_id);
        Ok(())
    }

    fn create_reminder(&self, list_id: &str, draft: &ReminderDraft) -> Result<NativeReminder> {
        let mut state = self.lock()?;
        let list_title = state
            .lists
            .iter()
            .find(|l| l.id == list_id)
            .map(|l| l.title.clone())
            .ok_or_else(|| ReminderError::NotFound(format!("list {list_id} not found")))?;
        let now = Utc::now();
        let mut reminder = NativeReminder {
            id: new_id("rem"),
            list_id: list_id.to_owned(),
            list_title,
            title: draft.title.clone(),
            notes: draft.notes.clone(),
            completed: false,
            completion_date: None,
            due: draft.due.as_ref().map(normalize::parts_from_due),
            alarms: Vec::new(),
            priority: i64::from(draft.priority),
            creation_date: Some(now),
            last_modified_date: Some(now),
        };
        apply_alarm(&mut reminder, draft.alarm);
        state.reminders.push(reminder.clone());
        Ok(reminder)
    }

    fn update_reminder(
        &self,
        reminder_id: &str,
        changes: &ReminderChanges,
    ) -> Result<NativeReminder> {
        let mut state = self.lock()?;
        let reminder = state
            .reminders
            .iter_mut()
            .find(|r| r.id == reminder_id)
            .ok_or_else(|| ReminderError::NotFound(format!("reminder {reminder_id} not found")))?;

        let now = Utc::now();
        if let Some(ref title) = changes.title {
            reminder.title = title.clone();
        }
        if let Some(ref notes) = changes.notes {
            reminder.notes = notes.clone();
        }
        if let Some(ref due) = changes.due {
            reminder.due = Some(normalize::parts_from_due(due));
        }
        apply_alarm(reminder, changes.alarm);
        if let Some(priority) = changes.priority {
            reminder.priority = i64::from(priority);
        }
        if let Some(completed) = changes.completed {
            reminder.completed = completed;
            reminder.completion_date = completed.then_some(now);
        }
        reminder.last_modified_date = Some(now);
        Ok(reminder.clone())
    }

    fn delete_reminder(&self, reminder_id: &str) -> Result<()> {
        let mut state = self.lock()?;
        let pos = state
            .reminders
            .iter()
            .position(|r| r.id == reminder_id)
            .ok_or_else(|| ReminderError::NotFound(format!("reminder {reminder_id} not found")))?;
        state.reminders.remove(pos);
        Ok(())
    }
}
