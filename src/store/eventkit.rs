//! EventKit-backed [`NativeStore`] for macOS.
//!
//! Talks to `EKEventStore` through `objc2-event-kit`. EventKit answers the
//! access prompt and reminder fetches on its own queue, so both are bridged
//! back to the calling thread with a channel and a bounded wait.

use std::sync::mpsc;
use std::time::Duration;

use block2::RcBlock;
use chrono::{DateTime, Utc};
use objc2::rc::Retained;
use objc2::runtime::Bool;
use objc2_event_kit::{
    EKAlarm, EKAuthorizationStatus, EKCalendar, EKEntityType, EKEventStore, EKReminder,
};
use objc2_foundation::{
    NSArray, NSCalendar, NSDate, NSDateComponentUndefined, NSDateComponents, NSError, NSString,
    NSTimeZone,
};

use crate::error::{ReminderError, Result};
use crate::model::DueDate;
use crate::normalize;

use super::{
    DateParts, NativeAlarm, NativeList, NativeReminder, NativeStore, ReminderChanges,
    ReminderDraft,
};

/// Reminder store backed by the user's EventKit database.
pub struct EventKitStore {
    store: Retained<EKEventStore>,
}

// SAFETY: `EKEventStore` may be used from any thread; completion handlers
// are delivered on EventKit's own queue and only move plain Rust data back.
unsafe impl Send for EventKitStore {}
unsafe impl Sync for EventKitStore {}

impl EventKitStore {
    pub fn new() -> Self {
        Self {
            store: unsafe { EKEventStore::new() },
        }
    }

    fn calendars(&self) -> Retained<NSArray<EKCalendar>> {
        unsafe { self.store.calendarsForEntityType(EKEntityType::Reminder) }
    }

    fn calendar(&self, list_id: &str) -> Result<Retained<EKCalendar>> {
        unsafe {
            self.store
                .calendarWithIdentifier(&NSString::from_str(list_id))
        }
        .ok_or_else(|| ReminderError::NotFound(format!("list {list_id} not found")))
    }

    fn reminder(&self, reminder_id: &str) -> Result<Retained<EKReminder>> {
        let item = unsafe {
            self.store
                .calendarItemWithIdentifier(&NSString::from_str(reminder_id))
        }
        .ok_or_else(|| ReminderError::NotFound(format!("reminder {reminder_id} not found")))?;
        item.downcast::<EKReminder>()
            .map_err(|_| ReminderError::NotFound(format!("reminder {reminder_id} not found")))
    }

    fn save(&self, reminder: &EKReminder) -> Result<()> {
        unsafe { self.store.saveReminder_commit_error(reminder, true) }
            .map_err(|e| store_error("save reminder", &e))
    }
}

impl Default for EventKitStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeStore for EventKitStore {
    fn ensure_access(&self, timeout: Duration) -> Result<()> {
        let status = unsafe { EKEventStore::authorizationStatusForEntityType(EKEntityType::Reminder) };
        if status == EKAuthorizationStatus::FullAccess {
            return Ok(());
        }
        if status != EKAuthorizationStatus::NotDetermined {
            return Err(ReminderError::Permission(
                "Reminders access denied. Grant access in System Settings > Privacy & Security > Reminders."
                    .to_owned(),
            ));
        }

        tracing::info!("requesting Reminders access");
        let (tx, rx) = mpsc::channel::<bool>();
        let block = RcBlock::new(move |granted: Bool, _error: *mut NSError| {
            let _ = tx.send(granted.as_bool());
        });
        unsafe {
            self.store
                .requestFullAccessToRemindersWithCompletion(RcBlock::as_ptr(&block));
        }
        match rx.recv_timeout(timeout) {
            Ok(true) => Ok(()),
            Ok(false) => Err(ReminderError::Permission(
                "Reminders access was not granted".to_owned(),
            )),
            Err(_) => Err(ReminderError::Timeout(format!(
                "no answer to the Reminders access prompt within {}s",
                timeout.as_secs()
            ))),
        }
    }

    fn lists(&self) -> Result<Vec<NativeList>> {
        Ok(self.calendars().iter().map(|c| list_of(&c)).collect())
    }

    fn reminders(&self, list_id: Option<&str>, timeout: Duration) -> Result<Vec<NativeReminder>> {
        let scope = match list_id {
            Some(id) => Some(NSArray::from_retained_slice(&[self.calendar(id)?])),
            None => None,
        };
        let predicate = unsafe { self.store.predicateForRemindersInCalendars(scope.as_deref()) };

        let (tx, rx) = mpsc::channel::<Vec<NativeReminder>>();
        let block = RcBlock::new(move |found: *mut NSArray<EKReminder>| {
            // SAFETY: EventKit passes either null or a valid array for the
            // duration of the callback.
            let records = unsafe { found.as_ref() }
                .map(|arr| arr.iter().map(|r| reminder_of(&r)).collect())
                .unwrap_or_default();
            let _ = tx.send(records);
        });
        let _request = unsafe {
            self.store
                .fetchRemindersMatchingPredicate_completion(&predicate, &block)
        };
        rx.recv_timeout(timeout).map_err(|_| {
            ReminderError::Timeout(format!(
                "reminder fetch did not complete within {}s",
                timeout.as_secs()
            ))
        })
    }

    fn create_list(&self, title: &str) -> Result<NativeList> {
        let source = unsafe { self.store.defaultCalendarForNewReminders() }
            .and_then(|c| unsafe { c.source() })
            .ok_or_else(|| {
                ReminderError::Gateway("no default source for new reminder lists".to_owned())
            })?;
        let calendar = unsafe {
            EKCalendar::calendarForEntityType_eventStore(EKEntityType::Reminder, &self.store)
        };
        unsafe {
            calendar.setTitle(&NSString::from_str(title));
            calendar.setSource(Some(&source));
            self.store.saveCalendar_commit_error(&calendar, true)
        }
        .map_err(|e| store_error("save list", &e))?;
        Ok(list_of(&calendar))
    }

    fn delete_list(&self, list_id: &str) -> Result<()> {
        let calendar = self.calendar(list_id)?;
        unsafe { self.store.removeCalendar_commit_error(&calendar, true) }
            .map_err(|e| store_error("remove list", &e))
    }

    fn create_reminder(&self, list_id: &str, draft: &ReminderDraft) -> Result<NativeReminder> {
        let calendar = self.calendar(list_id)?;
        let reminder = unsafe { EKReminder::reminderWithEventStore(&self.store) };
        unsafe {
            reminder.setCalendar(Some(&calendar));
            reminder.setTitle(Some(&NSString::from_str(&draft.title)));
            if let Some(ref notes) = draft.notes {
                reminder.setNotes(Some(&NSString::from_str(notes)));
            }
            reminder.setPriority(usize::from(draft.priority));
        }
        if let Some(ref due) = draft.due {
            set_due(&reminder, due);
        }
        if let Some(at) = draft.alarm {
            set_alarm(&reminder, at);
        }
        self.save(&reminder)?;
        Ok(reminder_of(&reminder))
    }

    fn update_reminder(
        &self,
        reminder_id: &str,
        changes: &ReminderChanges,
    ) -> Result<NativeReminder> {
        let reminder = self.reminder(reminder_id)?;
        unsafe {
            if let Some(ref title) = changes.title {
                reminder.setTitle(Some(&NSString::from_str(title)));
            }
            if let Some(ref notes) = changes.notes {
                let notes = notes.as_deref().map(NSString::from_str);
                reminder.setNotes(notes.as_deref());
            }
            if let Some(priority) = changes.priority {
                reminder.setPriority(usize::from(priority));
            }
            if let Some(completed) = changes.completed {
                reminder.setCompleted(completed);
            }
        }
        if let Some(ref due) = changes.due {
            set_due(&reminder, due);
        }
        if let Some(at) = changes.alarm {
            set_alarm(&reminder, at);
        }
        self.save(&reminder)?;
        Ok(reminder_of(&reminder))
    }

    fn delete_reminder(&self, reminder_id: &str) -> Result<()> {
        let reminder = self.reminder(reminder_id)?;
        unsafe { self.store.removeReminder_commit_error(&reminder, true) }
            .map_err(|e| store_error("remove reminder", &e))
    }
}

// ─── Conversions ─────────────────────────────────────────────────────────────

fn store_error(action: &str, err: &NSError) -> ReminderError {
    ReminderError::Gateway(format!(
        "failed to {action}: {}",
        err.localizedDescription()
    ))
}

fn to_utc(date: &NSDate) -> Option<DateTime<Utc>> {
    let secs = date.timeIntervalSince1970();
    DateTime::from_timestamp_millis((secs * 1000.0).round() as i64)
}

fn to_nsdate(at: DateTime<Utc>) -> Retained<NSDate> {
    NSDate::dateWithTimeIntervalSince1970(at.timestamp_millis() as f64 / 1000.0)
}

fn list_of(calendar: &EKCalendar) -> NativeList {
    unsafe {
        NativeList {
            id: calendar.calendarIdentifier().to_string(),
            title: calendar.title().to_string(),
        }
    }
}

fn component(value: isize) -> Option<u32> {
    (value != NSDateComponentUndefined)
        .then(|| u32::try_from(value).ok())
        .flatten()
}

fn parts_of(components: &NSDateComponents) -> Option<DateParts> {
    unsafe {
        let year = i32::try_from(components.year()).ok()?;
        let month = component(components.month())?;
        let day = component(components.day())?;
        let mut parts = DateParts {
            year,
            month,
            day,
            hour: component(components.hour()),
            minute: component(components.minute()),
            second: component(components.second()),
            utc_offset_secs: None,
        };
        if parts.has_time() {
            parts.utc_offset_secs = components
                .timeZone()
                .and_then(|tz| offset_on(&tz, components));
        }
        Some(parts)
    }
}

/// Offset of `tz` at the instant `components` name, not at the current time.
fn offset_on(tz: &NSTimeZone, components: &NSDateComponents) -> Option<i32> {
    let date = unsafe { NSCalendar::currentCalendar().dateFromComponents(components) }?;
    i32::try_from(unsafe { tz.secondsFromGMTForDate(&date) }).ok()
}

fn components_of(parts: &DateParts) -> Retained<NSDateComponents> {
    unsafe {
        let components = NSDateComponents::new();
        components.setYear(parts.year as isize);
        components.setMonth(parts.month as isize);
        components.setDay(parts.day as isize);
        if parts.has_time() {
            components.setHour(parts.hour.unwrap_or(0) as isize);
            components.setMinute(parts.minute.unwrap_or(0) as isize);
            components.setSecond(parts.second.unwrap_or(0) as isize);
            if let Some(offset) = parts.utc_offset_secs {
                let tz = NSTimeZone::timeZoneForSecondsFromGMT(offset as isize);
                components.setTimeZone(Some(&tz));
            }
        }
        components
    }
}

fn set_due(reminder: &EKReminder, due: &DueDate) {
    let components = components_of(&normalize::parts_from_due(due));
    unsafe { reminder.setDueDateComponents(Some(&components)) };
}

fn set_alarm(reminder: &EKReminder, at: DateTime<Utc>) {
    let alarm = unsafe { EKAlarm::alarmWithAbsoluteDate(&to_nsdate(at)) };
    let alarms = NSArray::from_retained_slice(&[alarm]);
    unsafe { reminder.setAlarms(Some(&alarms)) };
}

fn alarm_of(alarm: &EKAlarm) -> NativeAlarm {
    unsafe {
        match alarm.absoluteDate().and_then(|d| to_utc(&d)) {
            Some(at) => NativeAlarm::absolute(at),
            None => NativeAlarm {
                absolute_date: None,
                relative_offset_secs: Some(alarm.relativeOffset()),
            },
        }
    }
}

fn reminder_of(reminder: &EKReminder) -> NativeReminder {
    unsafe {
        let (list_id, list_title) = reminder
            .calendar()
            .map(|c| {
                let list = list_of(&c);
                (list.id, list.title)
            })
            .unwrap_or_default();
        NativeReminder {
            id: reminder.calendarItemIdentifier().to_string(),
            list_id,
            list_title,
            title: reminder.title().to_string(),
            notes: reminder.notes().map(|n| n.to_string()),
            completed: reminder.isCompleted(),
            completion_date: reminder.completionDate().and_then(|d| to_utc(&d)),
            due: reminder.dueDateComponents().and_then(|c| parts_of(&c)),
            alarms: reminder
                .alarms()
                .map(|a| a.iter().map(|alarm| alarm_of(&alarm)).collect())
                .unwrap_or_default(),
            priority: reminder.priority() as i64,
            creation_date: reminder.creationDate().and_then(|d| to_utc(&d)),
            last_modified_date: reminder.lastModifiedDate().and_then(|d| to_utc(&d)),
        }
    }
}
