//! Domain normalizer: native and wire records into the canonical model.
//!
//! Conversion rules:
//!
//! - due components with only year/month/day become [`DueDate::AllDay`];
//!   any time component makes the due [`DueDate::Timed`], converted to UTC
//! - the notification time is the earliest absolute alarm
//! - missing or unparseable timestamps become `None`, never an epoch default;
//!   creation falls back to "now" and last-modified falls back to creation
//! - priorities outside 0–9 are clamped
//!
//! Caller date inputs follow ISO 8601: `YYYY-MM-DD` is all-day, a date-time
//! with an offset is converted to UTC, and a date-time without an offset is
//! read in the local time zone.

use chrono::{
    DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone,
    Utc,
};

use crate::error::{ReminderError, Result};
use crate::model::{DueDate, MAX_PRIORITY, Reminder, ReminderList};
use crate::store::{DateParts, NativeAlarm, NativeList, NativeReminder};
use crate::wire::{WireList, WireReminder};

const DATE_FORMAT: &str = "%Y-%m-%d";

const NAIVE_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

// ─── Wire timestamps ─────────────────────────────────────────────────────────

/// Format an instant for the wire (`2024-03-10T09:00:00Z`).
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Format an all-day date for the wire (`2024-03-10`).
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a wire timestamp. Returns `None` for anything unparseable.
///
/// Wire timestamps are UTC; a value without an offset is read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    let parsed = parse_naive_date_time(raw).map(|naive| naive.and_utc());
    if parsed.is_none() {
        tracing::debug!(value = raw, "dropping unparseable wire timestamp");
    }
    parsed
}

/// Parse a wire all-day date. Returns `None` for anything unparseable.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

fn parse_naive_date_time(raw: &str) -> Option<NaiveDateTime> {
    NAIVE_DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

// ─── Caller inputs ───────────────────────────────────────────────────────────

/// Parse a caller-supplied due date: date-only is all-day, otherwise timed.
pub fn parse_due_input(raw: &str) -> Result<DueDate> {
    if let Some(date) = parse_date(raw) {
        return Ok(DueDate::AllDay(date));
    }
    parse_instant_input(raw).map(DueDate::Timed)
}

/// Parse a caller-supplied all-day date (`YYYY-MM-DD`).
pub fn parse_all_day_input(raw: &str) -> Result<NaiveDate> {
    parse_date(raw).ok_or_else(|| {
        ReminderError::Validation(format!(
            "invalid all-day date {raw:?}: expected YYYY-MM-DD"
        ))
    })
}

/// Parse a caller-supplied instant.
///
/// An explicit offset is honoured; a bare date-time is local time; a bare
/// date is local midnight.
pub fn parse_instant_input(raw: &str) -> Result<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(at.with_timezone(&Utc));
    }
    let naive = parse_naive_date_time(trimmed)
        .or_else(|| parse_date(trimmed).map(|d| d.and_time(NaiveTime::MIN)))
        .ok_or_else(|| {
            ReminderError::Validation(format!(
                "invalid date {raw:?}: expected ISO 8601 (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS[±HH:MM])"
            ))
        })?;
    local_to_utc(naive).ok_or_else(|| {
        ReminderError::Validation(format!("date {raw:?} does not exist in the local time zone"))
    })
}

/// Resolve the due slot from the two caller fields.
///
/// Both values must parse. When both are present the all-day date wins.
pub fn resolve_due(due_date: Option<&str>, all_day_due_date: Option<&str>) -> Result<Option<DueDate>> {
    let timed = due_date.map(parse_due_input).transpose()?;
    let all_day = all_day_due_date.map(parse_all_day_input).transpose()?;
    if timed.is_some() && all_day.is_some() {
        tracing::debug!("both dueDate and allDayDueDate supplied; all-day date wins");
    }
    Ok(all_day.map(DueDate::AllDay).or(timed))
}

fn local_to_utc(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|at| at.with_timezone(&Utc))
}

// ─── Native records ──────────────────────────────────────────────────────────

/// Map native due components to the due slot.
///
/// Invalid calendar components yield `None`.
pub fn due_from_parts(parts: &DateParts) -> Option<DueDate> {
    let date = NaiveDate::from_ymd_opt(parts.year, parts.month, parts.day)?;
    if !parts.has_time() {
        return Some(DueDate::AllDay(date));
    }
    let time = NaiveTime::from_hms_opt(
        parts.hour.unwrap_or(0),
        parts.minute.unwrap_or(0),
        parts.second.unwrap_or(0),
    )?;
    let naive = date.and_time(time);
    let at = match parts.utc_offset_secs {
        Some(offset) => FixedOffset::east_opt(offset)?
            .from_local_datetime(&naive)
            .single()?
            .with_timezone(&Utc),
        None => local_to_utc(naive)?,
    };
    Some(DueDate::Timed(at))
}

/// Native components for writing a due slot. Timed dues are written in UTC.
pub fn parts_from_due(due: &DueDate) -> DateParts {
    use chrono::{Datelike, Timelike};
    match due {
        DueDate::AllDay(date) => DateParts::date(date.year(), date.month(), date.day()),
        DueDate::Timed(at) => DateParts {
            year: at.year(),
            month: at.month(),
            day: at.day(),
            hour: Some(at.hour()),
            minute: Some(at.minute()),
            second: Some(at.second()),
            utc_offset_secs: Some(0),
        },
    }
}

/// Earliest absolute alarm; relative alarms are ignored.
pub fn earliest_alarm(alarms: &[NativeAlarm]) -> Option<DateTime<Utc>> {
    alarms.iter().filter_map(|a| a.absolute_date).min()
}

pub fn clamp_priority(raw: i64) -> u8 {
    raw.clamp(0, i64::from(MAX_PRIORITY)) as u8
}

/// Canonical form of a native reminder.
pub fn reminder_from_native(native: NativeReminder, now: DateTime<Utc>) -> Reminder {
    let creation_date = native.creation_date.unwrap_or(now);
    let last_modified_date = native.last_modified_date.unwrap_or(creation_date);
    Reminder {
        due: native.due.as_ref().and_then(due_from_parts),
        remind_me_date: earliest_alarm(&native.alarms),
        completion_date: native.completion_date.filter(|_| native.completed),
        priority: clamp_priority(native.priority),
        id: native.id,
        name: native.title,
        body: native.notes.filter(|n| !n.is_empty()),
        completed: native.completed,
        creation_date,
        last_modified_date,
        list_name: native.list_title,
    }
}

pub fn list_from_native(native: NativeList, reminder_count: usize) -> ReminderList {
    ReminderList {
        id: native.id,
        name: native.title,
        reminder_count,
    }
}

// ─── Wire records ────────────────────────────────────────────────────────────

pub fn reminder_to_wire(reminder: &Reminder) -> WireReminder {
    WireReminder {
        id: reminder.id.clone(),
        name: reminder.name.clone(),
        body: reminder.body.clone(),
        completed: reminder.completed,
        completion_date: reminder.completion_date.map(format_timestamp),
        due_date: reminder.due_date().map(format_timestamp),
        all_day_due_date: reminder.all_day_due_date().map(format_date),
        remind_me_date: reminder.remind_me_date.map(format_timestamp),
        priority: i64::from(reminder.priority),
        creation_date: Some(format_timestamp(reminder.creation_date)),
        last_modified_date: Some(format_timestamp(reminder.last_modified_date)),
        list_name: reminder.list_name.clone(),
    }
}

/// Canonical form of a wire reminder.
///
/// An all-day date takes precedence over a timed one if a gateway ever
/// reports both.
pub fn reminder_from_wire(wire: WireReminder, now: DateTime<Utc>) -> Reminder {
    let all_day = wire.all_day_due_date.as_deref().and_then(parse_date);
    let timed = wire.due_date.as_deref().and_then(parse_timestamp);
    let due = all_day
        .map(DueDate::AllDay)
        .or_else(|| timed.map(DueDate::Timed));
    let creation_date = wire
        .creation_date
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or(now);
    let last_modified_date = wire
        .last_modified_date
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or(creation_date);
    Reminder {
        completion_date: wire
            .completion_date
            .as_deref()
            .and_then(parse_timestamp)
            .filter(|_| wire.completed),
        remind_me_date: wire.remind_me_date.as_deref().and_then(parse_timestamp),
        priority: clamp_priority(wire.priority),
        id: wire.id,
        name: wire.name,
        body: wire.body.filter(|b| !b.is_empty()),
        completed: wire.completed,
        due,
        creation_date,
        last_modified_date,
        list_name: wire.list_name,
    }
}

pub fn list_to_wire(list: &ReminderList) -> WireList {
    WireList {
        id: list.id.clone(),
        name: list.name.clone(),
        reminder_count: list.reminder_count,
    }
}

pub fn list_from_wire(wire: WireList) -> ReminderList {
    ReminderList {
        id: wire.id,
        name: wire.name,
        reminder_count: wire.reminder_count,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn native() -> NativeReminder {
        NativeReminder {
            id: "rem-001".to_owned(),
            list_id: "list-001".to_owned(),
            list_title: "Work".to_owned(),
            title: "Prepare slides".to_owned(),
            notes: Some("Q1 review".to_owned()),
            completed: false,
            completion_date: None,
            due: None,
            alarms: vec![],
            priority: 0,
            creation_date: Some(utc(2024, 1, 1, 8, 0, 0)),
            last_modified_date: Some(utc(2024, 1, 2, 8, 0, 0)),
        }
    }

    #[test]
    fn wire_timestamp_accepts_fractional_seconds() {
        assert_eq!(
            parse_timestamp("2024-03-10T09:00:00.250Z").map(|t| t.timestamp()),
            Some(utc(2024, 3, 10, 9, 0, 0).timestamp())
        );
        assert_eq!(
            parse_timestamp("2024-03-10T09:00:00Z"),
            Some(utc(2024, 3, 10, 9, 0, 0))
        );
    }

    #[test]
    fn wire_timestamp_without_offset_is_utc() {
        assert_eq!(
            parse_timestamp("2024-03-10T09:00:00"),
            Some(utc(2024, 3, 10, 9, 0, 0))
        );
    }

    #[test]
    fn unparseable_wire_timestamp_is_absent() {
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn format_timestamp_is_utc_z() {
        assert_eq!(
            format_timestamp(utc(2024, 3, 5, 17, 30, 0)),
            "2024-03-05T17:30:00Z"
        );
    }

    #[test]
    fn due_input_date_only_is_all_day() {
        let due = parse_due_input("2024-03-10").unwrap();
        assert_eq!(
            due,
            DueDate::AllDay(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap())
        );
    }

    #[test]
    fn due_input_with_offset_normalizes_to_utc() {
        let due = parse_due_input("2024-03-10T09:00:00+02:00").unwrap();
        assert_eq!(due, DueDate::Timed(utc(2024, 3, 10, 7, 0, 0)));
    }

    #[test]
    fn due_input_garbage_is_validation_error() {
        let err = parse_due_input("next tuesday").unwrap_err();
        assert!(matches!(err, ReminderError::Validation(_)));
    }

    #[test]
    fn all_day_input_rejects_date_time() {
        assert!(parse_all_day_input("2024-03-10").is_ok());
        let err = parse_all_day_input("2024-03-10T09:00:00Z").unwrap_err();
        assert!(matches!(err, ReminderError::Validation(_)));
    }

    #[test]
    fn all_day_wins_when_both_due_forms_given() {
        let due = resolve_due(Some("2024-03-10T09:00:00Z"), Some("2024-03-12")).unwrap();
        assert_eq!(
            due,
            Some(DueDate::AllDay(NaiveDate::from_ymd_opt(2024, 3, 12).unwrap()))
        );
        assert_eq!(resolve_due(None, None).unwrap(), None);
        assert!(resolve_due(Some("bogus"), Some("2024-03-12")).is_err());
    }

    #[test]
    fn naive_instant_input_uses_local_zone() {
        let naive = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let expected = Local
            .from_local_datetime(&naive)
            .earliest()
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(parse_instant_input("2024-06-01T09:00:00").unwrap(), expected);
    }

    #[test]
    fn date_only_parts_are_all_day() {
        let due = due_from_parts(&DateParts::date(2024, 3, 5)).unwrap();
        assert!(due.is_all_day());
    }

    #[test]
    fn parts_with_time_are_timed_utc() {
        let parts = DateParts {
            hour: Some(9),
            minute: Some(15),
            second: None,
            utc_offset_secs: Some(3600),
            ..DateParts::date(2024, 3, 5)
        };
        assert_eq!(
            due_from_parts(&parts),
            Some(DueDate::Timed(utc(2024, 3, 5, 8, 15, 0)))
        );
    }

    #[test]
    fn each_due_keeps_its_own_offset() {
        // New York wall clock 09:00 on either side of the March change.
        let winter = DateParts {
            hour: Some(9),
            minute: Some(0),
            second: Some(0),
            utc_offset_secs: Some(-5 * 3600),
            ..DateParts::date(2024, 3, 1)
        };
        let summer = DateParts {
            year: 2024,
            month: 7,
            day: 1,
            utc_offset_secs: Some(-4 * 3600),
            ..winter
        };
        assert_eq!(
            due_from_parts(&winter),
            Some(DueDate::Timed(utc(2024, 3, 1, 14, 0, 0)))
        );
        assert_eq!(
            due_from_parts(&summer),
            Some(DueDate::Timed(utc(2024, 7, 1, 13, 0, 0)))
        );
    }

    #[test]
    fn invalid_parts_are_absent() {
        assert_eq!(due_from_parts(&DateParts::date(2024, 2, 30)), None);
    }

    #[test]
    fn parts_round_trip_timed_due() {
        let due = DueDate::Timed(utc(2024, 3, 10, 9, 0, 0));
        assert_eq!(due_from_parts(&parts_from_due(&due)), Some(due));
        let day = DueDate::AllDay(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        assert_eq!(due_from_parts(&parts_from_due(&day)), Some(day));
    }

    #[test]
    fn notification_is_earliest_absolute_alarm() {
        let alarms = vec![
            NativeAlarm::absolute(utc(2024, 3, 10, 9, 0, 0)),
            NativeAlarm {
                absolute_date: None,
                relative_offset_secs: Some(-600.0),
            },
            NativeAlarm::absolute(utc(2024, 3, 9, 18, 0, 0)),
        ];
        assert_eq!(earliest_alarm(&alarms), Some(utc(2024, 3, 9, 18, 0, 0)));
        assert_eq!(earliest_alarm(&[]), None);
    }

    #[test]
    fn priority_is_clamped() {
        assert_eq!(clamp_priority(-3), 0);
        assert_eq!(clamp_priority(5), 5);
        assert_eq!(clamp_priority(42), 9);
    }

    #[test]
    fn native_missing_dates_fall_back() {
        let now = utc(2024, 5, 1, 0, 0, 0);
        let mut n = native();
        n.creation_date = None;
        n.last_modified_date = None;
        let r = reminder_from_native(n, now);
        assert_eq!(r.creation_date, now);
        assert_eq!(r.last_modified_date, now);

        let mut n = native();
        n.last_modified_date = None;
        let r = reminder_from_native(n, now);
        assert_eq!(r.last_modified_date, utc(2024, 1, 1, 8, 0, 0));
    }

    #[test]
    fn native_completion_date_requires_completed() {
        let now = utc(2024, 5, 1, 0, 0, 0);
        let mut n = native();
        n.completion_date = Some(utc(2024, 2, 1, 0, 0, 0));
        assert_eq!(reminder_from_native(n.clone(), now).completion_date, None);
        n.completed = true;
        assert_eq!(
            reminder_from_native(n, now).completion_date,
            Some(utc(2024, 2, 1, 0, 0, 0))
        );
    }

    #[test]
    fn wire_round_trip_preserves_due_slot() {
        let now = utc(2024, 5, 1, 0, 0, 0);
        let mut n = native();
        n.due = Some(parts_from_due(&DueDate::Timed(utc(2024, 3, 10, 9, 0, 0))));
        let original = reminder_from_native(n, now);
        let back = reminder_from_wire(reminder_to_wire(&original), now);
        assert_eq!(back, original);
        assert_eq!(back.due_date(), Some(utc(2024, 3, 10, 9, 0, 0)));
        assert_eq!(back.all_day_due_date(), None);
    }

    #[test]
    fn wire_unparseable_due_is_absent() {
        let wire = WireReminder {
            id: "x".to_owned(),
            name: "x".to_owned(),
            body: Some(String::new()),
            completed: false,
            completion_date: None,
            due_date: Some("not a date".to_owned()),
            all_day_due_date: None,
            remind_me_date: None,
            priority: 0,
            creation_date: None,
            last_modified_date: None,
            list_name: "Inbox".to_owned(),
        };
        let r = reminder_from_wire(wire, utc(2024, 5, 1, 0, 0, 0));
        assert_eq!(r.due, None);
        assert_eq!(r.body, None);
    }
}
