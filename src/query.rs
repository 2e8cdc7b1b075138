//! Query engine: filtering, canonical ordering, pagination and search.
//!
//! The canonical order is a total order over reminders:
//!
//! 1. reminders with a due date before reminders without one
//! 2. ascending due instant
//! 3. descending last-modified time
//! 4. case-insensitive name, then exact name, then identifier
//!
//! It is applied before pagination and is also the order in which name
//! lookups pick their "first match".

use std::cmp::Ordering;

use crate::error::{ReminderError, Result};
use crate::model::Reminder;

/// Page size used when the caller gives none.
pub const DEFAULT_LIMIT: usize = 50;
/// Largest page size served.
pub const MAX_LIMIT: usize = 200;

/// Filters applied before sorting and pagination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderFilter {
    /// Exact list name.
    pub list_name: Option<String>,
    /// Completion state; `None` matches both.
    pub completed: Option<bool>,
    /// Case-insensitive substring of the reminder name.
    pub name_contains: Option<String>,
}

impl ReminderFilter {
    pub fn matches(&self, reminder: &Reminder) -> bool {
        if let Some(ref list) = self.list_name
            && reminder.list_name != *list
        {
            return false;
        }
        if let Some(completed) = self.completed
            && reminder.completed != completed
        {
            return false;
        }
        match self.name_contains.as_deref() {
            Some(needle) => contains_ignore_case(&reminder.name, needle),
            None => true,
        }
    }
}

/// Case-insensitive substring test.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Canonical comparison between two reminders.
pub fn canonical_cmp(a: &Reminder, b: &Reminder) -> Ordering {
    let due_order = match (a.due, b.due) {
        (Some(da), Some(db)) => da.sort_instant().cmp(&db.sort_instant()),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    due_order
        .then_with(|| b.last_modified_date.cmp(&a.last_modified_date))
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

pub fn sort_canonical(reminders: &mut [Reminder]) {
    reminders.sort_by(canonical_cmp);
}

/// Offset/limit window over a sorted result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: usize,
    pub limit: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Resolve caller options. A zero limit is rejected; limits above
    /// [`MAX_LIMIT`] are capped.
    pub fn new(offset: Option<usize>, limit: Option<usize>) -> Result<Self> {
        let limit = match limit {
            Some(0) => {
                return Err(ReminderError::Validation(
                    "limit must be at least 1".to_owned(),
                ));
            }
            Some(n) => n.min(MAX_LIMIT),
            None => DEFAULT_LIMIT,
        };
        Ok(Self {
            offset: offset.unwrap_or(0),
            limit,
        })
    }
}

/// One page of a filtered, sorted result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Filtered count before pagination.
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            offset: self.offset,
            limit: self.limit,
            has_more: self.has_more,
        }
    }
}

/// Cut a page out of an already sorted sequence.
pub fn paginate<T>(items: Vec<T>, page: PageRequest) -> Page<T> {
    let total = items.len();
    let items: Vec<T> = items
        .into_iter()
        .skip(page.offset)
        .take(page.limit)
        .collect();
    Page {
        items,
        total,
        offset: page.offset,
        limit: page.limit,
        has_more: page.offset.saturating_add(page.limit) < total,
    }
}

/// Filter, sort canonically, and paginate.
pub fn run(reminders: Vec<Reminder>, filter: &ReminderFilter, page: PageRequest) -> Page<Reminder> {
    let mut matched: Vec<Reminder> = reminders.into_iter().filter(|r| filter.matches(r)).collect();
    sort_canonical(&mut matched);
    paginate(matched, page)
}

/// Number of reminders matching `filter`.
pub fn count(reminders: &[Reminder], filter: &ReminderFilter) -> usize {
    reminders.iter().filter(|r| filter.matches(r)).count()
}

/// First reminder named exactly `name` in `list_name`, in canonical order.
///
/// Names are not unique within a list; this is the documented resolution.
pub fn find_by_name<'a>(
    reminders: &'a [Reminder],
    list_name: &str,
    name: &str,
) -> Option<&'a Reminder> {
    reminders
        .iter()
        .filter(|r| r.list_name == list_name && r.name == name)
        .min_by(|a, b| canonical_cmp(a, b))
}
