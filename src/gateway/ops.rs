//! Gateway operations over a [`NativeStore`].
//!
//! Each method performs one logical round trip against the store: it
//! resolves the named list, reads what it needs, applies at most one write,
//! and returns the wire-shaped result.

use std::collections::HashMap;

use chrono::Utc;

use crate::error::{ReminderError, Result};
use crate::model::Reminder;
use crate::normalize;
use crate::params::{
    self, CreateReminderParams, DeleteReminderParams, ListNameParams, ListRemindersParams,
    UpdateReminderParams,
};
use crate::query::{self, PageRequest, ReminderFilter};
use crate::store::{NativeList, NativeStore, ReminderChanges, ReminderDraft};
use crate::wire::{CountResult, DeletedResult, WireList, WirePage, WireReminder};

use super::GatewayTimeouts;

/// Operation set bound to one store.
pub struct GatewayOps<'a> {
    store: &'a dyn NativeStore,
    timeouts: GatewayTimeouts,
}

impl<'a> GatewayOps<'a> {
    pub fn new(store: &'a dyn NativeStore, timeouts: GatewayTimeouts) -> Self {
        Self { store, timeouts }
    }

    // ── Lookups ──────────────────────────────────────────────────────────────

    fn find_list(&self, name: &str) -> Result<NativeList> {
        self.store
            .lists()?
            .into_iter()
            .find(|l| l.title == name)
            .ok_or_else(|| ReminderError::NotFound(format!("list \"{name}\" not found")))
    }

    fn load(&self, list: Option<&NativeList>) -> Result<Vec<Reminder>> {
        let now = Utc::now();
        let natives = self
            .store
            .reminders(list.map(|l| l.id.as_str()), self.timeouts.fetch)?;
        Ok(natives
            .into_iter()
            .map(|n| normalize::reminder_from_native(n, now))
            .collect())
    }

    fn locate(&self, list_name: &str, reminder_name: &str) -> Result<(NativeList, Reminder)> {
        let list = self.find_list(list_name)?;
        let reminders = self.load(Some(&list))?;
        let found = query::find_by_name(&reminders, &list.title, reminder_name)
            .cloned()
            .ok_or_else(|| {
                ReminderError::NotFound(format!(
                    "reminder \"{reminder_name}\" not found in list \"{list_name}\""
                ))
            })?;
        Ok((list, found))
    }

    // ── Reads ────────────────────────────────────────────────────────────────

    /// All lists with their incomplete-reminder counts.
    pub fn list_lists(&self) -> Result<Vec<WireList>> {
        let lists = self.store.lists()?;
        let mut open: HashMap<String, usize> = HashMap::new();
        for r in self.store.reminders(None, self.timeouts.fetch)? {
            if !r.completed {
                *open.entry(r.list_id).or_default() += 1;
            }
        }
        Ok(lists
            .into_iter()
            .map(|l| {
                let count = open.get(&l.id).copied().unwrap_or(0);
                normalize::list_to_wire(&normalize::list_from_native(l, count))
            })
            .collect())
    }

    fn filtered(&self, p: &ListRemindersParams) -> Result<(Vec<Reminder>, ReminderFilter)> {
        let name_contains = p.query.as_deref().map(params::check_query).transpose()?;
        let list = p.list_name.as_deref().map(|n| self.find_list(n)).transpose()?;
        let reminders = self.load(list.as_ref())?;
        let filter = ReminderFilter {
            list_name: list.map(|l| l.title),
            completed: p.completed,
            name_contains,
        };
        Ok((reminders, filter))
    }

    /// Filtered, sorted, paginated reminders. `query` turns this into a search.
    pub fn list_reminders(&self, p: &ListRemindersParams) -> Result<WirePage> {
        let page = PageRequest::new(p.offset, p.limit)?;
        let (reminders, filter) = self.filtered(p)?;
        let page = query::run(reminders, &filter, page).map(|r| normalize::reminder_to_wire(&r));
        Ok(WirePage {
            reminders: page.items,
            total: page.total,
            offset: page.offset,
            limit: page.limit,
            has_more: page.has_more,
        })
    }

    pub fn count_reminders(&self, p: &ListRemindersParams) -> Result<CountResult> {
        let (reminders, filter) = self.filtered(p)?;
        Ok(CountResult {
            count: query::count(&reminders, &filter),
        })
    }

    // ── Reminder mutations ───────────────────────────────────────────────────

    pub fn create_reminder(&self, p: &CreateReminderParams) -> Result<WireReminder> {
        let title = params::check_name(&p.name)?;
        let list_name = params::require_present("listName", &p.list_name)?;
        if let Some(ref body) = p.body {
            params::check_body(body)?;
        }
        if let Some(priority) = p.priority {
            params::check_priority(priority)?;
        }
        let due = normalize::resolve_due(p.due_date.as_deref(), p.all_day_due_date.as_deref())?;
        let alarm = p
            .remind_me_date
            .as_deref()
            .map(normalize::parse_instant_input)
            .transpose()?;

        let list = self.find_list(list_name)?;
        let draft = ReminderDraft {
            title,
            notes: p.body.clone().filter(|b| !b.is_empty()),
            due,
            alarm,
            priority: p.priority.unwrap_or(0),
        };
        let created = self.store.create_reminder(&list.id, &draft)?;
        tracing::info!(list = %list.title, id = %created.id, "reminder created");
        let reminder = normalize::reminder_from_native(created, Utc::now());
        Ok(normalize::reminder_to_wire(&reminder))
    }

    pub fn update_reminder(&self, p: &UpdateReminderParams) -> Result<WireReminder> {
        let reminder_name = params::require_present("reminderName", &p.reminder_name)?;
        let list_name = params::require_present("listName", &p.list_name)?;
        if !p.has_changes() {
            return Err(ReminderError::Validation("no updates provided".to_owned()));
        }
        let changes = changes_from_params(p)?;

        let (_, current) = self.locate(list_name, reminder_name)?;
        let updated = self.store.update_reminder(&current.id, &changes)?;
        tracing::info!(list = %list_name, id = %updated.id, "reminder updated");
        let reminder = normalize::reminder_from_native(updated, Utc::now());
        Ok(normalize::reminder_to_wire(&reminder))
    }

    pub fn delete_reminder(&self, p: &DeleteReminderParams) -> Result<DeletedResult> {
        let reminder_name = params::require_present("reminderName", &p.reminder_name)?;
        let list_name = params::require_present("listName", &p.list_name)?;
        let (_, current) = self.locate(list_name, reminder_name)?;
        self.store.delete_reminder(&current.id)?;
        tracing::info!(list = %list_name, id = %current.id, "reminder deleted");
        Ok(DeletedResult { deleted: true })
    }

    // ── List mutations ───────────────────────────────────────────────────────

    pub fn create_list(&self, p: &ListNameParams) -> Result<WireList> {
        let name = params::check_list_name(&p.name)?;
        if self.store.lists()?.iter().any(|l| l.title == name) {
            return Err(ReminderError::Validation(format!(
                "list \"{name}\" already exists"
            )));
        }
        let created = self.store.create_list(&name)?;
        tracing::info!(id = %created.id, "list created");
        Ok(normalize::list_to_wire(&normalize::list_from_native(created, 0)))
    }

    /// Delete a list; the native store removes its reminders with it.
    pub fn delete_list(&self, p: &ListNameParams) -> Result<DeletedResult> {
        let name = params::require_present("name", &p.name)?;
        let list = self.find_list(name)?;
        self.store.delete_list(&list.id)?;
        tracing::info!(id = %list.id, "list deleted");
        Ok(DeletedResult { deleted: true })
    }
}

/// Translate update parameters into store changes, validating every field.
fn changes_from_params(p: &UpdateReminderParams) -> Result<ReminderChanges> {
    let title = p.new_name.as_deref().map(params::check_name).transpose()?;
    let notes = match p.body.as_deref() {
        Some("") => Some(None),
        Some(body) => {
            params::check_body(body)?;
            Some(Some(body.to_owned()))
        }
        None => None,
    };
    if let Some(priority) = p.priority {
        params::check_priority(priority)?;
    }
    Ok(ReminderChanges {
        title,
        notes,
        due: normalize::resolve_due(p.due_date.as_deref(), p.all_day_due_date.as_deref())?,
        alarm: p
            .remind_me_date
            .as_deref()
            .map(normalize::parse_instant_input)
            .transpose()?,
        priority: p.priority,
        completed: p.completed,
    })
}
