//! Client side of the gateway protocol.
//!
//! [`RemindersClient`] is the entry point for callers. It validates inputs,
//! sends one request through a [`StoreGateway`], and converts the wire
//! records it gets back into the canonical [`Reminder`] and [`ReminderList`]
//! types.
//!
//! Two gateways share the same envelope contract:
//! - [`ProcessGateway`] runs the `reminder-gateway` binary, building it
//!   first if needed
//! - [`InProcessGateway`] calls the gateway dispatcher directly over any
//!   [`NativeStore`]

use std::process::Command;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::BridgeConfig;
use crate::envelope::{self, GatewayOp};
use crate::error::{ReminderError, Result};
use crate::gateway::{self, GatewayTimeouts};
use crate::helper::HelperManager;
use crate::model::{Reminder, ReminderList};
use crate::normalize;
use crate::params::{
    self, CreateReminderParams, DeleteReminderParams, ListNameParams, ListRemindersParams,
    SearchRemindersParams, UpdateReminderParams,
};
use crate::process::{self, Outcome};
use crate::query::{Page, PageRequest};
use crate::store::NativeStore;
use crate::wire::{CountResult, DeletedResult, WireList, WirePage, WireReminder};

/// One synchronous request/response exchange with the native store.
pub trait StoreGateway: Send + Sync {
    /// Send `payload` (a JSON object) for `op` and return the success result.
    ///
    /// Failure envelopes come back as the matching [`ReminderError`].
    fn invoke(&self, op: GatewayOp, payload: &str) -> Result<serde_json::Value>;
}

// ─── Subprocess gateway ──────────────────────────────────────────────────────

/// Runs each operation in a fresh `reminder-gateway` process.
pub struct ProcessGateway {
    helper: Arc<HelperManager>,
    call_timeout: Duration,
}

impl ProcessGateway {
    pub fn new(helper: Arc<HelperManager>, call_timeout: Duration) -> Self {
        Self {
            helper,
            call_timeout,
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(
            HelperManager::for_config(&config.gateway),
            config.gateway.call_timeout(),
        )
    }

    pub fn helper(&self) -> &Arc<HelperManager> {
        &self.helper
    }
}

impl StoreGateway for ProcessGateway {
    fn invoke(&self, op: GatewayOp, payload: &str) -> Result<serde_json::Value> {
        let binary = self.helper.ensure_ready()?;
        let start = Instant::now();
        let mut cmd = Command::new(&binary);
        cmd.arg(op.as_str()).arg(payload);

        let finished = match process::run_bounded(cmd, self.call_timeout) {
            Ok(Outcome::Finished(done)) => done,
            Ok(Outcome::TimedOut) => {
                tracing::warn!(%op, "gateway call timed out, process killed");
                return Err(ReminderError::Timeout(format!(
                    "gateway operation {op} did not finish within {}s",
                    self.call_timeout.as_secs()
                )));
            }
            Err(e) => {
                return Err(ReminderError::Gateway(format!(
                    "failed to launch gateway {}: {e}",
                    binary.display()
                )));
            }
        };
        let elapsed_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(%op, elapsed_ms, code = ?finished.status.code(), "gateway call finished");

        match envelope::parse_envelope(op, &finished.stdout) {
            Ok(env) => env.into_result(op),
            Err(unparseable) if finished.status.success() => Err(unparseable),
            Err(_) => {
                let code = finished
                    .status
                    .code()
                    .map_or_else(|| "signal".to_owned(), |c| c.to_string());
                Err(ReminderError::Gateway(format!(
                    "gateway process exited with status {code}: {}",
                    process::excerpt(&finished.stderr)
                )))
            }
        }
    }
}

// ─── In-process gateway ──────────────────────────────────────────────────────

/// Runs operations on the calling thread against a native store.
///
/// Responses still go through envelope encoding and parsing.
pub struct InProcessGateway<S> {
    store: S,
    timeouts: GatewayTimeouts,
}

impl<S: NativeStore> InProcessGateway<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            timeouts: GatewayTimeouts::default(),
        }
    }

    pub fn with_timeouts(store: S, timeouts: GatewayTimeouts) -> Self {
        Self { store, timeouts }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: NativeStore> StoreGateway for InProcessGateway<S> {
    fn invoke(&self, op: GatewayOp, payload: &str) -> Result<serde_json::Value> {
        let line = gateway::handle_with(&self.store, op.as_str(), payload, self.timeouts).to_line();
        envelope::parse_envelope(op, &line)?.into_result(op)
    }
}

// ─── Facade ──────────────────────────────────────────────────────────────────

/// Typed access to reminders and lists.
pub struct RemindersClient<G> {
    gateway: G,
}

impl RemindersClient<ProcessGateway> {
    /// Client over the gateway process described by `config`.
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(ProcessGateway::from_config(config))
    }

    /// Client using the config file at its standard location.
    pub fn connect() -> Result<Self> {
        Ok(Self::from_config(&BridgeConfig::load()?))
    }
}

impl<G: StoreGateway> RemindersClient<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    fn call<P: Serialize, T: DeserializeOwned>(&self, op: GatewayOp, payload: &P) -> Result<T> {
        let raw = envelope::encode_payload(op, payload)?;
        let value = self.gateway.invoke(op, &raw)?;
        envelope::decode_value(op, value)
    }

    /// All lists with their incomplete-reminder counts.
    pub fn list_lists(&self) -> Result<Vec<ReminderList>> {
        let lists: Vec<WireList> =
            self.call(GatewayOp::ListLists, &serde_json::json!({}))?;
        Ok(lists.into_iter().map(normalize::list_from_wire).collect())
    }

    /// Filtered reminders in canonical order, one page at a time.
    pub fn list_reminders(&self, p: &ListRemindersParams) -> Result<Page<Reminder>> {
        PageRequest::new(p.offset, p.limit)?;
        if let Some(ref query) = p.query {
            params::check_query(query)?;
        }
        let page: WirePage = self.call(GatewayOp::ListReminders, p)?;
        Ok(page_from_wire(page))
    }

    /// Number of reminders matching the filters, ignoring pagination.
    pub fn count_reminders(&self, p: &ListRemindersParams) -> Result<usize> {
        if let Some(ref query) = p.query {
            params::check_query(query)?;
        }
        let count: CountResult = self.call(GatewayOp::CountReminders, p)?;
        Ok(count.count)
    }

    /// Case-insensitive name search. An empty page is a valid answer.
    pub fn search_reminders(&self, p: &SearchRemindersParams) -> Result<Page<Reminder>> {
        params::check_query(&p.query)?;
        self.list_reminders(&p.clone().into())
    }

    pub fn create_reminder(&self, p: &CreateReminderParams) -> Result<Reminder> {
        params::check_name(&p.name)?;
        params::require_present("listName", &p.list_name)?;
        if let Some(ref body) = p.body {
            params::check_body(body)?;
        }
        if let Some(priority) = p.priority {
            params::check_priority(priority)?;
        }
        normalize::resolve_due(p.due_date.as_deref(), p.all_day_due_date.as_deref())?;
        if let Some(ref at) = p.remind_me_date {
            normalize::parse_instant_input(at)?;
        }
        let wire: WireReminder = self.call(GatewayOp::CreateReminder, p)?;
        Ok(normalize::reminder_from_wire(wire, Utc::now()))
    }

    /// Update the first reminder named `reminder_name` in `list_name`.
    pub fn update_reminder(&self, p: &UpdateReminderParams) -> Result<Reminder> {
        params::require_present("reminderName", &p.reminder_name)?;
        params::require_present("listName", &p.list_name)?;
        if !p.has_changes() {
            return Err(ReminderError::Validation("no updates provided".to_owned()));
        }
        if let Some(ref name) = p.new_name {
            params::check_name(name)?;
        }
        if let Some(priority) = p.priority {
            params::check_priority(priority)?;
        }
        let wire: WireReminder = self.call(GatewayOp::UpdateReminder, p)?;
        Ok(normalize::reminder_from_wire(wire, Utc::now()))
    }

    pub fn delete_reminder(&self, p: &DeleteReminderParams) -> Result<()> {
        params::require_present("reminderName", &p.reminder_name)?;
        params::require_present("listName", &p.list_name)?;
        let _: DeletedResult = self.call(GatewayOp::DeleteReminder, p)?;
        Ok(())
    }

    pub fn create_list(&self, name: &str) -> Result<ReminderList> {
        let name = params::check_list_name(name)?;
        let wire: WireList = self.call(GatewayOp::CreateList, &ListNameParams { name })?;
        Ok(normalize::list_from_wire(wire))
    }

    /// Delete a list and every reminder in it.
    pub fn delete_list(&self, name: &str) -> Result<()> {
        let name = params::require_present("name", name)?.to_owned();
        let _: DeletedResult = self.call(GatewayOp::DeleteList, &ListNameParams { name })?;
        Ok(())
    }
}

fn page_from_wire(page: WirePage) -> Page<Reminder> {
    let now = Utc::now();
    Page {
        items: page.reminders,
        total: page.total,
        offset: page.offset,
        limit: page.limit,
        has_more: page.has_more,
    }
    .map(|wire| normalize::reminder_from_wire(wire, now))
}
