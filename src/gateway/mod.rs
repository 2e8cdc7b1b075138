//! Native Store Gateway: the process-side half of the envelope protocol.
//!
//! [`handle`] takes one operation name and one raw JSON payload, checks
//! store access, runs the operation against a [`NativeStore`], and always
//! returns an [`Envelope`], failures included. The `reminder-gateway`
//! binary prints that envelope as a single line on stdout.

pub mod ops;

use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;

use crate::envelope::{Envelope, GatewayOp};
use crate::error::{ReminderError, Result};
use crate::store::NativeStore;

pub use ops::GatewayOps;

/// Bound on the access prompt.
pub const PERMISSION_TIMEOUT: Duration = Duration::from_secs(20);
/// Bound on a single reminder fetch.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeouts applied inside the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayTimeouts {
    pub permission: Duration,
    pub fetch: Duration,
}

impl Default for GatewayTimeouts {
    fn default() -> Self {
        Self {
            permission: PERMISSION_TIMEOUT,
            fetch: FETCH_TIMEOUT,
        }
    }
}

/// Run one operation and wrap the outcome in an envelope.
pub fn handle(store: &dyn NativeStore, op: &str, payload: &str) -> Envelope {
    handle_with(store, op, payload, GatewayTimeouts::default())
}

/// [`handle`] with explicit timeouts.
pub fn handle_with(
    store: &dyn NativeStore,
    op: &str,
    payload: &str,
    timeouts: GatewayTimeouts,
) -> Envelope {
    let start = Instant::now();
    let outcome = op
        .parse::<GatewayOp>()
        .and_then(|op| execute(store, op, payload, timeouts));
    let elapsed_ms = start.elapsed().as_millis() as u64;
    match outcome {
        Ok(result) => {
            tracing::info!(op, elapsed_ms, "gateway operation completed");
            Envelope::success(result)
        }
        Err(err) => {
            tracing::warn!(op, elapsed_ms, kind = %err.kind(), error = %err, "gateway operation failed");
            Envelope::failure(&err)
        }
    }
}

/// Dispatch a parsed operation.
pub fn execute(
    store: &dyn NativeStore,
    op: GatewayOp,
    payload: &str,
    timeouts: GatewayTimeouts,
) -> Result<serde_json::Value> {
    let payload = parse_payload(op, payload)?;
    store.ensure_access(timeouts.permission)?;
    let ops = GatewayOps::new(store, timeouts);

    match op {
        GatewayOp::ListLists => to_value(op, ops.list_lists()?),
        GatewayOp::ListReminders => to_value(op, ops.list_reminders(&from_payload(op, payload)?)?),
        GatewayOp::CountReminders => {
            to_value(op, ops.count_reminders(&from_payload(op, payload)?)?)
        }
        GatewayOp::CreateReminder => {
            to_value(op, ops.create_reminder(&from_payload(op, payload)?)?)
        }
        GatewayOp::UpdateReminder => {
            to_value(op, ops.update_reminder(&from_payload(op, payload)?)?)
        }
        GatewayOp::DeleteReminder => {
            to_value(op, ops.delete_reminder(&from_payload(op, payload)?)?)
        }
        GatewayOp::CreateList => to_value(op, ops.create_list(&from_payload(op, payload)?)?),
        GatewayOp::DeleteList => to_value(op, ops.delete_list(&from_payload(op, payload)?)?),
    }
}

/// Parse the raw payload argument; an empty string means `{}`.
fn parse_payload(op: GatewayOp, raw: &str) -> Result<serde_json::Value> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(serde_json::Value::Object(serde_json::Map::new()));
    }
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| ReminderError::Validation(format!("invalid JSON payload for {op}: {e}")))?;
    if !value.is_object() {
        return Err(ReminderError::Validation(format!(
            "payload for {op} must be a JSON object"
        )));
    }
    Ok(value)
}

fn from_payload<T: DeserializeOwned>(op: GatewayOp, payload: serde_json::Value) -> Result<T> {
    serde_json::from_value(payload)
        .map_err(|e| ReminderError::Validation(format!("invalid payload for {op}: {e}")))
}

fn to_value<T: serde::Serialize>(op: GatewayOp, value: T) -> Result<serde_json::Value> {
    serde_json::to_value(value)
        .map_err(|e| ReminderError::Protocol(format!("failed to encode {op} result: {e}")))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::error::ErrorKind;
    use crate::store::memory::{AccessState, MemoryStore};

    const SHORT: GatewayTimeouts = GatewayTimeouts {
        permission: Duration::from_millis(50),
        fetch: Duration::from_millis(50),
    };

    #[test]
    fn unknown_operation_is_validation_failure() {
        let store = MemoryStore::new();
        let env = handle(&store, "dropEverything", "{}");
        assert!(!env.success);
        assert_eq!(env.kind, Some(ErrorKind::Validation));
    }

    #[test]
    fn empty_payload_defaults_to_object() {
        let store = MemoryStore::new();
        let env = handle(&store, "listLists", "");
        assert!(env.success);
        assert_eq!(env.result, Some(serde_json::json!([])));
    }

    #[test]
    fn non_object_payload_rejected() {
        let store = MemoryStore::new();
        let env = handle(&store, "listLists", "[1,2]");
        assert_eq!(env.kind, Some(ErrorKind::Validation));
        let env = handle(&store, "listLists", "{oops");
        assert_eq!(env.kind, Some(ErrorKind::Validation));
    }

    #[test]
    fn denied_access_fails_before_data_access() {
        let store = MemoryStore::denied();
        let env = handle(&store, "createList", r#"{"name":"Groceries"}"#);
        assert_eq!(env.kind, Some(ErrorKind::Permission));
        assert!(store.snapshot_lists().is_empty());
    }

    #[test]
    fn missing_required_field_is_validation_failure() {
        let store = MemoryStore::new();
        let env = handle(&store, "createReminder", r#"{"name":"Milk"}"#);
        assert_eq!(env.kind, Some(ErrorKind::Validation));
    }

    #[test]
    fn unanswered_access_prompt_times_out() {
        let store = MemoryStore::with_access(AccessState::Unanswered);
        let env = handle_with(&store, "listLists", "{}", SHORT);
        assert!(!env.success);
        assert_eq!(env.kind, Some(ErrorKind::Timeout));
    }

    #[test]
    fn stalled_fetch_times_out() {
        let store = MemoryStore::new().stall_fetches();
        let env = handle_with(&store, "listReminders", "{}", SHORT);
        assert_eq!(env.kind, Some(ErrorKind::Timeout));
        let env = handle_with(&store, "listLists", "{}", SHORT);
        assert_eq!(env.kind, Some(ErrorKind::Timeout));
        let env = handle_with(&store, "createList", r#"{"name":"Work"}"#, SHORT);
        assert!(env.success);
    }
}
