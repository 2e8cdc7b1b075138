//! Envelope codec for the gateway protocol.
//!
//! Every gateway response is one line of JSON:
//!
//! ```json
//! {"success":true,"result":{"count":3}}
//! {"success":false,"error":"list \"Groceries\" not found","kind":"not_found"}
//! ```
//!
//! `kind` is optional; a failure without it is reported as
//! [`ReminderError::Gateway`].

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, ReminderError, Result};

/// The closed set of gateway operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOp {
    ListLists,
    ListReminders,
    CountReminders,
    CreateReminder,
    UpdateReminder,
    DeleteReminder,
    CreateList,
    DeleteList,
}

impl GatewayOp {
    pub fn all() -> &'static [GatewayOp] {
        &[
            GatewayOp::ListLists,
            GatewayOp::ListReminders,
            GatewayOp::CountReminders,
            GatewayOp::CreateReminder,
            GatewayOp::UpdateReminder,
            GatewayOp::DeleteReminder,
            GatewayOp::CreateList,
            GatewayOp::DeleteList,
        ]
    }

    /// Wire name passed as the gateway's first argument.
    pub fn as_str(self) -> &'static str {
        match self {
            GatewayOp::ListLists => "listLists",
            GatewayOp::ListReminders => "listReminders",
            GatewayOp::CountReminders => "countReminders",
            GatewayOp::CreateReminder => "createReminder",
            GatewayOp::UpdateReminder => "updateReminder",
            GatewayOp::DeleteReminder => "deleteReminder",
            GatewayOp::CreateList => "createList",
            GatewayOp::DeleteList => "deleteList",
        }
    }
}

impl fmt::Display for GatewayOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GatewayOp {
    type Err = ReminderError;

    fn from_str(s: &str) -> Result<Self> {
        GatewayOp::all()
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| ReminderError::Validation(format!("unknown operation: {s}")))
    }
}

/// Discriminated success/failure wrapper around every gateway response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl Envelope {
    pub fn success(result: serde_json::Value) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
            kind: None,
        }
    }

    pub fn failure(err: &ReminderError) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(err.message().to_owned()),
            kind: Some(err.kind()),
        }
    }

    /// Serialize as a single line (no trailing newline).
    pub fn to_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"success":false,"error":"failed to encode envelope: {}","kind":"protocol"}}"#,
                e.to_string().replace('"', "'")
            )
        })
    }

    /// Convert into the operation outcome.
    pub fn into_result(self, op: GatewayOp) -> Result<serde_json::Value> {
        if self.success {
            return self.result.ok_or_else(|| {
                ReminderError::Protocol(format!("gateway response for {op} is missing `result`"))
            });
        }
        let message = self
            .error
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("gateway reported failure for {op} without a message"));
        Err(ReminderError::from_kind(
            self.kind.unwrap_or(ErrorKind::Gateway),
            message,
        ))
    }
}

/// Serialize an outbound payload.
pub fn encode_payload<P: Serialize>(op: GatewayOp, payload: &P) -> Result<String> {
    let value = serde_json::to_value(payload)
        .map_err(|e| ReminderError::Protocol(format!("failed to encode {op} payload: {e}")))?;
    if !value.is_object() {
        return Err(ReminderError::Protocol(format!(
            "{op} payload must be a JSON object"
        )));
    }
    Ok(value.to_string())
}

/// Parse raw gateway output into an envelope.
///
/// The last non-empty line is taken as the envelope; anything empty or
/// non-JSON is a protocol error.
pub fn parse_envelope(op: GatewayOp, output: &str) -> Result<Envelope> {
    let line = output
        .lines()
        .map(str::trim)
        .rfind(|l| !l.is_empty())
        .ok_or_else(|| unparseable(op))?;
    serde_json::from_str(line).map_err(|e| {
        tracing::debug!(%op, error = %e, "gateway output is not an envelope");
        unparseable(op)
    })
}

/// Parse raw gateway output and decode the success payload as `T`.
pub fn decode<T: DeserializeOwned>(op: GatewayOp, output: &str) -> Result<T> {
    let value = parse_envelope(op, output)?.into_result(op)?;
    decode_value(op, value)
}

/// Decode an already extracted success payload.
pub fn decode_value<T: DeserializeOwned>(op: GatewayOp, value: serde_json::Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| ReminderError::Protocol(format!("unexpected {op} result shape: {e}")))
}

fn unparseable(op: GatewayOp) -> ReminderError {
    ReminderError::Protocol(format!(
        "gateway returned empty/unparseable response for operation {op}"
    ))
}
