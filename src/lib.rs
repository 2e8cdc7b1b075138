//! Reminder Bridge: typed access to the macOS Reminders store.
//!
//! Reminders live in a store that only a native process can reach, so the
//! crate is split in two halves that speak a one-line JSON envelope protocol:
//!
//! - **Gateway** ([`gateway`], `reminder-gateway` binary): runs one operation
//!   against a [`store::NativeStore`] and prints the envelope
//! - **Client** ([`client`]): validates input, runs the gateway (building it
//!   on demand through [`helper`]), and converts results into the canonical
//!   [`model`] types
//!
//! Between them sit the [`envelope`] codec, the [`normalize`] layer that
//! turns native and wire records into canonical ones, and the [`query`]
//! engine that filters, orders and pages reminders.

pub mod bridge_dirs;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod helper;
pub mod model;
pub mod normalize;
pub mod params;
mod process;
pub mod query;
pub mod store;
pub mod wire;

pub use client::{InProcessGateway, ProcessGateway, RemindersClient, StoreGateway};
pub use config::BridgeConfig;
pub use error::{ErrorKind, ReminderError, Result};
pub use helper::{BuildRecipe, HelperManager};
pub use model::{DueDate, PriorityLevel, Reminder, ReminderList};
pub use query::Page;
