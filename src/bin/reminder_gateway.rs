//! `reminder-gateway`: runs one reminder-store operation and exits.
//!
//! Usage: `reminder-gateway <operation> [<json payload>]`
//!
//! Prints exactly one JSON envelope line on stdout. Exit status is 0 when the
//! envelope reports success and 1 otherwise. Diagnostics go to stderr.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use anyhow::Context;
use reminder_bridge::envelope::Envelope;
use reminder_bridge::error::ReminderError;
use reminder_bridge::{gateway, store};

fn main() -> ExitCode {
    // stdout carries the envelope only.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run(std::env::args_os().skip(1).collect()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            tracing::error!("reminder-gateway failed: {e:#}");
            ExitCode::from(1)
        }
    }
}

/// Returns whether the printed envelope reported success.
fn run(args: Vec<OsString>) -> anyhow::Result<bool> {
    let envelope = match utf8_args(args) {
        Ok(args) => match args.as_slice() {
            [op] => gateway::handle(store::platform_store().as_ref(), op, "{}"),
            [op, payload] => gateway::handle(store::platform_store().as_ref(), op, payload),
            _ => Envelope::failure(&ReminderError::Validation(
                "usage: reminder-gateway <operation> [<json payload>]".to_owned(),
            )),
        },
        Err(err) => Envelope::failure(&err),
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", envelope.to_line()).context("failed to write envelope")?;
    stdout.flush().context("failed to flush stdout")?;
    Ok(envelope.success)
}

fn utf8_args(args: Vec<OsString>) -> Result<Vec<String>, ReminderError> {
    args.into_iter()
        .enumerate()
        .map(|(i, arg)| {
            arg.into_string().map_err(|_| {
                ReminderError::Validation(format!("argument {} is not valid UTF-8", i + 1))
            })
        })
        .collect()
}
