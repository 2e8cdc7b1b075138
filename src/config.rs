//! Bridge configuration, stored as TOML.
//!
//! ```toml
//! [gateway]
//! call_timeout_secs = 90
//! build_timeout_secs = 600
//! # binary = "/usr/local/bin/reminder-gateway"
//!
//! # [gateway.build]
//! # program = "make"
//! # args = ["gateway"]
//! # output = "/opt/bridge/out/reminder-gateway"
//! # sources = ["/opt/bridge/src"]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ReminderError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub gateway: GatewayConfig,
}

/// How the client reaches the gateway process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Prebuilt gateway binary. When set, nothing is ever built and the path
    /// only has to exist.
    pub binary: Option<PathBuf>,
    /// Crate directory the default recipe builds from. Defaults to the
    /// directory this library was compiled from.
    pub source_dir: Option<PathBuf>,
    /// Upper bound on one gateway call, including process start-up.
    pub call_timeout_secs: u64,
    /// Upper bound on one helper build.
    pub build_timeout_secs: u64,
    /// Custom build recipe replacing the default `cargo build`.
    pub build: Option<BuildConfig>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            binary: None,
            source_dir: None,
            call_timeout_secs: 90,
            build_timeout_secs: 600,
            build: None,
        }
    }
}

impl GatewayConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn build_timeout(&self) -> Duration {
        Duration::from_secs(self.build_timeout_secs)
    }

    /// Crate directory used by the default build recipe.
    pub fn source_dir(&self) -> PathBuf {
        self.source_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")))
    }
}

/// A custom command that produces the gateway binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Path the command writes the binary to.
    pub output: PathBuf,
    /// Files or directories whose modification makes the binary stale.
    #[serde(default)]
    pub sources: Vec<PathBuf>,
}

impl BridgeConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ReminderError::Config`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ReminderError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        toml::from_str(&content)
            .map_err(|e| ReminderError::Config(format!("invalid {}: {e}", path.display())))
    }

    /// Load `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load the config file at its standard location.
    pub fn load() -> Result<Self> {
        Self::load_or_default(&crate::bridge_dirs::config_file())
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`ReminderError::Config`] if the file cannot be written.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ReminderError::Config(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ReminderError::Config(e.to_string()))?;
        std::fs::write(path, content)
            .map_err(|e| ReminderError::Config(format!("cannot write {}: {e}", path.display())))
    }
}
