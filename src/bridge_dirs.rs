//! Filesystem locations used by the bridge.
//!
//! Uses the [`dirs`] crate for platform-appropriate resolution.
//!
//! | Purpose | macOS | Linux |
//! |---------|-------|-------|
//! | Config | `~/Library/Application Support/reminder-bridge/` | `~/.config/reminder-bridge/` |
//! | Cache | `~/Library/Caches/reminder-bridge/` | `~/.cache/reminder-bridge/` |
//!
//! # Environment Overrides
//!
//! - `REMINDER_BRIDGE_CONFIG_DIR` overrides [`config_dir`]
//! - `REMINDER_BRIDGE_CACHE_DIR` overrides [`cache_dir`]

use std::path::PathBuf;

const APP_DIR: &str = "reminder-bridge";

/// Config directory. Holds `config.toml`.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("REMINDER_BRIDGE_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| std::env::temp_dir().join("reminder-bridge-config"))
}

/// Cache directory. Holds the compiled gateway and its build tree.
#[must_use]
pub fn cache_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("REMINDER_BRIDGE_CACHE_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::cache_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| std::env::temp_dir().join("reminder-bridge-cache"))
}

/// Main config file path (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Where the compiled gateway binary is kept (`cache_dir()/bin/`).
#[must_use]
pub fn helper_bin_dir() -> PathBuf {
    cache_dir().join("bin")
}

/// Cargo target directory for gateway builds (`cache_dir()/target/`).
#[must_use]
pub fn build_target_dir() -> PathBuf {
    cache_dir().join("target")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_paths_sit_under_their_roots() {
        assert!(config_file().starts_with(config_dir()));
        assert!(helper_bin_dir().starts_with(cache_dir()));
        assert!(build_target_dir().starts_with(cache_dir()));
    }

    #[test]
    fn file_names_are_stable() {
        assert_eq!(
            config_file().file_name().and_then(|n| n.to_str()),
            Some("config.toml")
        );
    }
}
