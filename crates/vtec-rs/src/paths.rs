//! XDG directory helpers for config/data locations.

use std::path::PathBuf;

/// Directory holding the user config file.
///
/// Uses `VTEC_CONFIG_DIR` if set, otherwise `$XDG_CONFIG_HOME/vtec-rs` or
/// `~/.config/vtec-rs`.
pub(crate) fn config_dir() -> PathBuf {
    env_dir("VTEC_CONFIG_DIR").unwrap_or_else(|| {
        dirs::config_dir()
            .unwrap_or_else(|| home().join(".config"))
            .join("vtec-rs")
    })
}

/// Base directory for persistent data (active table, logs).
///
/// Uses `VTEC_DATA_DIR` if set, otherwise `$XDG_DATA_HOME/vtec-rs` or
/// `~/.local/share/vtec-rs`.
pub(crate) fn data_dir() -> PathBuf {
    env_dir("VTEC_DATA_DIR").unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| home().join(".local").join("share"))
            .join("vtec-rs")
    })
}

pub(crate) fn log_dir() -> PathBuf {
    data_dir().join("logs")
}

pub(crate) fn default_table_path() -> PathBuf {
    data_dir().join("active_table.jsonl")
}

fn env_dir(var: &str) -> Option<PathBuf> {
    std::env::var(var)
        .ok()
        .filter(|dir| !dir.trim().is_empty())
        .map(PathBuf::from)
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("/tmp"))
}
