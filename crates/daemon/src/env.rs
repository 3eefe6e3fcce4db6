// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;

use crate::lifecycle::LifecycleError;

/// Default listen address for the client-facing event channel.
pub const DEFAULT_XC_ADDR: &str = "127.0.0.1:8082";

/// Default listen address for the log/event ingestion channel.
pub const DEFAULT_IL_ADDR: &str = "127.0.0.1:8083";

/// Resolve state directory: TM_STATE_DIR > XDG_STATE_HOME/tm > ~/.local/state/tm
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("TM_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("tm"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/tm"))
}

/// Listen address for the event channel (`TM_XC_ADDR`).
pub fn xc_addr() -> String {
    non_empty("TM_XC_ADDR").unwrap_or_else(|| DEFAULT_XC_ADDR.to_string())
}

/// Listen address for the ingestion channel (`TM_IL_ADDR`).
pub fn il_addr() -> String {
    non_empty("TM_IL_ADDR").unwrap_or_else(|| DEFAULT_IL_ADDR.to_string())
}

/// Log filter used when `RUST_LOG` is unset.
pub fn log_level() -> String {
    non_empty("TM_LOG_LEVEL").unwrap_or_else(|| "info".to_string())
}

fn non_empty(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|s| !s.is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
