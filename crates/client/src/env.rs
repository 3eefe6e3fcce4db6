// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the client crate.

use std::time::Duration;

pub const DEFAULT_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_RECONNECT_MS: u64 = 1000;

/// Default request timeout (`TM_IA_TIMEOUT_MS`).
pub fn request_timeout() -> Duration {
    Duration::from_millis(millis("TM_IA_TIMEOUT_MS").unwrap_or(DEFAULT_TIMEOUT_MS))
}

/// Delay between reconnect attempts (`TM_RECONNECT_MS`).
pub fn reconnect_delay() -> Duration {
    Duration::from_millis(millis("TM_RECONNECT_MS").unwrap_or(DEFAULT_RECONNECT_MS))
}

fn millis(var: &str) -> Option<u64> {
    std::env::var(var).ok().and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
