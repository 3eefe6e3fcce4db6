// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ordered, duplicate-free header map.

use std::fmt;

use indexmap::IndexMap;

pub const TYPE: &str = "Type";
pub const CONTENT_ENCODING: &str = "Content-Encoding";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const TRANSACTION_ID: &str = "Transaction-Id";
pub const LOG_FILENAME: &str = "Log-Filename";
pub const LOG_CLASS: &str = "Log-Class";
pub const PROBE_URI: &str = "Probe-Uri";
pub const AGENT_URI: &str = "Agent-Uri";
pub const SUT_ADDRESS: &str = "SUT-Address";

/// Header names are case-sensitive; values are stored as their string form.
///
/// Re-setting a name replaces its value without moving it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: IndexMap<String, String>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl fmt::Display) {
        self.entries.insert(name.into(), value.to_string());
    }

    /// Set `name` only when `value` is present. `None` leaves the map untouched.
    pub fn set_opt<V: fmt::Display>(&mut self, name: impl Into<String>, value: Option<V>) {
        if let Some(value) = value {
            self.set(name, value);
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.entries.shift_remove(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: fmt::Display> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.set(name, value);
        }
        headers
    }
}

#[cfg(test)]
#[path = "headers_tests.rs"]
mod tests;
