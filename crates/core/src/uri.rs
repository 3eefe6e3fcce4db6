// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-plane addresses: `scheme:[user@]domain`.
//!
//! A Uri names a topic for subscriptions (`job:42`), a probe on an agent
//! (`probe:p1@agentA`), an agent (`agent:agentA`) or a system service
//! (`system:tacs`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smol_str::SmolStr;
use thiserror::Error;

pub const PROBE_SCHEME: &str = "probe";
pub const AGENT_SCHEME: &str = "agent";
pub const SYSTEM_SCHEME: &str = "system";
pub const JOB_SCHEME: &str = "job";

/// Errors from parsing or building a [`Uri`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UriError {
    #[error("missing ':' separator in uri '{0}'")]
    MissingScheme(String),

    #[error("empty {part} in uri '{uri}'")]
    EmptyPart { part: &'static str, uri: String },

    #[error("invalid character in uri '{0}'")]
    InvalidCharacter(String),
}

/// Immutable `scheme:[user@]domain` address.
///
/// Parts are validated so that the string form is unambiguous: two Uris are
/// equal exactly when their string forms are.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uri {
    scheme: SmolStr,
    user: Option<SmolStr>,
    domain: SmolStr,
}

impl Uri {
    /// Build a Uri from its parts, validating each of them.
    pub fn new(scheme: &str, user: Option<&str>, domain: &str) -> Result<Self, UriError> {
        let render = || match user {
            Some(user) => format!("{scheme}:{user}@{domain}"),
            None => format!("{scheme}:{domain}"),
        };
        if scheme.is_empty() {
            return Err(UriError::EmptyPart { part: "scheme", uri: render() });
        }
        if domain.is_empty() {
            return Err(UriError::EmptyPart { part: "domain", uri: render() });
        }
        if user.is_some_and(str::is_empty) {
            return Err(UriError::EmptyPart { part: "user", uri: render() });
        }
        let bad_scheme = scheme.contains([':', '@']);
        let bad_user = user.is_some_and(|u| u.contains('@'));
        // Without a user part, an '@' in the domain would be re-read as one.
        let bad_domain = user.is_none() && domain.contains('@');
        let has_space = [Some(scheme), user, Some(domain)]
            .into_iter()
            .flatten()
            .any(|part| part.chars().any(char::is_whitespace));
        if bad_scheme || bad_user || bad_domain || has_space {
            return Err(UriError::InvalidCharacter(render()));
        }
        Ok(Self { scheme: scheme.into(), user: user.map(SmolStr::from), domain: domain.into() })
    }

    /// `probe:<name>@<agent>`
    pub fn probe(name: &str, agent: &str) -> Result<Self, UriError> {
        Self::new(PROBE_SCHEME, Some(name), agent)
    }

    /// `agent:<name>`
    pub fn agent(name: &str) -> Result<Self, UriError> {
        Self::new(AGENT_SCHEME, None, name)
    }

    /// `system:<domain>`
    pub fn system(domain: &str) -> Result<Self, UriError> {
        Self::new(SYSTEM_SCHEME, None, domain)
    }

    /// `job:<id>`
    pub fn job(id: impl fmt::Display) -> Result<Self, UriError> {
        Self::new(JOB_SCHEME, None, &id.to_string())
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn is_probe(&self) -> bool {
        self.scheme == PROBE_SCHEME && self.user.is_some()
    }

    /// For `probe:<name>@<agent>`, returns `(name, agent)`.
    pub fn probe_parts(&self) -> Option<(&str, &str)> {
        if !self.is_probe() {
            return None;
        }
        Some((self.user.as_deref()?, &self.domain))
    }

    /// For `probe:<name>@<agent>`, returns `agent:<agent>`.
    pub fn agent_of_probe(&self) -> Option<Uri> {
        let (_, agent) = self.probe_parts()?;
        Uri::agent(agent).ok()
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.user {
            Some(user) => write!(f, "{}:{}@{}", self.scheme, user, self.domain),
            None => write!(f, "{}:{}", self.scheme, self.domain),
        }
    }
}

impl FromStr for Uri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, rest) = s.split_once(':').ok_or_else(|| UriError::MissingScheme(s.into()))?;
        match rest.split_once('@') {
            Some((user, domain)) => Self::new(scheme, Some(user), domain),
            None => Self::new(scheme, None, rest),
        }
    }
}

impl TryFrom<&str> for Uri {
    type Error = UriError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl Serialize for Uri {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Uri {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "uri_tests.rs"]
mod tests;
