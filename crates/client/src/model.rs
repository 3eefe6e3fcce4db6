// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Controller-side records and inbound client events.

use serde::{Deserialize, Serialize};
use tm_core::{Method, Uri};
use tm_wire::{headers, ApplicationBody, BodyError, Envelope, Request};

/// A probe as reported by `GET-PROBES` / `GET-PROBE`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ProbeInfo {
    pub name: String,
    pub agent: String,
    #[serde(rename = "type")]
    pub probe_type: String,
    pub locked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_by: Option<String>,
}

impl ProbeInfo {
    /// `probe:<name>@<agent>`, if both parts are usable.
    pub fn uri(&self) -> Option<Uri> {
        Uri::probe(&self.name, &self.agent).ok()
    }
}

/// An agent as reported by `GET-AGENTS`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AgentInfo {
    pub name: String,
    pub version: String,
    pub branch: Option<String>,
    pub address: Option<String>,
    pub probes: Vec<String>,
}

/// Notifications surfaced to the embedding application.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// A message a probe received from the SUT (`TRI-ENQUEUE-MSG`).
    EnqueuedMessage {
        probe: Uri,
        sut_address: Option<String>,
        message: ApplicationBody,
    },
    /// A log line (`LOG`).
    Log {
        uri: Uri,
        class: Option<String>,
        filename: Option<String>,
        text: String,
    },
    /// A probe state change (`PROBE-EVENT`).
    ProbeEvent { probe: Uri, event: serde_json::Value },
}

impl ClientEvent {
    /// Map a notification to an event. `Ok(None)` for methods the client
    /// does not surface.
    pub fn from_notification(notification: &Request) -> Result<Option<Self>, BodyError> {
        let uri = notification.uri().clone();
        let event = match notification.method() {
            Method::TriEnqueueMsg => ClientEvent::EnqueuedMessage {
                probe: uri,
                sut_address: notification.header(headers::SUT_ADDRESS).map(str::to_string),
                message: notification.application_body()?,
            },
            Method::Log => ClientEvent::Log {
                uri,
                class: notification.header(headers::LOG_CLASS).map(str::to_string),
                filename: notification.header(headers::LOG_FILENAME).map(str::to_string),
                text: String::from_utf8_lossy(notification.body()).into_owned(),
            },
            Method::ProbeEvent => ClientEvent::ProbeEvent {
                probe: uri,
                event: if notification.body().is_empty() {
                    serde_json::Value::Null
                } else {
                    notification.json_body()?
                },
            },
            _ => return Ok(None),
        };
        Ok(Some(event))
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
