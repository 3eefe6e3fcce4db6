// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use thiserror::Error;
use tm_core::{Uri, UriError};
use tm_wire::{BodyError, TransportError};

/// Errors returned by [`crate::AgentControllerClient`] operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No response within the deadline. The remote side effect may or may
    /// not have happened.
    #[error("transaction {transaction_id} timed out after {timeout:?}")]
    Timeout { transaction_id: u64, timeout: Duration },

    /// The controller answered with a non-200 status.
    #[error("remote error {status} {reason}: {detail}")]
    Remote { status: u16, reason: String, detail: String },

    #[error("not connected")]
    NotConnected,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("body error: {0}")]
    Body(#[from] BodyError),

    #[error("not a probe uri (expected probe:<name>@<agent>): {0}")]
    InvalidProbeUri(Uri),

    #[error(transparent)]
    Uri(#[from] UriError),
}

impl ClientError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Timeout { .. })
    }
}
