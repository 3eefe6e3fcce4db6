// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory channel for tests in this and downstream crates.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tm_core::{ChannelId, Method};

use crate::message::{Message, Request};
use crate::transport::{Channel, ChannelRef, TransportError};

/// Records every message sent on it; can be switched to fail sends.
#[derive(Default)]
pub struct RecordingChannel {
    id: ChannelId,
    sent: Mutex<Vec<Message>>,
    failing: AtomicBool,
}

impl RecordingChannel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_id(id: &str) -> Arc<Self> {
        Arc::new(Self { id: ChannelId::from_string(id), ..Self::default() })
    }

    /// A channel whose sends always fail.
    pub fn failing() -> Arc<Self> {
        let channel = Self::new();
        channel.set_failing(true);
        channel
    }

    pub fn channel_ref(self: &Arc<Self>) -> ChannelRef {
        self.clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Message> {
        self.sent.lock().clone()
    }

    pub fn sent_requests(&self) -> Vec<Request> {
        self.sent.lock().iter().filter_map(|m| m.as_request().cloned()).collect()
    }

    /// Requests sent with `method`, in order.
    pub fn sent_with_method(&self, method: &Method) -> Vec<Request> {
        self.sent_requests().into_iter().filter(|r| r.method() == method).collect()
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }
}

impl Channel for RecordingChannel {
    fn id(&self) -> &ChannelId {
        &self.id
    }

    fn send(&self, message: Message) -> Result<(), TransportError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::SendFailed {
                channel: self.id.clone(),
                reason: "injected failure".to_string(),
            });
        }
        self.sent.lock().push(message);
        Ok(())
    }
}
