// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Boundary between the protocol layer and whatever carries its bytes.
//!
//! A [`Channel`] is the sending side of one live connection. A
//! [`ConnectionHandler`] receives everything that arrives on it, in arrival
//! order, from the connection's single reader task.

use std::sync::Arc;

use thiserror::Error;
use tm_core::ChannelId;

use crate::message::{Message, Request, Response};

/// Errors handing a message to a transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("channel {0} is closed")]
    Closed(ChannelId),

    #[error("send on channel {channel} failed: {reason}")]
    SendFailed { channel: ChannelId, reason: String },
}

/// Sending side of a connection. `send` queues and returns without waiting
/// for the bytes to leave.
pub trait Channel: Send + Sync {
    fn id(&self) -> &ChannelId;
    fn send(&self, message: Message) -> Result<(), TransportError>;
}

pub type ChannelRef = Arc<dyn Channel>;

/// Inbound callbacks for one connection.
pub trait ConnectionHandler: Send + Sync {
    fn on_connection(&self, _channel: &ChannelRef) {}

    fn on_disconnection(&self, _channel: &ChannelRef) {}

    fn on_request(&self, channel: &ChannelRef, request: Request);

    fn on_notification(&self, channel: &ChannelRef, notification: Request);

    fn on_response(&self, channel: &ChannelRef, response: Response);
}

/// Hand a parsed message to the matching handler callback.
pub fn route<H: ConnectionHandler + ?Sized>(handler: &H, channel: &ChannelRef, message: Message) {
    match message {
        Message::Request(request) if request.is_notification() => {
            handler.on_notification(channel, request)
        }
        Message::Request(request) => handler.on_request(channel, request),
        Message::Response(response) => handler.on_response(channel, response),
    }
}
