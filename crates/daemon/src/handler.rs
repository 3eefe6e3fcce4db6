// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection handlers for the two server-side channels.

use std::sync::Arc;

use tm_core::Method;
use tm_wire::{ChannelRef, ConnectionHandler, Request, Response};
use tracing::{debug, warn};

use crate::event_manager::EventManager;
use crate::log_ingest::LogIngestor;

/// Answer a request this channel does not serve.
fn reject_request(channel: &ChannelRef, request: &Request) {
    warn!(channel = %channel.id(), method = %request.method(), "request not supported here");
    if let Err(e) = channel.send(request.reply(501, "Not Implemented").into()) {
        warn!(channel = %channel.id(), error = %e, "failed to send rejection");
    }
}

/// Client-facing event channel: subscription management and publishing.
pub struct EventChannelHandler {
    events: Arc<EventManager>,
}

impl EventChannelHandler {
    pub fn new(events: Arc<EventManager>) -> Self {
        Self { events }
    }
}

impl ConnectionHandler for EventChannelHandler {
    fn on_connection(&self, channel: &ChannelRef) {
        self.events.register_client(channel.clone());
    }

    fn on_disconnection(&self, channel: &ChannelRef) {
        self.events.unregister_client(channel.id());
    }

    fn on_request(&self, channel: &ChannelRef, request: Request) {
        reject_request(channel, &request);
    }

    fn on_notification(&self, channel: &ChannelRef, notification: Request) {
        match notification.method() {
            Method::Subscribe => self.events.subscribe(channel.clone(), notification.uri()),
            Method::Unsubscribe => self.events.unsubscribe(channel.id(), notification.uri()),
            Method::Message => {
                self.events.dispatch(&notification);
            }
            other => {
                debug!(channel = %channel.id(), method = %other, "ignoring notification")
            }
        }
    }

    fn on_response(&self, channel: &ChannelRef, response: Response) {
        debug!(channel = %channel.id(), status = response.status(), "ignoring response");
    }
}

/// Log/event ingestion channel.
pub struct IngestChannelHandler {
    ingestor: Arc<LogIngestor>,
}

impl IngestChannelHandler {
    pub fn new(ingestor: Arc<LogIngestor>) -> Self {
        Self { ingestor }
    }
}

impl ConnectionHandler for IngestChannelHandler {
    fn on_request(&self, channel: &ChannelRef, request: Request) {
        reject_request(channel, &request);
    }

    fn on_notification(&self, channel: &ChannelRef, notification: Request) {
        if let Err(e) = self.ingestor.ingest(&notification) {
            warn!(channel = %channel.id(), error = %e, "notification rejected");
        }
    }

    fn on_response(&self, channel: &ChannelRef, response: Response) {
        debug!(channel = %channel.id(), status = response.status(), "ignoring response");
    }
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
