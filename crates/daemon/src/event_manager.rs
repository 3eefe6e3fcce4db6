// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Topic subscriptions and notification fan-out.
//!
//! Each topic is a Uri string mapped to the set of channels subscribed to it.
//! A topic exists only while it has at least one subscriber. Delivery runs
//! outside the lock on a snapshot of the subscriber set, so a slow or broken
//! subscriber never holds up subscription changes or other subscribers.

use std::collections::HashMap;

use parking_lot::Mutex;
use tm_core::{ChannelId, Uri};
use tm_wire::{ChannelRef, Request, TransportError};
use tracing::{debug, info, warn};

#[derive(Default)]
struct Subscriptions {
    topics: HashMap<String, HashMap<ChannelId, ChannelRef>>,
    clients: HashMap<ChannelId, ChannelRef>,
}

impl Subscriptions {
    fn remove_from_topic(&mut self, channel: &ChannelId, topic: &str) -> bool {
        let Some(subscribers) = self.topics.get_mut(topic) else {
            return false;
        };
        let removed = subscribers.remove(channel).is_some();
        if subscribers.is_empty() {
            self.topics.remove(topic);
        }
        removed
    }
}

/// A delivery that failed and was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub channel: ChannelId,
    pub error: TransportError,
}

/// Outcome of one [`EventManager::dispatch`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failures: Vec<DeliveryFailure>,
}

impl DispatchReport {
    /// Nobody was subscribed to the topic.
    pub fn is_empty(&self) -> bool {
        self.delivered == 0 && self.failures.is_empty()
    }
}

/// Subscription table plus the registry of connected clients.
#[derive(Default)]
pub struct EventManager {
    inner: Mutex<Subscriptions>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent.
    pub fn subscribe(&self, channel: ChannelRef, uri: &Uri) {
        let topic = uri.to_string();
        debug!(channel = %channel.id(), %topic, "subscribe");
        let mut inner = self.inner.lock();
        inner.topics.entry(topic).or_default().insert(channel.id().clone(), channel);
    }

    /// Unknown topics and non-members are a no-op.
    pub fn unsubscribe(&self, channel: &ChannelId, uri: &Uri) {
        let topic = uri.to_string();
        let removed = self.inner.lock().remove_from_topic(channel, &topic);
        if removed {
            debug!(%channel, %topic, "unsubscribe");
        } else {
            debug!(%channel, %topic, "unsubscribe: not subscribed");
        }
    }

    pub fn register_client(&self, channel: ChannelRef) {
        let mut inner = self.inner.lock();
        inner.clients.insert(channel.id().clone(), channel);
        info!(clients = inner.clients.len(), "client registered");
    }

    /// Drop the client and sweep it from every topic.
    pub fn unregister_client(&self, channel: &ChannelId) {
        let mut inner = self.inner.lock();
        inner.clients.remove(channel);
        inner.topics.retain(|_, subscribers| {
            subscribers.remove(channel);
            !subscribers.is_empty()
        });
        info!(%channel, clients = inner.clients.len(), "client unregistered");
    }

    /// Deliver `notification` to every subscriber of its Uri.
    ///
    /// Best-effort: failures are logged and reported, never raised.
    pub fn dispatch(&self, notification: &Request) -> DispatchReport {
        let topic = notification.uri().to_string();
        let subscribers: Vec<ChannelRef> = {
            let inner = self.inner.lock();
            match inner.topics.get(&topic) {
                Some(subscribers) => subscribers.values().cloned().collect(),
                None => return DispatchReport::default(),
            }
        };

        let mut report = DispatchReport::default();
        for channel in subscribers {
            match channel.send(notification.clone().into()) {
                Ok(()) => report.delivered += 1,
                Err(error) => {
                    warn!(channel = %channel.id(), %topic, %error, "notification not delivered");
                    report.failures.push(DeliveryFailure { channel: channel.id().clone(), error });
                }
            }
        }
        debug!(%topic, method = %notification.method(), delivered = report.delivered, "dispatched");
        report
    }

    pub fn client_count(&self) -> usize {
        self.inner.lock().clients.len()
    }

    pub fn topic_count(&self) -> usize {
        self.inner.lock().topics.len()
    }

    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<_> = self.inner.lock().topics.keys().cloned().collect();
        topics.sort();
        topics
    }

    pub fn subscriber_count(&self, uri: &Uri) -> usize {
        self.inner.lock().topics.get(&uri.to_string()).map_or(0, HashMap::len)
    }

    pub fn is_subscribed(&self, channel: &ChannelId, uri: &Uri) -> bool {
        self.inner
            .lock()
            .topics
            .get(&uri.to_string())
            .is_some_and(|subscribers| subscribers.contains_key(channel))
    }
}

#[cfg(test)]
#[path = "event_manager_tests.rs"]
mod tests;
