// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pending-transaction table: transaction id -> one-shot response slot.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tm_wire::{Envelope, Response};
use tokio::sync::oneshot;

/// Why an inbound response matched no waiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unmatched {
    MissingTransactionId,
    UnknownTransaction(u64),
    /// The caller gave up (timed out) between lookup and delivery.
    WaiterGone(u64),
}

pub struct PendingTransactions {
    next_id: AtomicU64,
    waiters: Mutex<HashMap<u64, oneshot::Sender<Response>>>,
}

impl Default for PendingTransactions {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingTransactions {
    pub fn new() -> Self {
        Self { next_id: AtomicU64::new(1), waiters: Mutex::new(HashMap::new()) }
    }

    /// Allocate a fresh transaction id and its response slot.
    pub fn register(&self) -> (u64, oneshot::Receiver<Response>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.waiters.lock().insert(id, tx);
        (id, rx)
    }

    /// Hand a response to the waiter registered under its `Transaction-Id`.
    pub fn resolve(&self, response: Response) -> Result<u64, Unmatched> {
        let id = response.transaction_id().ok_or(Unmatched::MissingTransactionId)?;
        let waiter = self.waiters.lock().remove(&id).ok_or(Unmatched::UnknownTransaction(id))?;
        waiter.send(response).map_err(|_| Unmatched::WaiterGone(id))?;
        Ok(id)
    }

    /// Drop the slot for `id`. Returns whether one existed.
    pub fn cancel(&self, id: u64) -> bool {
        self.waiters.lock().remove(&id).is_some()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.waiters.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.waiters.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiters.lock().is_empty()
    }
}

#[cfg(test)]
#[path = "pending_tests.rs"]
mod tests;
