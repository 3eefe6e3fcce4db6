// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for accepting socket connections.
//!
//! Each accepted stream becomes a framed connection served by the listener's
//! handler. The listener runs until its shutdown token fires, then closes
//! every connection it still owns. Closed connections are dropped as soon
//! as they close.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tm_wire::{spawn_connection, Connection, ConnectionHandler};
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Accept loop for one channel kind.
pub struct Listener {
    name: &'static str,
    tcp: TcpListener,
    handler: Arc<dyn ConnectionHandler>,
    open: Arc<AtomicUsize>,
}

impl Listener {
    pub async fn bind(
        name: &'static str,
        addr: &str,
        handler: Arc<dyn ConnectionHandler>,
    ) -> io::Result<Self> {
        let tcp = TcpListener::bind(addr).await?;
        Ok(Self { name, tcp, handler, open: Arc::new(AtomicUsize::new(0)) })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.tcp.local_addr()
    }

    /// Live count of connections this listener still serves.
    pub fn open_connections(&self) -> Arc<AtomicUsize> {
        self.open.clone()
    }

    /// Run the accept loop until `shutdown` is cancelled.
    ///
    /// Each connection is watched by its own task, reaped as soon as it
    /// closes; on shutdown the remaining ones are closed and awaited.
    pub async fn run(self, shutdown: CancellationToken) {
        if let Ok(addr) = self.local_addr() {
            info!(listener = self.name, %addr, "listening");
        }
        let mut connections = JoinSet::new();
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
                result = self.tcp.accept() => match result {
                    Ok((stream, addr)) => {
                        debug!(listener = self.name, %addr, "accepted connection");
                        let (reader, writer) = stream.into_split();
                        let connection = spawn_connection(reader, writer, self.handler.clone());
                        self.open.fetch_add(1, Ordering::SeqCst);
                        connections.spawn(watch(connection, shutdown.clone(), self.open.clone()));
                    }
                    Err(e) => error!(listener = self.name, error = %e, "accept error"),
                },
            }
        }
        info!(listener = self.name, open = connections.len(), "listener stopping");
        while connections.join_next().await.is_some() {}
    }
}

/// Hold `connection` until it closes on its own or shutdown closes it.
async fn watch(connection: Connection, shutdown: CancellationToken, open: Arc<AtomicUsize>) {
    tokio::select! {
        _ = connection.closed() => {}
        _ = shutdown.cancelled() => connection.close(),
    }
    open.fetch_sub(1, Ordering::SeqCst);
}

#[cfg(test)]
#[path = "../listener_tests.rs"]
mod tests;
