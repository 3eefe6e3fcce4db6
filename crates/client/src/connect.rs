// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconnecting TCP connector for the agent controller client.

use std::sync::Arc;
use std::time::Duration;

use tm_wire::spawn_connection;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::client::AgentControllerClient;

/// Keep `client` connected to `addr` until `cancel` fires.
///
/// Each new connection replays the client's standing subscriptions. After
/// a failed attempt or a dropped connection the connector waits `retry`
/// before dialing again.
pub async fn connect(
    client: Arc<AgentControllerClient>,
    addr: String,
    retry: Duration,
    cancel: CancellationToken,
) {
    loop {
        let attempt = tokio::select! {
            _ = cancel.cancelled() => break,
            attempt = TcpStream::connect(addr.as_str()) => attempt,
        };
        match attempt {
            Ok(stream) => {
                info!(%addr, "connected");
                let (reader, writer) = stream.into_split();
                let connection = spawn_connection(reader, writer, client.clone());
                tokio::select! {
                    _ = cancel.cancelled() => {
                        connection.close();
                        break;
                    }
                    _ = connection.closed() => warn!(%addr, "connection lost"),
                }
            }
            Err(e) => warn!(%addr, error = %e, "connect failed"),
        }
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(retry) => {}
        }
    }
    info!(%addr, "connector stopped");
}

#[cfg(test)]
#[path = "connect_tests.rs"]
mod tests;
