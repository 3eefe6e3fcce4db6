// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Framed message transport over any tokio byte stream.
//!
//! Each connection gets a reader task that parses frames and routes them to
//! the handler in arrival order, and a writer task that drains the channel's
//! outbound queue. Either side failing closes both.

use std::sync::Arc;

use tm_core::ChannelId;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::codec;
use crate::frame::{read_message, write_message, ProtocolError};
use crate::message::Message;
use crate::transport::{route, Channel, ChannelRef, ConnectionHandler, TransportError};

/// Sending side of a stream connection.
pub struct StreamChannel {
    id: ChannelId,
    tx: mpsc::UnboundedSender<Message>,
    closed: CancellationToken,
}

impl Channel for StreamChannel {
    fn id(&self) -> &ChannelId {
        &self.id
    }

    fn send(&self, message: Message) -> Result<(), TransportError> {
        if self.closed.is_cancelled() {
            return Err(TransportError::Closed(self.id.clone()));
        }
        self.tx.send(message).map_err(|_| TransportError::Closed(self.id.clone()))
    }
}

/// Handle to a running connection.
pub struct Connection {
    channel: Arc<StreamChannel>,
    closed: CancellationToken,
}

impl Connection {
    pub fn id(&self) -> &ChannelId {
        &self.channel.id
    }

    pub fn channel(&self) -> ChannelRef {
        self.channel.clone()
    }

    /// Stop both tasks; the handler sees `on_disconnection`.
    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Resolves once the connection has shut down for any reason.
    pub async fn closed(&self) {
        self.closed.cancelled().await
    }
}

/// Start serving a connection.
///
/// `on_connection` runs before this returns; messages it sends are queued
/// ahead of anything else. Must be called from within a tokio runtime.
pub fn spawn_connection<R, W, H>(reader: R, writer: W, handler: Arc<H>) -> Connection
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
    H: ConnectionHandler + ?Sized + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let closed = CancellationToken::new();
    let channel = Arc::new(StreamChannel { id: ChannelId::new(), tx, closed: closed.clone() });
    let channel_ref: ChannelRef = channel.clone();

    info!(channel = %channel.id, "connection opened");
    handler.on_connection(&channel_ref);

    tokio::spawn(write_loop(writer, rx, channel.id.clone(), closed.clone()));
    tokio::spawn(read_loop(reader, channel_ref, handler, closed.clone()));

    Connection { channel, closed }
}

async fn read_loop<R, H>(
    mut reader: R,
    channel: ChannelRef,
    handler: Arc<H>,
    closed: CancellationToken,
) where
    R: AsyncRead + Unpin,
    H: ConnectionHandler + ?Sized,
{
    loop {
        let frame = tokio::select! {
            _ = closed.cancelled() => break,
            frame = read_message(&mut reader) => frame,
        };
        match frame {
            Ok(data) => match codec::parse(&data) {
                Ok(message) => route(&*handler, &channel, message),
                // Only this message is lost; the connection stays up.
                Err(e) => warn!(channel = %channel.id(), error = %e, "dropping malformed message"),
            },
            Err(ProtocolError::ConnectionClosed) => {
                debug!(channel = %channel.id(), "peer closed connection");
                break;
            }
            Err(e) => {
                warn!(channel = %channel.id(), error = %e, "read failed, closing connection");
                break;
            }
        }
    }
    closed.cancel();
    info!(channel = %channel.id(), "connection closed");
    handler.on_disconnection(&channel);
}

async fn write_loop<W: AsyncWrite + Unpin>(
    mut writer: W,
    mut rx: mpsc::UnboundedReceiver<Message>,
    id: ChannelId,
    closed: CancellationToken,
) {
    loop {
        let message = tokio::select! {
            biased;
            message = rx.recv() => match message {
                Some(message) => message,
                None => break,
            },
            _ = closed.cancelled() => break,
        };
        if let Err(e) = write_message(&mut writer, &codec::encode(&message)).await {
            warn!(channel = %id, error = %e, "write failed, closing connection");
            break;
        }
    }
    closed.cancel();
    let _ = writer.shutdown().await;
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;
