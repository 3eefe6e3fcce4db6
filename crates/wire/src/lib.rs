// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-plane wire protocol.
//!
//! Message model, text codec, content negotiation, and a framed transport
//! (4-byte big-endian length prefix + encoded message) over tokio streams.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod body;
mod codec;
mod connection;
mod frame;
pub mod headers;
mod message;
mod transport;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use body::{ApplicationBody, BodyError, ContentEncoding, ContentType};
pub use codec::{encode, parse, FormatError};
pub use connection::{spawn_connection, Connection, StreamChannel};
pub use frame::{
    read_frame, read_message, write_frame, write_message, ProtocolError, MAX_MESSAGE_SIZE,
};
pub use headers::Headers;
pub use message::{Envelope, Message, MessageKind, Request, Response};
pub use transport::{route, Channel, ChannelRef, ConnectionHandler, TransportError};
