// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message model: requests, notifications and responses.

use std::fmt;
use std::ops::RangeInclusive;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tm_core::{Method, Uri};

use crate::body::{self, ApplicationBody, BodyError};
use crate::codec;
use crate::headers::{self, Headers};

pub const TYPE_REQUEST: &str = "request";
pub const TYPE_NOTIFICATION: &str = "notification";

/// Whether a request expects a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Request,
    /// Fire-and-forget, no response expected.
    Notification,
}

/// Headers and raw body shared by every message.
pub trait Envelope {
    fn headers(&self) -> &Headers;
    fn headers_mut(&mut self) -> &mut Headers;
    fn body(&self) -> &[u8];
    fn set_body(&mut self, body: Vec<u8>);

    fn header(&self, name: &str) -> Option<&str> {
        self.headers().get(name)
    }

    fn set_header(&mut self, name: &str, value: impl fmt::Display)
    where
        Self: Sized,
    {
        self.headers_mut().set(name, value);
    }

    /// `None` when the header is missing or not an integer.
    fn transaction_id(&self) -> Option<u64> {
        self.header(headers::TRANSACTION_ID)?.trim().parse().ok()
    }

    fn set_transaction_id(&mut self, id: u64) {
        self.headers_mut().set(headers::TRANSACTION_ID, id);
    }

    /// Serialize `value` into the body and set the content headers to match.
    fn set_application_body(&mut self, value: ApplicationBody) -> Result<(), BodyError> {
        let encoded = body::encode(value)?;
        let map = self.headers_mut();
        map.set(headers::CONTENT_ENCODING, encoded.encoding);
        match encoded.content_type {
            Some(content_type) => map.set(headers::CONTENT_TYPE, content_type),
            None => {
                map.remove(headers::CONTENT_TYPE);
            }
        }
        self.set_body(encoded.bytes);
        Ok(())
    }

    /// Decode the body according to `Content-Encoding`, then `Content-Type`.
    ///
    /// Unknown or absent content types come back as [`ApplicationBody::Raw`].
    fn application_body(&self) -> Result<ApplicationBody, BodyError> {
        body::decode(
            self.body(),
            self.header(headers::CONTENT_ENCODING),
            self.header(headers::CONTENT_TYPE),
        )
    }

    fn set_json_body<T: Serialize>(&mut self, value: &T) -> Result<(), BodyError>
    where
        Self: Sized,
    {
        let value = serde_json::to_value(value).map_err(BodyError::Json)?;
        self.set_application_body(ApplicationBody::Json(value))
    }

    /// Decode a JSON body into `T`.
    fn json_body<T: DeserializeOwned>(&self) -> Result<T, BodyError>
    where
        Self: Sized,
    {
        match self.application_body()? {
            ApplicationBody::Json(value) => serde_json::from_value(value).map_err(BodyError::Json),
            ApplicationBody::Raw(bytes) => serde_json::from_slice(&bytes).map_err(BodyError::Json),
            other => Err(BodyError::UnexpectedContentType(other.content_type_name())),
        }
    }
}

/// A request or notification: method, target Uri and protocol tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    uri: Uri,
    protocol: String,
    version: String,
    headers: Headers,
    body: Vec<u8>,
}

impl Request {
    /// A request expecting a response (`Type: request`).
    pub fn new(
        method: Method,
        uri: Uri,
        protocol: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self::with_type(method, uri, protocol.into(), version.into(), TYPE_REQUEST)
    }

    /// A fire-and-forget notification (`Type: notification`).
    pub fn notification(
        method: Method,
        uri: Uri,
        protocol: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self::with_type(method, uri, protocol.into(), version.into(), TYPE_NOTIFICATION)
    }

    fn with_type(method: Method, uri: Uri, protocol: String, version: String, kind: &str) -> Self {
        let protocol = codec::single_line(&protocol).into_owned();
        let version = codec::single_line(&version).into_owned();
        let mut headers = Headers::new();
        headers.set(headers::TYPE, kind);
        Self { method, uri, protocol, version, headers, body: Vec::new() }
    }

    /// Reassemble a parsed request; headers are taken as-is.
    pub(crate) fn from_parts(
        method: Method,
        uri: Uri,
        protocol: String,
        version: String,
        headers: Headers,
        body: Vec<u8>,
    ) -> Self {
        Self { method, uri, protocol, version, headers, body }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn kind(&self) -> MessageKind {
        match self.header(headers::TYPE) {
            Some(TYPE_NOTIFICATION) => MessageKind::Notification,
            _ => MessageKind::Request,
        }
    }

    pub fn is_notification(&self) -> bool {
        self.kind() == MessageKind::Notification
    }

    pub fn with_header(mut self, name: &str, value: impl fmt::Display) -> Self {
        self.headers.set(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Build a response to this request, echoing its transaction id.
    pub fn reply(&self, status: u16, reason: impl Into<String>) -> Response {
        let mut response = Response::new(status, reason);
        response.headers.set_opt(headers::TRANSACTION_ID, self.transaction_id());
        response
    }
}

impl Envelope for Request {
    fn headers(&self) -> &Headers {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    fn body(&self) -> &[u8] {
        &self.body
    }

    fn set_body(&mut self, body: Vec<u8>) {
        self.body = body;
    }
}

/// A status line plus headers and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: u16,
    reason: String,
    headers: Headers,
    body: Vec<u8>,
}

impl Response {
    pub const OK: u16 = 200;

    /// Status codes the three-digit status line can carry.
    pub const STATUS_RANGE: RangeInclusive<u16> = 100..=999;

    /// `status` must lie in [`Self::STATUS_RANGE`]; anything else cannot be
    /// read back from the wire. Newlines in `reason` become spaces.
    pub fn new(status: u16, reason: impl Into<String>) -> Self {
        debug_assert!(
            Self::STATUS_RANGE.contains(&status),
            "status {status} does not fit a three-digit status line"
        );
        let reason = codec::single_line(&reason.into()).into_owned();
        Self { status, reason, headers: Headers::new(), body: Vec::new() }
    }

    pub(crate) fn from_parts(status: u16, reason: String, headers: Headers, body: Vec<u8>) -> Self {
        Self { status, reason, headers, body }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Only 200 counts as success.
    pub fn is_success(&self) -> bool {
        self.status == Self::OK
    }

    pub fn with_header(mut self, name: &str, value: impl fmt::Display) -> Self {
        self.headers.set(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

impl Envelope for Response {
    fn headers(&self) -> &Headers {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    fn body(&self) -> &[u8] {
        &self.body
    }

    fn set_body(&mut self, body: Vec<u8>) {
        self.body = body;
    }
}

/// Any message that can travel on a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Request(Request),
    Response(Response),
}

impl Message {
    /// Encode to the wire format.
    pub fn encode(&self) -> Vec<u8> {
        codec::encode(self)
    }

    pub fn transaction_id(&self) -> Option<u64> {
        match self {
            Message::Request(r) => r.transaction_id(),
            Message::Response(r) => r.transaction_id(),
        }
    }

    pub fn as_request(&self) -> Option<&Request> {
        match self {
            Message::Request(r) => Some(r),
            Message::Response(_) => None,
        }
    }

    pub fn as_response(&self) -> Option<&Response> {
        match self {
            Message::Response(r) => Some(r),
            Message::Request(_) => None,
        }
    }
}

impl From<Request> for Message {
    fn from(request: Request) -> Self {
        Message::Request(request)
    }
}

impl From<Response> for Message {
    fn from(response: Response) -> Self {
        Message::Response(response)
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
