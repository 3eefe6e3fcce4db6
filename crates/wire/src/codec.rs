// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Text codec for the control-plane wire format.
//!
//! ```text
//! METHOD URI PROTOCOL/VERSION\n      (or: STATUS REASON\n)
//! Name: value\n                       (zero or more)
//! \n
//! <raw body>
//! ```
//!
//! Lines end with a bare `\n`; the format is private to this system.

use std::borrow::Cow;

use thiserror::Error;
use tm_core::{Method, Uri};

use crate::headers::Headers;
use crate::message::{Envelope, Message, Request, Response};

const SEP: u8 = b'\n';

/// A buffer that is not a well-formed message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("empty message")]
    Empty,

    #[error("message head is not valid utf-8")]
    InvalidUtf8,

    #[error("invalid request or status line: {0:?}")]
    InvalidFirstLine(String),

    #[error("invalid header line: {0:?}")]
    InvalidHeader(String),
}

/// Encode a message to bytes.
pub fn encode(message: &Message) -> Vec<u8> {
    let mut out = Vec::with_capacity(128);
    let (headers, body) = match message {
        Message::Request(r) => {
            let line = format!(
                "{} {} {}/{}",
                single_line(r.method().as_str()),
                r.uri(),
                single_line(r.protocol()),
                single_line(r.version())
            );
            out.extend_from_slice(line.as_bytes());
            (r.headers(), r.body())
        }
        Message::Response(r) => {
            let line = format!("{} {}", r.status(), single_line(r.reason()));
            out.extend_from_slice(line.as_bytes());
            (r.headers(), r.body())
        }
    };
    out.push(SEP);
    for (name, value) in headers.iter() {
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(b": ");
        out.extend_from_slice(single_line(value).as_bytes());
        out.push(SEP);
    }
    out.push(SEP);
    out.extend_from_slice(body);
    out
}

/// A raw newline would end the current line early and let the rest be read
/// as header lines; write it as a space instead.
pub(crate) fn single_line(value: &str) -> Cow<'_, str> {
    if value.contains('\n') {
        Cow::Owned(value.replace('\n', " "))
    } else {
        Cow::Borrowed(value)
    }
}

/// Parse a message from bytes.
pub fn parse(data: &[u8]) -> Result<Message, FormatError> {
    if data.is_empty() {
        return Err(FormatError::Empty);
    }

    let (first, mut rest) = split_line(data);
    let first = std::str::from_utf8(first).map_err(|_| FormatError::InvalidUtf8)?;
    let start = parse_first_line(first)?;

    let mut headers = Headers::new();
    let mut body = Vec::new();
    while let Some(remaining) = rest {
        let (line, next) = split_line(remaining);
        if line.is_empty() {
            body = next.map(<[u8]>::to_vec).unwrap_or_default();
            break;
        }
        let line = std::str::from_utf8(line).map_err(|_| FormatError::InvalidUtf8)?;
        let (name, value) =
            parse_header(line).ok_or_else(|| FormatError::InvalidHeader(line.to_string()))?;
        headers.set(name, value);
        rest = next;
    }

    Ok(match start {
        FirstLine::Request { method, uri, protocol, version } => {
            Message::Request(Request::from_parts(method, uri, protocol, version, headers, body))
        }
        FirstLine::Status { status, reason } => {
            Message::Response(Response::from_parts(status, reason, headers, body))
        }
    })
}

enum FirstLine {
    Request { method: Method, uri: Uri, protocol: String, version: String },
    Status { status: u16, reason: String },
}

/// Split off the first line. The remainder is `None` when there is no separator.
fn split_line(data: &[u8]) -> (&[u8], Option<&[u8]>) {
    match data.iter().position(|&b| b == SEP) {
        Some(i) => (&data[..i], Some(&data[i + 1..])),
        None => (data, None),
    }
}

fn is_token(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

fn parse_first_line(line: &str) -> Result<FirstLine, FormatError> {
    let invalid = || FormatError::InvalidFirstLine(line.to_string());

    // Status line: three digits, whitespace, then a free-form reason.
    if let Some((code, reason)) = line.split_once(|c: char| c.is_ascii_whitespace()) {
        if code.len() == 3 && code.bytes().all(|b| b.is_ascii_digit()) {
            let status = code.parse().map_err(|_| invalid())?;
            return Ok(FirstLine::Status { status, reason: reason.to_string() });
        }
    }

    let mut parts = line.split_ascii_whitespace();
    let (Some(method), Some(uri), Some(proto), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };
    if !is_token(method) {
        return Err(invalid());
    }
    let uri: Uri = uri.parse().map_err(|_| invalid())?;
    let (protocol, version) = proto.split_once('/').ok_or_else(invalid)?;
    let version_ok = !version.is_empty() && version.bytes().all(|b| b.is_ascii_digit() || b == b'.');
    if !is_token(protocol) || !version_ok {
        return Err(invalid());
    }
    Ok(FirstLine::Request {
        method: Method::from_token(method),
        uri,
        protocol: protocol.to_string(),
        version: version.to_string(),
    })
}

/// `Name: value`; whitespace is allowed before the colon and one space after it is dropped.
fn parse_header(line: &str) -> Option<(&str, &str)> {
    let (name, value) = line.split_once(':')?;
    let name = name.trim_end();
    if !is_token(name) {
        return None;
    }
    Some((name, value.strip_prefix(' ').unwrap_or(value)))
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
