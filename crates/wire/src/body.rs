// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content negotiation: `Content-Encoding` and `Content-Type` handling.

use std::fmt;
use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use thiserror::Error;
use tracing::debug;

/// Errors from encoding or decoding an application body.
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("json body: {0}")]
    Json(#[source] serde_json::Error),

    #[error("base64 body: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("gzip body: {0}")]
    Gzip(#[source] std::io::Error),

    #[error("expected a json body, got {0}")]
    UnexpectedContentType(&'static str),
}

/// Transfer encoding of the raw body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentEncoding {
    #[default]
    Utf8,
    Base64,
    None,
}

impl ContentEncoding {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentEncoding::Utf8 => "utf-8",
            ContentEncoding::Base64 => "base64",
            ContentEncoding::None => "none",
        }
    }

    /// Absent means utf-8; an unrecognized value is treated as `none`.
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("utf-8") => ContentEncoding::Utf8,
            Some("base64") => ContentEncoding::Base64,
            Some("none") => ContentEncoding::None,
            Some(other) => {
                debug!(encoding = other, "unknown content encoding, passing body through");
                ContentEncoding::None
            }
        }
    }
}

impl fmt::Display for ContentEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application payload format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Json,
    /// Opaque serialized-object format produced by older agents.
    Legacy,
    Gzip,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Json => "application/json",
            ContentType::Legacy => "application/x-python-pickle",
            ContentType::Gzip => "application/x-gzip",
        }
    }

    pub fn from_header(value: &str) -> Option<Self> {
        match value.trim() {
            "application/json" => Some(ContentType::Json),
            "application/x-python-pickle" => Some(ContentType::Legacy),
            "application/x-gzip" => Some(ContentType::Gzip),
            _ => None,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded application body.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplicationBody {
    Json(serde_json::Value),
    /// Legacy object payload, carried without interpretation.
    Legacy(Vec<u8>),
    /// Uncompressed bytes; compressed and base64-encoded on the wire.
    Gzip(Vec<u8>),
    /// Bytes with no (or an unknown) content type.
    Raw(Vec<u8>),
}

impl ApplicationBody {
    pub fn content_type(&self) -> Option<ContentType> {
        match self {
            ApplicationBody::Json(_) => Some(ContentType::Json),
            ApplicationBody::Legacy(_) => Some(ContentType::Legacy),
            ApplicationBody::Gzip(_) => Some(ContentType::Gzip),
            ApplicationBody::Raw(_) => None,
        }
    }

    pub(crate) fn content_type_name(&self) -> &'static str {
        self.content_type().map_or("raw bytes", ContentType::as_str)
    }
}

/// Wire bytes plus the header values describing them.
#[derive(Debug)]
pub(crate) struct Encoded {
    pub bytes: Vec<u8>,
    pub encoding: ContentEncoding,
    pub content_type: Option<ContentType>,
}

pub(crate) fn encode(value: ApplicationBody) -> Result<Encoded, BodyError> {
    let content_type = value.content_type();
    let (bytes, encoding) = match value {
        ApplicationBody::Json(value) => {
            (serde_json::to_vec(&value).map_err(BodyError::Json)?, ContentEncoding::Utf8)
        }
        ApplicationBody::Legacy(bytes) => (bytes, ContentEncoding::None),
        ApplicationBody::Gzip(bytes) => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&bytes).map_err(BodyError::Gzip)?;
            let compressed = encoder.finish().map_err(BodyError::Gzip)?;
            (STANDARD.encode(compressed).into_bytes(), ContentEncoding::Base64)
        }
        ApplicationBody::Raw(bytes) => (bytes, ContentEncoding::Utf8),
    };
    Ok(Encoded { bytes, encoding, content_type })
}

pub(crate) fn decode(
    raw: &[u8],
    encoding: Option<&str>,
    content_type: Option<&str>,
) -> Result<ApplicationBody, BodyError> {
    let bytes = match ContentEncoding::from_header(encoding) {
        ContentEncoding::Base64 => STANDARD.decode(raw.trim_ascii())?,
        ContentEncoding::Utf8 | ContentEncoding::None => raw.to_vec(),
    };
    match content_type.and_then(ContentType::from_header) {
        Some(ContentType::Json) => {
            serde_json::from_slice(&bytes).map(ApplicationBody::Json).map_err(BodyError::Json)
        }
        Some(ContentType::Legacy) => Ok(ApplicationBody::Legacy(bytes)),
        Some(ContentType::Gzip) => {
            let mut out = Vec::new();
            GzDecoder::new(bytes.as_slice()).read_to_end(&mut out).map_err(BodyError::Gzip)?;
            Ok(ApplicationBody::Gzip(out))
        }
        None => Ok(ApplicationBody::Raw(bytes)),
    }
}

#[cfg(test)]
#[path = "body_tests.rs"]
mod tests;
