// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::headers::{CONTENT_ENCODING, CONTENT_TYPE};
use crate::{Envelope, Request};
use serde_json::json;
use tm_core::Method;

fn request() -> Request {
    Request::new(Method::TriSend, "probe:p1@a1".parse().unwrap(), "Ia", "1.0")
}

#[test]
fn json_body_sets_both_headers() {
    let mut req = request();
    req.set_application_body(ApplicationBody::Json(json!({"a": 1}))).unwrap();
    assert_eq!(req.header(CONTENT_TYPE), Some("application/json"));
    assert_eq!(req.header(CONTENT_ENCODING), Some("utf-8"));
    assert_eq!(req.body(), br#"{"a":1}"#);
    assert_eq!(req.application_body().unwrap(), ApplicationBody::Json(json!({"a": 1})));
}

#[test]
fn legacy_body_is_opaque_with_no_encoding() {
    let mut req = request();
    req.set_application_body(ApplicationBody::Legacy(vec![0x80, 0x02, 0xff])).unwrap();
    assert_eq!(req.header(CONTENT_TYPE), Some("application/x-python-pickle"));
    assert_eq!(req.header(CONTENT_ENCODING), Some("none"));
    assert_eq!(req.body(), &[0x80, 0x02, 0xff]);
    assert_eq!(req.application_body().unwrap(), ApplicationBody::Legacy(vec![0x80, 0x02, 0xff]));
}

#[test]
fn gzip_body_is_compressed_then_base64() {
    let payload = b"line one\nline two\n".repeat(20);
    let mut req = request();
    req.set_application_body(ApplicationBody::Gzip(payload.clone())).unwrap();
    assert_eq!(req.header(CONTENT_TYPE), Some("application/x-gzip"));
    assert_eq!(req.header(CONTENT_ENCODING), Some("base64"));
    assert!(req.body().iter().all(|b| b.is_ascii_graphic()));
    assert_eq!(req.application_body().unwrap(), ApplicationBody::Gzip(payload));
}

#[test]
fn raw_body_clears_stale_content_type() {
    let mut req = request();
    req.set_application_body(ApplicationBody::Json(json!(1))).unwrap();
    req.set_application_body(ApplicationBody::Raw(b"plain".to_vec())).unwrap();
    assert_eq!(req.header(CONTENT_TYPE), None);
    assert_eq!(req.application_body().unwrap(), ApplicationBody::Raw(b"plain".to_vec()));
}

#[yare::parameterized(
    absent  = { None },
    unknown = { Some("text/x-mystery") },
)]
fn unknown_content_type_returns_decoded_bytes(content_type: Option<&str>) {
    let mut req = request().with_body("aGVsbG8=").with_header(CONTENT_ENCODING, "base64");
    if let Some(ct) = content_type {
        req.set_header(CONTENT_TYPE, ct);
    }
    assert_eq!(req.application_body().unwrap(), ApplicationBody::Raw(b"hello".to_vec()));
}

#[test]
fn bad_base64_is_an_error() {
    let req = request().with_body("!!!").with_header(CONTENT_ENCODING, "base64");
    assert!(matches!(req.application_body(), Err(BodyError::Base64(_))));
}

#[test]
fn bad_json_is_an_error() {
    let req = request().with_body("{nope").with_header(CONTENT_TYPE, "application/json");
    assert!(matches!(req.application_body(), Err(BodyError::Json(_))));
}

#[test]
fn typed_json_helpers() {
    #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
    struct Deploy {
        name: String,
    }
    let mut req = request();
    req.set_json_body(&Deploy { name: "p1".into() }).unwrap();
    let back: Deploy = req.json_body().unwrap();
    assert_eq!(back, Deploy { name: "p1".into() });
}

#[test]
fn json_body_rejects_legacy_payload() {
    let mut req = request();
    req.set_application_body(ApplicationBody::Legacy(vec![1, 2])).unwrap();
    assert!(matches!(
        req.json_body::<serde_json::Value>(),
        Err(BodyError::UnexpectedContentType("application/x-python-pickle"))
    ));
}

#[test]
fn unknown_encoding_passes_through() {
    assert_eq!(ContentEncoding::from_header(Some("zstd")), ContentEncoding::None);
    assert_eq!(ContentEncoding::from_header(None), ContentEncoding::Utf8);
}
