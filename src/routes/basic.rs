//! Fixed responses: plain text, custom header casing, JSON and bare status codes.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::parser::HttpRequest;
use crate::server::{Error, HttpResponse, StatusCode};

pub async fn basic(_req: HttpRequest) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::text("Hello, World!"))
}

/// `x-test-1` is lower-case and `OTHER-TEST` upper-case on the wire.
pub async fn headers_test(_req: HttpRequest) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::text("HeadersTest")
        .with_header("x-test-1", "foo")
        .with_header("OTHER-TEST", "bar"))
}

/// `{"foo":true,"hello":"world"}`. The `BTreeMap` keeps the keys in
/// lexicographic order regardless of insertion order.
pub async fn basic_json(_req: HttpRequest) -> Result<HttpResponse, Error> {
    let mut body = BTreeMap::new();
    body.insert("hello", Value::from("world"));
    body.insert("foo", Value::from(true));

    HttpResponse::new(StatusCode::Ok).with_json(&body)
}

pub async fn error_400(_req: HttpRequest) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::text("").with_status(StatusCode::BadRequest))
}

pub async fn error_401(_req: HttpRequest) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::text("").with_status(StatusCode::Unauthorized))
}

/// A declared JSON body of zero bytes.
pub async fn zero_bytes_json(_req: HttpRequest) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::text("").with_content_type("application/json"))
}
