//! Charset routes: bodies produced or validated in a specific encoding.
//!
//! Encodings are resolved from their labels with `encoding_rs`, which follows
//! the WHATWG Encoding Standard. There `latin1` names windows-1252, which
//! agrees with ISO-8859-1 on every character these routes send or expect.

use encoding_rs::Encoding;

use crate::parser::HttpRequest;
use crate::routes::verdict;
use crate::server::{Error, HttpResponse};

/// Text sent by the response charset routes.
pub const RESPONSE_TEXT: &str = "ñáéíóúß";

/// Text the request charset routes expect to decode.
pub const REQUEST_TEXT: &str = "áéíóúñü";

/// Text sent by `/response-big5`.
pub const BIG5_TEXT: &str = "常用字";

/// Encode `text` with the encoding named by `label`.
///
/// Returns `None` for an unknown label or when `text` has characters the
/// encoding cannot represent.
pub fn encode_with_label(text: &str, label: &str) -> Option<Vec<u8>> {
    let encoding = Encoding::for_label(label.as_bytes())?;
    let (bytes, _, had_errors) = encoding.encode(text);
    if had_errors {
        return None;
    }
    Some(bytes.into_owned())
}

/// Decode `bytes` with the encoding named by `label`.
///
/// Returns `None` for an unknown label or malformed input. A byte order mark
/// is kept as part of the text.
pub fn decode_with_label(bytes: &[u8], label: &str) -> Option<String> {
    let encoding = Encoding::for_label(label.as_bytes())?;
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
}

fn encoded(text: &str, label: &str) -> Result<Vec<u8>, Error> {
    encode_with_label(text, label)
        .ok_or_else(|| Error::InternalError(format!("cannot encode {text:?} as {label}")))
}

/// Whether the request declares exactly `content_type` and its body decodes
/// with `label` to [`REQUEST_TEXT`].
fn is_expected_body(req: &HttpRequest, content_type: Option<&str>, label: &str) -> bool {
    if let Some(expected) = content_type {
        if req.get_header("Content-Type") != Some(expected) {
            return false;
        }
    }
    decode_with_label(&req.body, label).as_deref() == Some(REQUEST_TEXT)
}

pub async fn response_latin_1(_req: HttpRequest) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::text("")
        .with_content_type("text/plain; charset=latin1")
        .with_body_bytes(encoded(RESPONSE_TEXT, "latin1")?))
}

pub async fn request_latin_1(req: HttpRequest) -> Result<HttpResponse, Error> {
    Ok(verdict(is_expected_body(&req, Some("text/plain; charset=latin1"), "latin1")))
}

pub async fn request_utf_8_default(req: HttpRequest) -> Result<HttpResponse, Error> {
    Ok(verdict(is_expected_body(&req, Some("text/plain; charset=utf-8"), "utf-8")))
}

/// Same body check as `/request-utf-8-default`, whatever the Content-Type.
pub async fn request_utf_8_default_2(req: HttpRequest) -> Result<HttpResponse, Error> {
    Ok(verdict(is_expected_body(&req, None, "utf-8")))
}

/// UTF-8 bytes under a `text/plain` with no charset parameter.
pub async fn response_utf_8_default(_req: HttpRequest) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::text(RESPONSE_TEXT).with_content_type("text/plain"))
}

pub async fn response_big5(_req: HttpRequest) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::text("")
        .with_content_type("text/plain; charset=big5")
        .with_body_bytes(encoded(BIG5_TEXT, "big5")?))
}
