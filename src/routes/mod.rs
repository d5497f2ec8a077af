//! The conformance route catalog.
//!
//! Every route answers with fixed, literal bytes so an HTTP client's test
//! suite can assert on exact bodies, header names and status codes.
//! Validation routes answer `200 OK` with a body of `OK` or `FAIL`; a `FAIL`
//! is an assertion result for the client under test, not a server error.

mod basic;
mod charset;
mod inspect;
mod redirect;
mod static_file;
mod tests;

use crate::server::{HttpResponse, Router, ServerConfig};

pub use charset::{decode_with_label, encode_with_label};
pub use static_file::{content_type_for, http_date};

/// Body of a passing validation route.
pub const OK: &str = "OK";

/// Body of a failing validation route.
pub const FAIL: &str = "FAIL";

/// Build the `OK` / `FAIL` answer for a validation route.
pub(crate) fn verdict(passed: bool) -> HttpResponse {
    HttpResponse::text(if passed { OK } else { FAIL })
}

/// Build the full route table.
///
/// Routes are `GET` unless listed under `post`. The static asset is read
/// from `config.static_dir` on every request.
pub fn conformance_routes(config: &ServerConfig) -> Router {
    let image = config.static_dir.join("image.png");

    Router::new()
        .get("/basic", basic::basic)
        .get("/headers-test", basic::headers_test)
        .get("/basic-json", basic::basic_json)
        .get("/error-400", basic::error_400)
        .get("/error-401", basic::error_401)
        .get("/zero-bytes-json", basic::zero_bytes_json)
        .get("/response-latin-1", charset::response_latin_1)
        .post("/request-latin-1", charset::request_latin_1)
        .post("/request-utf-8-default", charset::request_utf_8_default)
        .post("/request-utf-8-default-2", charset::request_utf_8_default_2)
        .get("/response-utf-8-default", charset::response_utf_8_default)
        .get("/response-big5", charset::response_big5)
        .get("/", inspect::root)
        .get("/no-user-agent", inspect::no_user_agent)
        .post("/content-length", inspect::content_length)
        .post("/echo", inspect::echo)
        .get("/sorted-headers", inspect::sorted_headers)
        .get("/redirect-301", redirect::redirect_301)
        .get("/redirect-302", redirect::redirect_302)
        .post("/redirect-308", redirect::redirect_308)
        .post("/redirect-308-2", redirect::redirect_308_2)
        .get("/image.png", move |req| static_file::serve_file(req, image.clone()))
}
