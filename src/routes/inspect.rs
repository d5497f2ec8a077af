//! Routes that report on the request they received.

use crate::parser::HttpRequest;
use crate::routes::verdict;
use crate::server::{Error, HttpResponse};

/// `OK` only for `?foo=bar`.
pub async fn root(req: HttpRequest) -> Result<HttpResponse, Error> {
    Ok(verdict(req.get_query_param("foo").map(String::as_str) == Some("bar")))
}

pub async fn no_user_agent(req: HttpRequest) -> Result<HttpResponse, Error> {
    Ok(verdict(!req.has_header("User-Agent")))
}

/// `OK` when the declared `Content-Length` matches the received body. A
/// missing or non-numeric header fails; chunked uploads carry no length.
pub async fn content_length(req: HttpRequest) -> Result<HttpResponse, Error> {
    let declared = req
        .get_header("Content-Length")
        .and_then(|raw| raw.trim().parse::<usize>().ok());

    Ok(verdict(declared == Some(req.body.len())))
}

/// The body decoded as UTF-8. Invalid sequences become U+FFFD.
pub async fn echo(req: HttpRequest) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::text(String::from_utf8_lossy(&req.body)))
}

/// One `name: value` line per request header with the name lower-cased,
/// sorted by the whole line.
pub async fn sorted_headers(req: HttpRequest) -> Result<HttpResponse, Error> {
    let mut lines: Vec<String> = req
        .headers
        .iter()
        .map(|(name, value)| format!("{}: {value}", name.to_ascii_lowercase()))
        .collect();
    lines.sort();

    Ok(HttpResponse::text(lines.join("\n")).with_content_type("text/plain"))
}
