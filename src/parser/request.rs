//! HTTP request parsing and representation.

use std::collections::HashMap;
use std::str::FromStr;

use crate::parser::error::Error;
use crate::parser::method::Method;
use crate::parser::query::parse_query_string;
use crate::parser::version::HttpVersion;

/// Represents an HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The request path, without the query string
    pub path: String,
    /// The raw query string, if the target contained a `?`
    pub query: Option<String>,
    /// The HTTP version
    pub version: HttpVersion,
    /// The HTTP headers in arrival order, with the casing the client sent
    pub headers: Vec<(String, String)>,
    /// The request body
    pub body: Vec<u8>,
    /// Decoded query parameters; the last value wins on duplicates
    pub query_params: HashMap<String, String>,
}

impl HttpRequest {
    /// Create a new HTTP request with an empty body.
    ///
    /// The `target` is split at the first `?` into the path and the query
    /// string, and the query string is decoded into `query_params`.
    pub fn new(method: Method, target: &str, version: HttpVersion, headers: Vec<(String, String)>) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (target.to_string(), None),
        };

        let query_params = query
            .as_deref()
            .map(parse_query_string)
            .unwrap_or_default();

        Self {
            method,
            path,
            query,
            version,
            headers,
            body: Vec::new(),
            query_params,
        }
    }

    /// Create a new HTTP request with a body.
    pub fn with_body(
        method: Method,
        target: &str,
        version: HttpVersion,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    ) -> Self {
        let mut request = Self::new(method, target, version, headers);
        request.body = body;
        request
    }

    /// Get the first value of a header, looked up case-insensitively.
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find_map(|(k, v)| {
            if k.eq_ignore_ascii_case(name) {
                Some(v.as_str())
            } else {
                None
            }
        })
    }

    /// Check if a header exists.
    pub fn has_header(&self, name: &str) -> bool {
        self.get_header(name).is_some()
    }

    /// Get a query parameter value.
    pub fn get_query_param(&self, name: &str) -> Option<&String> {
        self.query_params.get(name)
    }

    /// Check if a query parameter exists.
    pub fn has_query_param(&self, name: &str) -> bool {
        self.query_params.contains_key(name)
    }

    /// Check whether a comma-separated header contains `token`, ignoring case.
    pub fn header_has_token(&self, name: &str, token: &str) -> bool {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .flat_map(|(_, v)| v.split(','))
            .any(|t| t.trim().eq_ignore_ascii_case(token))
    }

    /// Whether the body is sent with chunked transfer coding.
    pub fn is_chunked(&self) -> bool {
        self.header_has_token("Transfer-Encoding", "chunked")
    }

    /// Whether the client expects an interim `100 Continue` before sending the body.
    pub fn expects_continue(&self) -> bool {
        self.get_header("Expect")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("100-continue"))
    }

    /// Whether the connection should stay open after this request is answered.
    pub fn keep_alive(&self) -> bool {
        if self.header_has_token("Connection", "close") {
            return false;
        }
        self.version.keeps_alive_by_default() || self.header_has_token("Connection", "keep-alive")
    }
}

/// Parse an HTTP request from a byte slice.
///
/// The input holds the request line and headers, terminated by an empty line.
/// Any bytes after the empty line are taken as the body verbatim. The head
/// is decoded as ISO-8859-1, so every header byte maps to one character and
/// none is lost; the body is never decoded.
///
/// # Examples
///
/// ```
/// use charset_testserver::parse_request;
///
/// let request = parse_request(b"GET /?foo=bar HTTP/1.1\r\nHost: localhost\r\n\r\n").unwrap();
///
/// assert_eq!(request.path, "/");
/// assert_eq!(request.get_query_param("foo").map(String::as_str), Some("bar"));
/// assert_eq!(request.get_header("HOST"), Some("localhost"));
/// ```
pub fn parse_request(input: &[u8]) -> Result<HttpRequest, Error> {
    if input.is_empty() {
        return Err(Error::EmptyRequest);
    }

    let (head, body) = split_head(input);
    // ISO-8859-1: each head byte becomes the character with that code point
    let head: String = head.iter().map(|&b| char::from(b)).collect();

    let mut lines = head.lines().skip_while(|line| line.is_empty());

    let request_line = match lines.next() {
        Some(line) => line,
        None => return Err(Error::EmptyRequest),
    };

    // Split the request line into method, target, and version
    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() != 3 {
        return Err(Error::MalformedRequestLine(request_line.to_string()));
    }

    let method = Method::from_str(parts[0])?;

    let target = parts[1];
    if !target.starts_with('/') {
        return Err(Error::InvalidPath);
    }

    let version = HttpVersion::from_str(parts[2])?;

    let mut headers = Vec::new();
    for line in lines {
        // Empty line indicates the end of headers
        if line.is_empty() {
            break;
        }

        let Some((name, value)) = line.split_once(':') else {
            return Err(Error::InvalidHeaderFormat(line.to_string()));
        };

        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(Error::InvalidHeaderFormat(line.to_string()));
        }

        headers.push((name.to_string(), value.trim().to_string()));
    }

    if version == HttpVersion::Http11 && !headers.iter().any(|(k, _)| k.eq_ignore_ascii_case("Host")) {
        return Err(Error::MissingHeader("Host".to_string()));
    }

    Ok(HttpRequest::with_body(method, target, version, headers, body.to_vec()))
}

/// Split raw request bytes after the first blank line.
fn split_head(input: &[u8]) -> (&[u8], &[u8]) {
    match head_len(input) {
        Some(end) => input.split_at(end),
        None => (input, &input[input.len()..]),
    }
}

/// Length of the request head including its terminating blank line, or
/// `None` if the blank line has not arrived yet. Both CRLF and bare LF line
/// endings are accepted.
pub(crate) fn head_len(input: &[u8]) -> Option<usize> {
    let crlf = find_subsequence(input, b"\r\n\r\n").map(|pos| (pos, 4));
    let lf = find_subsequence(input, b"\n\n").map(|pos| (pos, 2));

    match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a.0 + a.1 } else { b.0 + b.1 }),
        (a, b) => a.or(b).map(|(pos, len)| pos + len),
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}
