//! A deterministic HTTP conformance server.
//!
//! Every route answers with literal bytes so that the test suite of an HTTP
//! client can assert on exact bodies, header names and status codes.
//!
//! # Features
//!
//! - Request framing for HTTP/1.0 and HTTP/1.1, with keep-alive, pipelining,
//!   chunked request bodies and `Expect: 100-continue`
//! - Header names kept exactly as sent, in both directions
//! - Charset routes that produce and validate Latin-1, Big5 and UTF-8 bodies
//! - Redirects, bare status codes, JSON and a static image
//!
//! # Examples
//!
//! ## Parsing a request head
//!
//! ```
//! use charset_testserver::{parse_request, Method};
//!
//! let request = parse_request(b"GET /?foo=bar HTTP/1.1\r\nHost: example.com\r\n\r\n").unwrap();
//!
//! assert_eq!(request.method, Method::GET);
//! assert_eq!(request.path, "/");
//! assert_eq!(request.get_query_param("foo").map(String::as_str), Some("bar"));
//! ```
//!
//! ## Error handling
//!
//! ```
//! use charset_testserver::{parse_request, ParserError};
//!
//! let invalid_request = b"INVALID /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n";
//!
//! match parse_request(invalid_request) {
//!     Ok(_) => println!("Request parsed successfully"),
//!     Err(ParserError::InvalidMethod(method)) => println!("Invalid method: {}", method),
//!     Err(err) => println!("Other error: {}", err),
//! }
//! ```
//!
//! ## Running the server
//!
//! ```no_run
//! use charset_testserver::{conformance_routes, HttpServer, ServerConfig};
//!
//! # async fn run() -> Result<(), charset_testserver::ServerError> {
//! let config = ServerConfig::default();
//! let router = conformance_routes(&config);
//! HttpServer::new(config, router).start().await
//! # }
//! ```

pub mod parser;

pub mod server;

pub mod routes;

// Re-export commonly used items for convenience
pub use parser::{Error as ParserError, HttpRequest, HttpVersion, Method, parse_request};
pub use routes::conformance_routes;
pub use server::{Error as ServerError, HttpResponse, HttpServer, Router, ServerConfig, StatusCode};
