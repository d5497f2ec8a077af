//! HTTP request parsing.
//!
//! This module turns the head of an HTTP/1.x request into an [`HttpRequest`].
//! Header names keep the casing the client sent; lookups are case-insensitive.

mod request;
mod method;
mod version;
mod error;
mod query;

// Re-export public items
pub use request::HttpRequest;
pub use method::Method;
pub use version::HttpVersion;
pub use error::Error;
pub use query::parse_query_string;

// Re-export the parse_request function
pub use request::parse_request;
pub(crate) use request::head_len;
