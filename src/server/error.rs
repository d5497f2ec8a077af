//! Error types for the HTTP server.

use std::time::Duration;

use thiserror::Error;

use crate::parser::{Error as ParserError, Method};

/// Errors that can occur during HTTP server operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Error parsing an HTTP request.
    #[error("Parse error: {0}")]
    ParseError(#[from] ParserError),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// No route is registered for the method and path.
    #[error("No route for {0} {1}")]
    NotFound(Method, String),

    /// The request body framing is invalid (bad `Content-Length`, broken chunk).
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// The request head exceeds the configured read buffer size.
    #[error("Request head exceeds {0} bytes")]
    HeadTooLarge(usize),

    /// The request body exceeds the configured maximum size.
    #[error("Request body exceeds {0} bytes")]
    BodyTooLarge(usize),

    /// The request head did not arrive in time.
    #[error("Request head not received within {0:?}")]
    HeadTimeout(Duration),

    /// The peer closed the connection in the middle of a request.
    #[error("Connection closed before the request was complete")]
    UnexpectedEof,

    /// A configuration value could not be used.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Internal server error.
    #[error("Internal server error: {0}")]
    InternalError(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
