//! HTTP server implementation.
//!
//! A small tokio server that frames HTTP/1.1 requests itself and writes
//! responses byte-for-byte, so header names reach the wire exactly as the
//! handlers spelled them.

mod response;
mod config;
mod error;
mod handler;
mod http_server;
mod reader;

// Re-export public items
pub use response::{HttpResponse, StatusCode, TEXT_PLAIN_UTF8};
pub use config::{ServerConfig, DEFAULT_PORT};
pub use error::Error;
pub use handler::{HandlerFn, HandlerFuture, Route, Router};
pub use http_server::HttpServer;
pub use reader::{RequestLimits, RequestReader};
