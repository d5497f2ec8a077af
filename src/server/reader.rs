//! Reading framed HTTP/1.1 requests from a byte stream.
//!
//! A [`RequestReader`] owns the connection's read buffer, so bytes that belong
//! to a pipelined next request survive between calls.

use std::time::Duration;

use log::debug;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use crate::parser::{head_len, parse_request, HttpRequest};
use crate::server::config::ServerConfig;
use crate::server::error::Error;
use crate::server::response::StatusCode;

/// Size limits applied while reading a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLimits {
    /// The largest accepted request head, and the size of each socket read.
    pub max_head: usize,
    /// The largest accepted request body.
    pub max_body: usize,
    /// How long to wait for a complete request head.
    pub head_timeout: Duration,
}

impl From<&ServerConfig> for RequestLimits {
    fn from(config: &ServerConfig) -> Self {
        Self {
            max_head: config.read_buffer_size,
            max_body: config.max_body_size,
            head_timeout: config.keep_alive_timeout,
        }
    }
}

/// Reads one request at a time off a connection.
pub struct RequestReader {
    limits: RequestLimits,
    buf: Vec<u8>,
    scratch: Vec<u8>,
}

impl RequestReader {
    pub fn new(limits: RequestLimits) -> Self {
        Self {
            limits,
            buf: Vec::new(),
            scratch: vec![0; limits.max_head.max(1)],
        }
    }

    /// Read the next complete request, body included.
    ///
    /// Returns `Ok(None)` when the peer closes the connection between
    /// requests, or leaves it idle for longer than the head timeout.
    pub async fn next_request<S>(&mut self, socket: &mut S) -> Result<Option<HttpRequest>, Error>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let waited = timeout(self.limits.head_timeout, self.read_head(socket)).await;
        let head_end = match waited {
            Ok(Ok(Some(end))) => end,
            Ok(Ok(None)) => return Ok(None),
            Ok(Err(e)) => return Err(e),
            Err(_) if self.buf.is_empty() => {
                debug!("Closing connection idle for {:?}", self.limits.head_timeout);
                return Ok(None);
            }
            Err(_) => return Err(Error::HeadTimeout(self.limits.head_timeout)),
        };

        if head_end > self.limits.max_head {
            return Err(Error::HeadTooLarge(self.limits.max_head));
        }

        let head: Vec<u8> = self.buf.drain(..head_end).collect();
        let mut request = parse_request(&head)?;

        let content_length = if request.is_chunked() {
            None
        } else {
            request
                .get_header("Content-Length")
                .map(|raw| {
                    raw.trim()
                        .parse::<usize>()
                        .map_err(|_| Error::InvalidBody(format!("bad Content-Length '{raw}'")))
                })
                .transpose()?
        };

        if let Some(length) = content_length {
            if length > self.limits.max_body {
                return Err(Error::BodyTooLarge(self.limits.max_body));
            }
        }

        let has_body = request.is_chunked() || content_length.is_some_and(|n| n > 0);
        if has_body && request.expects_continue() && self.buf.is_empty() {
            let interim = format!(
                "HTTP/1.1 {} {}\r\n\r\n",
                StatusCode::Continue.as_u16(),
                StatusCode::Continue.reason_phrase()
            );
            socket.write_all(interim.as_bytes()).await?;
            socket.flush().await?;
        }

        request.body = if request.is_chunked() {
            self.read_chunked(socket).await?
        } else {
            self.read_exact(socket, content_length.unwrap_or(0)).await?
        };

        debug!(
            "Read {method} {path} with a {len} byte body",
            method = request.method,
            path = request.path,
            len = request.body.len()
        );

        Ok(Some(request))
    }

    /// Buffer bytes until a whole head has arrived and return its length.
    /// `None` means the peer closed the connection before sending anything.
    async fn read_head<S>(&mut self, socket: &mut S) -> Result<Option<usize>, Error>
    where
        S: AsyncRead + Unpin,
    {
        loop {
            self.skip_leading_newlines();

            if let Some(end) = head_len(&self.buf) {
                return Ok(Some(end));
            }
            if self.buf.len() > self.limits.max_head {
                return Err(Error::HeadTooLarge(self.limits.max_head));
            }
            if self.fill(socket).await? == 0 {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                return Err(Error::UnexpectedEof);
            }
        }
    }

    /// Read a `Transfer-Encoding: chunked` body. Chunk extensions and
    /// trailers are discarded.
    async fn read_chunked<S>(&mut self, socket: &mut S) -> Result<Vec<u8>, Error>
    where
        S: AsyncRead + Unpin,
    {
        let mut body = Vec::new();

        loop {
            let line = self.read_line(socket).await?;
            let size_field = line.split(';').next().unwrap_or("").trim();
            let size = usize::from_str_radix(size_field, 16)
                .map_err(|_| Error::InvalidBody(format!("bad chunk size '{size_field}'")))?;

            if size == 0 {
                // Trailer section ends with an empty line
                while !self.read_line(socket).await?.is_empty() {}
                return Ok(body);
            }

            if body.len().saturating_add(size) > self.limits.max_body {
                return Err(Error::BodyTooLarge(self.limits.max_body));
            }

            let chunk = self.read_exact(socket, size).await?;
            body.extend_from_slice(&chunk);

            if !self.read_line(socket).await?.is_empty() {
                return Err(Error::InvalidBody("chunk data not followed by CRLF".to_string()));
            }
        }
    }

    /// Read one line, without its line ending.
    async fn read_line<S>(&mut self, socket: &mut S) -> Result<String, Error>
    where
        S: AsyncRead + Unpin,
    {
        loop {
            if let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
                let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                return Ok(String::from_utf8_lossy(&line).into_owned());
            }
            if self.buf.len() > self.limits.max_head {
                return Err(Error::InvalidBody("chunk line too long".to_string()));
            }
            if self.fill(socket).await? == 0 {
                return Err(Error::UnexpectedEof);
            }
        }
    }

    async fn read_exact<S>(&mut self, socket: &mut S, len: usize) -> Result<Vec<u8>, Error>
    where
        S: AsyncRead + Unpin,
    {
        while self.buf.len() < len {
            if self.fill(socket).await? == 0 {
                return Err(Error::UnexpectedEof);
            }
        }
        Ok(self.buf.drain(..len).collect())
    }

    async fn fill<S>(&mut self, socket: &mut S) -> Result<usize, Error>
    where
        S: AsyncRead + Unpin,
    {
        let n = socket.read(&mut self.scratch).await?;
        self.buf.extend_from_slice(&self.scratch[..n]);
        Ok(n)
    }

    /// Clients may send stray CRLFs after a body; they are not part of the
    /// next request.
    fn skip_leading_newlines(&mut self) {
        let stray = self
            .buf
            .iter()
            .take_while(|&&b| b == b'\r' || b == b'\n')
            .count();
        self.buf.drain(..stray);
    }
}
