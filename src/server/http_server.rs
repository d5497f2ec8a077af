//! HTTP server implementation.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio::signal;
use log::{debug, info, warn, error};

use crate::parser::{head_len, HttpRequest};
use crate::server::config::ServerConfig;
use crate::server::error::Error;
use crate::server::handler::Router;
use crate::server::reader::{RequestLimits, RequestReader};
use crate::server::response::{HttpResponse, StatusCode};

/// How long an over-limit connection gets to send its request head before
/// the `503` is written anyway.
const REJECT_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// An HTTP server.
pub struct HttpServer {
    /// The server configuration.
    pub config: ServerConfig,
    /// The route table, fixed for the lifetime of the server.
    pub router: Arc<Router>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and routes.
    pub fn new(config: ServerConfig, router: Router) -> Self {
        Self {
            config,
            router: Arc::new(router),
        }
    }

    /// Log the registered endpoints.
    fn display_server_info(&self) {
        info!("Registered endpoints:");
        for route in self.router.routes() {
            info!("  {method} {path}", method = route.method, path = route.path);
        }
    }

    /// Set up the TCP listener.
    async fn setup_listener(&self) -> Result<TcpListener, Error> {
        let listener = TcpListener::bind(&self.config.addr).await?;
        info!("Server listening on http://{addr}", addr = listener.local_addr()?);
        Ok(listener)
    }

    /// Set up a Ctrl+C handler for graceful shutdown.
    fn setup_ctrl_c_handler(shutdown_tx: Arc<mpsc::Sender<()>>, tasks: &mut JoinSet<()>) {
        tasks.spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received Ctrl+C, initiating graceful shutdown");
                    let _ = shutdown_tx.send(()).await;
                }
                Err(e) => {
                    error!("Error setting up Ctrl+C handler: {e}");
                }
            }
        });
    }

    /// Handle a new connection.
    fn handle_new_connection(
        mut socket: TcpStream,
        addr: SocketAddr,
        semaphore: Arc<Semaphore>,
        router: Arc<Router>,
        limits: RequestLimits,
        tasks: &mut JoinSet<()>,
    ) {
        let permit = match semaphore.try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                warn!("Connection limit reached, rejecting connection from {addr}");
                tasks.spawn(async move {
                    if let Err(e) = Self::reject_connection(&mut socket, limits).await {
                        debug!("Could not send 503 to {addr}: {e}");
                    }
                });
                return;
            }
        };

        debug!("Connection from: {addr}");

        tasks.spawn(async move {
            // The permit is dropped when the task completes, releasing the semaphore slot
            let _permit = permit;

            if let Err(e) = Self::handle_connection(&mut socket, &router, limits).await {
                error!("Error handling connection from {addr}: {e}");
            }
        });
    }

    /// Answer `503` on a connection over the limit.
    ///
    /// The request head is read first, for at most [`REJECT_DRAIN_TIMEOUT`],
    /// so that closing the socket does not discard unread bytes and reset the
    /// connection before the client sees the response.
    pub(crate) async fn reject_connection(
        socket: &mut (impl AsyncRead + AsyncWrite + Unpin),
        limits: RequestLimits,
    ) -> std::io::Result<()> {
        let mut head = Vec::new();
        let mut chunk = vec![0; limits.max_head.max(1)];

        let _ = tokio::time::timeout(REJECT_DRAIN_TIMEOUT, async {
            while head_len(&head).is_none() && head.len() <= limits.max_head {
                match socket.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => head.extend_from_slice(&chunk[..n]),
                }
            }
        })
        .await;

        let response = HttpResponse::new(StatusCode::ServiceUnavailable)
            .with_content_type("text/plain")
            .with_header("Connection", "close")
            .with_body_string("Server is at capacity, please try again later");
        socket.write_all(&response.to_bytes()).await?;
        socket.flush().await?;
        socket.shutdown().await
    }

    /// Handle connection errors.
    async fn handle_connection_error(e: std::io::Error) -> bool {
        error!("Error accepting connection: {e}");

        if e.kind() == std::io::ErrorKind::BrokenPipe {
            error!("Critical error accepting connection, shutting down");
            return true;
        }

        // For other errors, wait a bit before retrying
        tokio::time::sleep(Duration::from_millis(100)).await;
        false
    }

    /// Perform graceful shutdown.
    async fn perform_shutdown(tasks: &mut JoinSet<()>) {
        info!("Waiting for {len} active connections to complete...", len = tasks.len());
        let shutdown_timeout = Duration::from_secs(30);
        let _ = tokio::time::timeout(shutdown_timeout, async {
            while let Some(res) = tasks.join_next().await {
                if let Err(e) = res {
                    error!("Task failed during shutdown: {e}");
                }
            }
        }).await;

        info!("Server shutdown complete");
    }

    /// Bind the configured address and serve until Ctrl+C.
    pub async fn start(&self) -> Result<(), Error> {
        let listener = self.setup_listener().await?;
        self.serve(listener).await
    }

    /// Serve connections from an already bound listener until Ctrl+C.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), Error> {
        self.display_server_info();

        let semaphore = Arc::new(Semaphore::new(self.config.max_connections));
        let limits = RequestLimits::from(&self.config);

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let shutdown_tx = Arc::new(shutdown_tx);

        // Use JoinSet to keep track of all spawned tasks
        let mut tasks = JoinSet::new();

        Self::setup_ctrl_c_handler(shutdown_tx.clone(), &mut tasks);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Shutting down server...");
                    break;
                }

                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((socket, addr)) => {
                            Self::handle_new_connection(
                                socket,
                                addr,
                                semaphore.clone(),
                                self.router.clone(),
                                limits,
                                &mut tasks
                            );
                        },
                        Err(e) => {
                            if Self::handle_connection_error(e).await {
                                break;
                            }
                        }
                    }
                }
            }

            // Reap finished connection tasks so the set does not grow unbounded
            while tasks.try_join_next().is_some() {}
        }

        Self::perform_shutdown(&mut tasks).await;

        Ok(())
    }

    /// Serve requests on one connection until the peer closes it, asks for
    /// `Connection: close`, or sends a request that cannot be framed.
    ///
    /// Routing misses and handler failures are answered with 404 and 500 and
    /// do not end the connection. Framing and parse failures are answered
    /// with a 4xx, close the connection, and are returned as the error.
    pub async fn handle_connection(
        socket: &mut (impl AsyncRead + AsyncWrite + Unpin),
        router: &Router,
        limits: RequestLimits,
    ) -> Result<(), Error> {
        let mut reader = RequestReader::new(limits);

        loop {
            let request = match reader.next_request(socket).await {
                Ok(Some(request)) => request,
                Ok(None) => return Ok(()), // Connection closed
                Err(e) => {
                    if let Some(response) = Self::framing_error_response(&e) {
                        let response = response.with_header("Connection", "close");
                        socket.write_all(&response.to_bytes()).await?;
                        socket.flush().await?;
                    }
                    return Err(e);
                }
            };

            let keep_alive = request.keep_alive();

            let mut response = Self::respond(router, request).await;
            if !keep_alive {
                response = response.with_header("Connection", "close");
            }

            socket.write_all(&response.to_bytes()).await?;
            socket.flush().await?;

            if !keep_alive {
                return Ok(());
            }
        }
    }

    /// Dispatch one request and turn routing and handler errors into responses.
    async fn respond(router: &Router, request: HttpRequest) -> HttpResponse {
        debug!("{method} {path}", method = request.method, path = request.path);

        match router.dispatch(request).await {
            Ok(response) => response,
            Err(Error::NotFound(method, path)) => {
                warn!("No route for {method} {path}");
                HttpResponse::new(StatusCode::NotFound)
                    .with_content_type("text/plain")
                    .with_body_string(format!("Not found: {path}"))
            }
            Err(e) => {
                error!("Handler failed: {e}");
                HttpResponse::new(StatusCode::InternalServerError)
                    .with_content_type("text/plain")
                    .with_body_string(format!("Internal server error: {e}"))
            }
        }
    }

    /// The response sent before closing a connection whose request could not
    /// be read, if any can be sent at all.
    fn framing_error_response(e: &Error) -> Option<HttpResponse> {
        let status = match e {
            Error::ParseError(_) | Error::InvalidBody(_) => StatusCode::BadRequest,
            Error::HeadTooLarge(_) => StatusCode::RequestHeaderFieldsTooLarge,
            Error::BodyTooLarge(_) => StatusCode::PayloadTooLarge,
            Error::HeadTimeout(_) => StatusCode::RequestTimeout,
            _ => return None,
        };

        Some(
            HttpResponse::new(status)
                .with_content_type("text/plain")
                .with_body_string(format!("Error parsing request: {e}")),
        )
    }
}
