//! HTTP server implementation.

use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::{mpsc, watch, RwLock, Semaphore};
use tokio::task::JoinSet;

use crate::engine::{Context, Dispatcher, HttpError};
use crate::parser::{expected_length, parse_request};
use crate::server::config::ServerConfig;
use crate::server::error::Error;
use crate::server::response::{HttpResponse, StatusCode};

/// An HTTP server that hands every request to a [`Dispatcher`].
///
/// The dispatcher is a snapshot: [`HttpServer::publish`] swaps in a new one
/// without disturbing requests that are already running on the old one.
pub struct HttpServer {
    /// The server configuration.
    pub config: ServerConfig,
    dispatcher: Arc<RwLock<Arc<Dispatcher>>>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig, dispatcher: Dispatcher) -> Self {
        Self {
            config,
            dispatcher: Arc::new(RwLock::new(Arc::new(dispatcher))),
        }
    }

    /// Replace the routing tables. New connections use the new snapshot.
    pub async fn publish(&self, dispatcher: Dispatcher) {
        *self.dispatcher.write().await = Arc::new(dispatcher);
        info!("Published new routing tables");
    }

    /// The snapshot currently being served.
    pub async fn snapshot(&self) -> Arc<Dispatcher> {
        Arc::clone(&*self.dispatcher.read().await)
    }

    /// Log the registered endpoints.
    async fn display_server_info(&self) {
        let dispatcher = self.snapshot().await;
        info!("Registered endpoints:");
        for route in dispatcher.routes() {
            info!("  {} {} -> {}", route.method(), route.template(), route.name());
        }
    }

    /// Set up the TCP listener.
    async fn setup_listener(&self) -> Result<TcpListener, Error> {
        let listener = TcpListener::bind(&self.config.addr).await?;
        info!("Server listening on http://{addr}", addr = self.config.addr);
        Ok(listener)
    }

    /// Set up a Ctrl+C handler for graceful shutdown.
    fn setup_ctrl_c_handler(shutdown_tx: mpsc::Sender<()>, tasks: &mut JoinSet<()>) {
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
    async fn handle_new_connection(
        mut socket: tokio::net::TcpStream,
        addr: SocketAddr,
        semaphore: Arc<Semaphore>,
        dispatcher: Arc<Dispatcher>,
        config: ServerConfig,
        cancel: watch::Receiver<bool>,
        tasks: &mut JoinSet<()>,
    ) {
        let permit = match semaphore.try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                warn!("Connection limit reached, rejecting connection from {addr}");
                let response = HttpResponse::from_failure(&HttpError::new(
                    StatusCode::SERVICE_UNAVAILABLE.as_u16(),
                    "server is at capacity, please try again later",
                ));
                let _ = socket.write_all(&response.to_bytes()).await;
                return;
            }
        };

        tasks.spawn(async move {
            // The permit is dropped when the task completes, releasing the semaphore slot
            let _permit = permit;

            match Self::handle_connection(&mut socket, &dispatcher, &config, cancel).await {
                Ok(()) => {}
                Err(e @ (Error::ParseError(_) | Error::PayloadTooLarge(_))) => {
                    warn!("Rejected request from {addr}: {e}");
                }
                Err(e) => error!("Error handling connection from {addr}: {e}"),
            }
        });
    }

    /// Handle connection errors.
    async fn handle_connection_error(e: std::io::Error) -> bool {
        error!("Error accepting connection: {e}");

        if e.kind() == std::io::ErrorKind::BrokenPipe {
            error!("Critical error accepting connection, shutting down");
            return true;
        }

        // For other errors, wait a bit before retrying
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        false
    }

    /// Perform graceful shutdown.
    ///
    /// In-flight handlers see their context cancelled and get up to 30
    /// seconds to finish.
    async fn perform_shutdown(tasks: &mut JoinSet<()>, cancel_tx: watch::Sender<bool>) {
        let _ = cancel_tx.send(true);

        info!("Waiting for {len} active connections to complete...", len = tasks.len());
        let shutdown_timeout = tokio::time::Duration::from_secs(30);
        let _ = tokio::time::timeout(shutdown_timeout, async {
            while let Some(res) = tasks.join_next().await {
                if let Err(e) = res {
                    error!("Task failed during shutdown: {e}");
                }
            }
        })
        .await;

        info!("Server shutdown complete");
    }

    /// Start the server and listen for incoming connections.
    pub async fn start(&self) -> Result<(), Error> {
        self.display_server_info().await;

        let listener = self.setup_listener().await?;

        let semaphore = Arc::new(Semaphore::new(self.config.max_connections));
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let mut tasks = JoinSet::new();
        Self::setup_ctrl_c_handler(shutdown_tx, &mut tasks);

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
                                Arc::clone(&semaphore),
                                self.snapshot().await,
                                self.config.clone(),
                                cancel_rx.clone(),
                                &mut tasks,
                            )
                            .await;
                        }
                        Err(e) => {
                            if Self::handle_connection_error(e).await {
                                break;
                            }
                        }
                    }
                }
            }
        }

        Self::perform_shutdown(&mut tasks, cancel_tx).await;

        Ok(())
    }

    /// Read one request: the header block plus `Content-Length` bytes of body.
    ///
    /// Returns an empty buffer if the peer closed the connection without
    /// sending anything.
    pub async fn read_request(
        socket: &mut (impl AsyncRead + Unpin),
        config: &ServerConfig,
    ) -> Result<Vec<u8>, Error> {
        let mut input = Vec::new();
        let mut buf = vec![0; config.read_buffer_size];

        loop {
            let n = socket.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            input.extend_from_slice(&buf[..n]);

            if input.len() > config.max_request_size {
                return Err(Error::PayloadTooLarge(config.max_request_size));
            }
            if let Some(expected) = expected_length(&input) {
                if expected > config.max_request_size {
                    return Err(Error::PayloadTooLarge(config.max_request_size));
                }
                if input.len() >= expected {
                    break;
                }
            }
        }

        Ok(input)
    }

    /// Handle a single connection: read one request, dispatch it and write
    /// the response.
    pub async fn handle_connection(
        socket: &mut (impl AsyncRead + AsyncWrite + Unpin),
        dispatcher: &Dispatcher,
        config: &ServerConfig,
        cancel: watch::Receiver<bool>,
    ) -> Result<(), Error> {
        let input = match Self::read_request(socket, config).await {
            Ok(input) => input,
            Err(e @ Error::PayloadTooLarge(_)) => {
                let response = HttpResponse::from_failure(&HttpError::new(
                    StatusCode::PAYLOAD_TOO_LARGE.as_u16(),
                    e.to_string(),
                ));
                Self::write_response(socket, &response).await?;
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        if input.is_empty() {
            return Ok(()); // Connection closed
        }

        let request = match parse_request(&input) {
            Ok(request) => request,
            Err(e) => {
                let response = HttpResponse::from_failure(&HttpError::bad_request(format!("Error parsing request: {e}")));
                Self::write_response(socket, &response).await?;
                return Err(Error::ParseError(e));
            }
        };

        let context = Context::background().with_cancel(cancel);
        let response = dispatcher.dispatch_with(&request, context).await;
        debug!(
            "{} {} -> {}",
            request.method,
            request.path,
            response.status.as_u16()
        );

        Self::write_response(socket, &response).await
    }

    // The response is already committed; a failed write is logged and
    // reported, never retried.
    async fn write_response(
        socket: &mut (impl AsyncWrite + Unpin),
        response: &HttpResponse,
    ) -> Result<(), Error> {
        let result = async {
            socket.write_all(&response.to_bytes()).await?;
            socket.flush().await
        }
        .await;

        result.map_err(|e| {
            error!("Unable to write response: {e}");
            Error::IoError(e)
        })
    }
}
