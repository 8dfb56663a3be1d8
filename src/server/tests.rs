//! Tests for the HTTP server implementation.

#[cfg(test)]
mod server_tests {
    use std::io::{self, Cursor};
    use std::pin::Pin;
    use std::task::{Context as TaskContext, Poll};

    use log::debug;
    use serde::{Deserialize, Serialize};
    use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadBuf};
    use tokio::sync::watch;

    use crate::engine::{Body, Context, Dispatcher, Engine, EngineOptions, ErrorResponse, HandlerOptions, HttpError, Payload};
    use crate::parser::Method;
    use crate::server::{Error, HttpResponse, HttpServer, ServerConfig, StatusCode};

    // Mock TcpStream for testing
    struct MockTcpStream {
        read_data: Cursor<Vec<u8>>,
        write_data: Vec<u8>,
    }

    impl MockTcpStream {
        fn new(read_data: Vec<u8>) -> Self {
            Self {
                read_data: Cursor::new(read_data),
                write_data: Vec::new(),
            }
        }

        fn written_data(&self) -> &[u8] {
            &self.write_data
        }

        fn head(&self) -> String {
            let text = String::from_utf8_lossy(&self.write_data);
            text.split("\r\n\r\n").next().unwrap_or_default().to_string()
        }

        fn body(&self) -> &[u8] {
            let end = self
                .write_data
                .windows(4)
                .position(|window| window == b"\r\n\r\n")
                .unwrap();
            &self.write_data[end + 4..]
        }
    }

    impl AsyncRead for MockTcpStream {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut TaskContext<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            let this = self.get_mut();
            let n = std::io::Read::read(&mut this.read_data, buf.initialize_unfilled())?;
            buf.advance(n);
            Poll::Ready(Ok(()))
        }
    }

    impl AsyncWrite for MockTcpStream {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut TaskContext<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            let this = self.get_mut();
            this.write_data.extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut TaskContext<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut TaskContext<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Foo {
        name: String,
    }

    impl Payload for Foo {}

    #[derive(Serialize)]
    struct Bar {}

    impl Payload for Bar {}

    mod api {
        pub mod v1 {
            pub mod foo {
                use std::sync::Arc;

                use crate::engine::{Context, HandlerOptions, Operations};

                use super::super::super::Foo;

                pub struct Server;

                impl crate::engine::Server for Server {
                    fn operations(self: Arc<Self>, ops: &mut Operations) {
                        ops.instantiator("Update", || {
                            (
                                Some(HandlerOptions::new().path("/eamon/update/foo")),
                                |_ctx: Context, foo: Foo| async move { Ok::<_, String>(foo) },
                            )
                        })
                        .handler("Create", |_ctx: Context, foo: Foo| async move { Ok::<_, String>(foo) });
                    }
                }
            }
        }
    }

    async fn list_foos(_ctx: Context, _body: serde_json::Value) -> Result<Vec<Foo>, String> {
        Ok(vec![
            Foo {
                name: "Eamon".to_string(),
            },
            Foo {
                name: "Courtney".to_string(),
            },
        ])
    }

    async fn create_foo(_ctx: Context, _foo: Foo) -> Result<Bar, String> {
        Ok(Bar {})
    }

    async fn get_cancelled(ctx: Context, _body: ()) -> Result<bool, HttpError> {
        Ok(ctx.is_cancelled())
    }

    fn log_request(ctx: Context, body: Body, params: Vec<String>) -> (Context, Body, Vec<String>) {
        debug!("calling log request middleware: {:?}", body.to_json());
        (ctx, body, params)
    }

    fn example_dispatcher() -> Dispatcher {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut engine = Engine::with_options(EngineOptions::new().package("autoroute::server::tests::server_tests"));
        engine.register_middleware("/api/v1/foos", log_request);
        engine.register_handler(
            list_foos,
            Some(HandlerOptions::new().path("/api/v1/foos").method(Method::GET)),
        );
        engine.register_handler(create_foo, Some(HandlerOptions::new().prefix("/api/v1")));
        engine.register_server(api::v1::foo::Server, None);
        engine.dispatcher()
    }

    fn live() -> watch::Receiver<bool> {
        watch::channel(false).1
    }

    async fn serve(dispatcher: &Dispatcher, config: &ServerConfig, request: &[u8]) -> (MockTcpStream, Result<(), Error>) {
        let mut stream = MockTcpStream::new(request.to_vec());
        let result = HttpServer::handle_connection(&mut stream, dispatcher, config, live()).await;
        (stream, result)
    }

    #[tokio::test]
    async fn test_server_creation() {
        let config = ServerConfig {
            addr: "127.0.0.1:8080".parse().unwrap(),
            max_connections: 100,
            read_buffer_size: 4096,
            max_request_size: 65536,
        };

        let server = HttpServer::new(config.clone(), example_dispatcher());
        assert_eq!(server.config.addr, config.addr);
        assert_eq!(server.config.max_connections, config.max_connections);
        assert_eq!(server.config.read_buffer_size, config.read_buffer_size);
        assert_eq!(server.config.max_request_size, config.max_request_size);
    }

    #[tokio::test]
    async fn test_server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.max_connections, 1024);
        assert_eq!(config.read_buffer_size, 8192);
        assert_eq!(config.max_request_size, 1024 * 1024);
    }

    #[tokio::test]
    async fn test_publish_swaps_snapshot() {
        let server = HttpServer::new(ServerConfig::default(), Engine::new().dispatcher());
        let old = server.snapshot().await;
        assert!(old.route("/api/v1/foos", Method::GET).is_none());

        server.publish(example_dispatcher()).await;

        let new = server.snapshot().await;
        assert!(new.route("/api/v1/foos", Method::GET).is_some());
        // Requests already holding the old snapshot keep seeing it.
        assert!(old.route("/api/v1/foos", Method::GET).is_none());
    }

    #[tokio::test]
    async fn test_list_foos() {
        let dispatcher = example_dispatcher();
        let request = b"GET /api/v1/foos HTTP/1.1\r\nHost: localhost\r\n\r\n";

        let (stream, result) = serve(&dispatcher, &ServerConfig::default(), request).await;
        assert!(result.is_ok());

        let head = stream.head();
        assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(head.contains("Content-Type: application/json"));
        assert!(head.contains("Server: autoroute-rs"));
        assert_eq!(stream.body(), br#"[{"name":"Eamon"},{"name":"Courtney"}]"#);
    }

    #[tokio::test]
    async fn test_instantiator_route_echoes_body() {
        let dispatcher = example_dispatcher();
        let request = b"PUT /eamon/update/foo HTTP/1.1\r\n\
            Host: localhost\r\n\
            Content-Type: application/json\r\n\
            Content-Length: 11\r\n\
            \r\n\
            {\"name\":\"\"}";

        let (stream, result) = serve(&dispatcher, &ServerConfig::default(), request).await;
        assert!(result.is_ok());
        assert!(stream.head().starts_with("HTTP/1.1 200 OK\r\n"));
        assert_eq!(stream.body(), br#"{"name":""}"#);
    }

    #[tokio::test]
    async fn test_server_registration_replaces_earlier_handler() {
        let dispatcher = example_dispatcher();
        assert_eq!(dispatcher.route("/api/v1/foo", Method::POST).unwrap().name(), "Create");

        let body = r#"{"name":"Courtney"}"#;
        let request = format!(
            "POST /api/v1/foo HTTP/1.1\r\nHost: localhost\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        );

        let (stream, result) = serve(&dispatcher, &ServerConfig::default(), request.as_bytes()).await;
        assert!(result.is_ok());
        assert_eq!(stream.body(), body.as_bytes());
    }

    #[tokio::test]
    async fn test_unmatched_path() {
        let dispatcher = example_dispatcher();
        let request = b"GET /nonexistent HTTP/1.1\r\nHost: localhost\r\n\r\n";

        let (stream, result) = serve(&dispatcher, &ServerConfig::default(), request).await;
        assert!(result.is_ok());
        assert!(stream.head().starts_with("HTTP/1.1 400 Bad Request\r\n"));

        let error: ErrorResponse = serde_json::from_slice(stream.body()).unwrap();
        assert_eq!(error.kind, "error");
        assert_eq!(error.status, 400);
        assert_eq!(error.message, "not found");
    }

    #[tokio::test]
    async fn test_method_without_handler() {
        let dispatcher = example_dispatcher();
        let request = b"DELETE /api/v1/foos HTTP/1.1\r\nHost: localhost\r\n\r\n";

        let (stream, _) = serve(&dispatcher, &ServerConfig::default(), request).await;
        let head = stream.head();
        assert!(head.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(head.contains("Allow: GET\r\n"));
    }

    #[tokio::test]
    async fn test_handle_connection_with_invalid_request() {
        let dispatcher = example_dispatcher();

        let (stream, result) = serve(&dispatcher, &ServerConfig::default(), b"INVALID REQUEST").await;
        assert!(matches!(result, Err(Error::ParseError(_))));

        assert!(stream.head().starts_with("HTTP/1.1 400 Bad Request\r\n"));
        let error: ErrorResponse = serde_json::from_slice(stream.body()).unwrap();
        assert!(error.message.starts_with("Error parsing request:"));
    }

    #[tokio::test]
    async fn test_payload_too_large() {
        let dispatcher = example_dispatcher();
        let config = ServerConfig {
            max_request_size: 64,
            ..ServerConfig::default()
        };
        let request = b"POST /api/v1/foo HTTP/1.1\r\nHost: localhost\r\nContent-Length: 1000\r\n\r\n{}";

        let (stream, result) = serve(&dispatcher, &config, request).await;
        assert!(matches!(result, Err(Error::PayloadTooLarge(64))));
        assert!(stream.head().starts_with("HTTP/1.1 413 Payload Too Large\r\n"));

        let error: ErrorResponse = serde_json::from_slice(stream.body()).unwrap();
        assert_eq!(error.status, 413);
    }

    #[tokio::test]
    async fn test_reads_request_in_small_chunks() {
        let dispatcher = example_dispatcher();
        let config = ServerConfig {
            read_buffer_size: 4,
            ..ServerConfig::default()
        };
        let request = b"PUT /eamon/update/foo HTTP/1.1\r\nHost: localhost\r\nContent-Length: 16\r\n\r\n{\"name\":\"Eamon\"}";

        let (stream, result) = serve(&dispatcher, &config, request).await;
        assert!(result.is_ok());
        assert_eq!(stream.body(), br#"{"name":"Eamon"}"#);
    }

    #[tokio::test]
    async fn test_closed_connection() {
        let dispatcher = example_dispatcher();
        let (stream, result) = serve(&dispatcher, &ServerConfig::default(), b"").await;
        assert!(result.is_ok());
        assert!(stream.written_data().is_empty());
    }

    #[tokio::test]
    async fn test_transport_cancellation_reaches_handler() {
        let mut engine = Engine::new();
        engine.register_handler(get_cancelled, None);
        let dispatcher = engine.dispatcher();

        let (cancel_tx, cancel_rx) = watch::channel(false);
        cancel_tx.send(true).unwrap();

        let mut stream = MockTcpStream::new(b"GET /cancelled HTTP/1.0\r\n\r\n".to_vec());
        let result = HttpServer::handle_connection(&mut stream, &dispatcher, &ServerConfig::default(), cancel_rx).await;
        assert!(result.is_ok());
        assert_eq!(stream.body(), b"true");
    }

    #[tokio::test]
    async fn test_server_connection_limit_response() {
        let mut socket = MockTcpStream::new(Vec::new());

        let response = HttpResponse::from_failure(&HttpError::new(
            StatusCode::SERVICE_UNAVAILABLE.as_u16(),
            "server is at capacity, please try again later",
        ));
        socket.write_all(&response.to_bytes()).await.unwrap();

        let head = socket.head();
        assert!(head.starts_with("HTTP/1.1 503 Service Unavailable\r\n"));
        assert!(head.contains("Content-Type: application/json\r\n"));
        let error: ErrorResponse = serde_json::from_slice(socket.body()).unwrap();
        assert_eq!(error.status, 503);
    }

    #[test]
    fn test_response_serialization() {
        let response = HttpResponse::new(StatusCode::CREATED)
            .with_content_type("text/plain")
            .with_body_string("made");
        let text = String::from_utf8(response.to_bytes()).unwrap();

        assert!(text.starts_with("HTTP/1.1 201 Created\r\n"));
        assert!(text.contains("Content-Length: 4\r\n"));
        assert!(text.ends_with("\r\n\r\nmade"));
        assert_eq!(StatusCode::from_u16(418).reason_phrase(), "Client Error");
        assert_eq!(StatusCode::from_u16(42), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
