//! A convention-driven HTTP router and dispatcher.
//!
//! Handlers are plain async functions. Their path and method are inferred
//! from their names (`list_foos` becomes `GET /foos`, `CreateFoo` becomes
//! `POST /foo`), request bodies are decoded from JSON into the handler's
//! body type, trailing `String` parameters bind to path placeholders, and
//! results are encoded back as JSON. Errors are rendered as a uniform
//! envelope:
//!
//! ```json
//! {"type":"error","status":400,"code":"error","message":"not found","detail":"not found"}
//! ```
//!
//! # Features
//!
//! - Path and method inference from handler names, with explicit overrides
//! - Bulk registration of the operations of a server value
//! - Per-path middleware, applied last-registered first
//! - A registry of request and response types with unique short names
//! - Panics inside handlers become 500 responses
//! - A small tokio HTTP server that serves immutable routing snapshots
//!
//! # Examples
//!
//! ## Registering and dispatching
//!
//! ```
//! use autoroute::{Context, Engine, HandlerOptions, HttpRequest, HttpVersion, Method, StatusCode};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Default, Serialize, Deserialize)]
//! struct Foo {
//!     name: String,
//! }
//!
//! impl autoroute::Payload for Foo {}
//!
//! async fn list_foos(_ctx: Context, _body: ()) -> Result<Vec<Foo>, String> {
//!     Ok(vec![Foo { name: "Eamon".to_string() }, Foo { name: "Courtney".to_string() }])
//! }
//!
//! let mut engine = Engine::new();
//! engine.register_handler(list_foos, Some(HandlerOptions::new().prefix("/api/v1")));
//! let dispatcher = engine.dispatcher();
//!
//! let request = HttpRequest::new(Method::GET, "/api/v1/foos", HttpVersion::Http10, Default::default());
//! let response = tokio::runtime::Runtime::new()
//!     .unwrap()
//!     .block_on(dispatcher.dispatch(&request));
//!
//! assert_eq!(response.status, StatusCode::OK);
//! assert_eq!(response.body, br#"[{"name":"Eamon"},{"name":"Courtney"}]"#.to_vec());
//! ```
//!
//! ## Serving
//!
//! ```no_run
//! use autoroute::{Engine, HttpServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), autoroute::ServerError> {
//!     let engine = Engine::new();
//!     let server = HttpServer::new(ServerConfig::default(), engine.dispatcher());
//!     server.start().await
//! }
//! ```

// Export the parser module
pub mod parser;

// Export the router module
pub mod router;

// Export the registration and dispatch engine
pub mod engine;

// Export the server module
pub mod server;

// Re-export commonly used items for convenience
pub use engine::{
    Body, Context, Dispatcher, Engine, EngineOptions, ErrorResponse, Failure, HandlerOptions, HttpError, Operations,
    Payload, RegistrationError, Server, ServerOptions,
};
pub use parser::{parse_request, Error as ParserError, HttpRequest, HttpVersion, Method};
pub use server::{Error as ServerError, HttpResponse, HttpServer, ServerConfig, StatusCode};
