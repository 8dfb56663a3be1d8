//! HTTP transport for the dispatcher.
//!
//! A small tokio server that reads one request per connection, hands it to
//! a [`crate::engine::Dispatcher`] snapshot and writes the response back.

mod response;
mod config;
mod error;
mod http_server;
mod tests;

// Re-export public items
pub use response::{HttpResponse, StatusCode};
pub use config::ServerConfig;
pub use error::Error;
pub use http_server::HttpServer;
