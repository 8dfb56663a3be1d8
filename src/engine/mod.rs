//! Registration and dispatch engine.
//!
//! Handlers are registered on an [`Engine`], which infers each route's path
//! and method from the handler's name unless [`HandlerOptions`] say
//! otherwise. [`Engine::dispatcher`] freezes the result into a
//! [`Dispatcher`] that serves requests.

pub mod convention;
mod context;
mod dispatch;
mod error;
mod failure;
mod handler;
mod middleware;
mod options;
mod registration;
mod schema;
mod service;
mod shape;

pub use context::{Context, QUERY_MAP_KEY};
pub use dispatch::Dispatcher;
pub use error::{ConventionError, InvocationError, RegistrationError};
pub use failure::{ErrorResponse, Failure, HttpError};
pub use handler::{
    decode_body, Body, DecodeFn, Handler, HandlerFn, HandlerFuture, Instantiator, Outcome, Prepared, Reply,
    RequestBody, Route,
};
pub use middleware::Middleware;
pub use options::{EngineOptions, HandlerOptions, ServerOptions};
pub use registration::Engine;
pub use schema::{SchemaEntry, SchemaRegistry};
pub use service::{Candidate, Operations, Server};
pub use shape::{classify, Kind, Payload, Signature, TypeName, TypeShape};
