//! Error types for registration and invocation.

use thiserror::Error;

use crate::engine::shape::Signature;

/// A handler identifier that convention inference cannot turn into a route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConventionError {
    /// No verb synonym leads the identifier.
    #[error("unable to autodetect path and method from {0}")]
    NotAutodetectable(String),
}

/// Errors raised while registering handlers, servers or middleware.
///
/// These are programmer errors; the non-`try` registration calls panic with
/// the error's message.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The callable is not a handler.
    #[error("{name} is not a valid handler: {signature}")]
    InvalidShape { name: String, signature: Signature },

    /// The value passed as a server is not a record or a reference to one.
    #[error("{type_name} is not a struct or a pointer to a struct")]
    InvalidServer { type_name: String },

    /// The path declares more placeholders than the handler has string parameters.
    #[error("{name} takes {expected} path parameters but {template} declares {found}")]
    Arity {
        name: String,
        template: String,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    Convention(#[from] ConventionError),
}

/// The arguments that reached a handler no longer fit it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvocationError {
    #[error("handler expects {expected} path parameters, got {found}")]
    Arity { expected: usize, found: usize },

    #[error("handler expects a body of type {expected}, got {found}")]
    BodyType {
        expected: &'static str,
        found: &'static str,
    },
}
