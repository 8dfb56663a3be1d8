//! Per-path argument transforms applied before a handler runs.

use std::sync::Arc;

use crate::engine::context::Context;
use crate::engine::handler::Body;

/// Transforms the arguments of a handler call.
///
/// Any `Fn(Context, Body, Vec<String>) -> (Context, Body, Vec<String>)`
/// is a middleware:
///
/// ```
/// use std::time::Duration;
/// use autoroute::engine::{Body, Context, Engine};
///
/// let mut engine = Engine::new();
/// engine.register_middleware("/api/v1/foos", |context: Context, body: Body, params: Vec<String>| {
///     (context.with_timeout(Duration::from_secs(5)), body, params)
/// });
/// ```
pub trait Middleware: Send + Sync + 'static {
    fn apply(&self, context: Context, body: Body, params: Vec<String>) -> (Context, Body, Vec<String>);
}

impl<F> Middleware for F
where
    F: Fn(Context, Body, Vec<String>) -> (Context, Body, Vec<String>) + Send + Sync + 'static,
{
    fn apply(&self, context: Context, body: Body, params: Vec<String>) -> (Context, Body, Vec<String>) {
        self(context, body, params)
    }
}

/// Run a path's middleware, last registered first.
pub(crate) fn apply_chain(
    chain: &[Arc<dyn Middleware>],
    context: Context,
    body: Body,
    params: Vec<String>,
) -> (Context, Body, Vec<String>) {
    chain
        .iter()
        .rev()
        .fold((context, body, params), |(context, body, params), middleware| {
            middleware.apply(context, body, params)
        })
}
