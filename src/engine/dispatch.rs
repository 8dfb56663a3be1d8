//! Per-request dispatch: match, bind arguments, run middleware, invoke, render.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use log::{error, warn};

use crate::engine::context::{Context, QUERY_MAP_KEY};
use crate::engine::failure::HttpError;
use crate::engine::handler::{decode_body, Outcome, Route};
use crate::engine::middleware::{apply_chain, Middleware};
use crate::engine::registration::{lookup, Tables};
use crate::engine::schema::SchemaRegistry;
use crate::parser::{HttpRequest, Method};
use crate::router::decode_path;
use crate::server::{HttpResponse, StatusCode};

const NOT_FOUND: &str = "not found";
const ARITY_MISMATCH: &str = "invalid number of path parameters defined in handler";
const HANDLER_PANICKED: &str = "internal error while calling http handler";

/// An immutable snapshot of the registration tables that serves requests.
///
/// Cloning is cheap; every clone shares the same tables.
#[derive(Clone, Default)]
pub struct Dispatcher {
    tables: Arc<Tables>,
}

impl Dispatcher {
    pub(crate) fn new(tables: Tables) -> Self {
        Self {
            tables: Arc::new(tables),
        }
    }

    /// The route bound to `(path, method)`, if any. `path` is the template.
    pub fn route(&self, path: &str, method: Method) -> Option<&Route> {
        lookup(&self.tables.routes, path, method)
    }

    /// All bound routes, sorted by template then method.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.tables.routes.values().flat_map(|methods| methods.values().map(AsRef::as_ref))
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.tables.schemas
    }

    /// Dispatch a request with a background context.
    pub async fn dispatch(&self, request: &HttpRequest) -> HttpResponse {
        self.dispatch_with(request, Context::background()).await
    }

    /// Dispatch a request. `base` is the transport's context; the query map
    /// is added to it before the handler sees it.
    pub async fn dispatch_with(&self, request: &HttpRequest, base: Context) -> HttpResponse {
        let path = match decode_path(&request.path) {
            Ok(path) => path,
            Err(e) => {
                warn!("Rejected path {}: {e}", request.path);
                return HttpResponse::from_failure(&HttpError::bad_request(format!("invalid path encoding: {e}")));
            }
        };

        if request.method == Method::GET && self.tables.schema_path.as_deref() == Some(path.as_str()) {
            return self.render_schemas();
        }

        let Some(matched) = self.tables.router.match_path(&path) else {
            warn!("No route matches {} {}", request.method, request.path);
            return HttpResponse::from_failure(&HttpError::bad_request(NOT_FOUND));
        };

        let template = matched.template;
        let params: Vec<String> = matched.params.into_iter().map(|(_, value)| value).collect();

        match lookup(&self.tables.routes, template, request.method) {
            Some(route) => self.handle(route, request, base, params).await,
            None => self.unbound(template, request, base, params),
        }
    }

    async fn handle(&self, route: &Route, request: &HttpRequest, base: Context, params: Vec<String>) -> HttpResponse {
        if route.path_params() != params.len() {
            error!(
                "{} declares {} path parameters but {} has {}",
                route.name(),
                route.path_params(),
                route.template(),
                params.len()
            );
            return HttpResponse::from_failure(&HttpError::internal(ARITY_MISMATCH));
        }

        let query = match request.query() {
            Ok(query) => query,
            Err(e) => {
                warn!("Rejected query for {} {}: {e}", request.method, request.path);
                return HttpResponse::from_failure(&HttpError::bad_request(e.to_string()));
            }
        };
        let context = base.with_value(QUERY_MAP_KEY, query);

        let body = match route.decode(&request.body) {
            Ok(body) => body,
            Err(e) => {
                warn!("Rejected body for {} {}: {e}", request.method, request.path);
                return HttpResponse::from_failure(&HttpError::bad_request(e.to_string()));
            }
        };

        let chain = self.chain(route.template());
        let invocation = AssertUnwindSafe(async move {
            let (context, body, params) = apply_chain(chain, context, body, params);
            route.call(context, body, params).await
        })
        .catch_unwind();

        match invocation.await {
            Ok(Ok(outcome)) => render_outcome(route, outcome),
            Ok(Err(e)) => {
                error!("Could not call {}: {e}", route.name());
                HttpResponse::from_failure(&HttpError::internal(e.to_string()))
            }
            Err(panic) => {
                error!("{} panicked: {}", route.name(), panic_message(&*panic));
                HttpResponse::from_failure(&HttpError::internal(HANDLER_PANICKED))
            }
        }
    }

    // The template is reachable for its middleware but nothing is bound for
    // this method.
    fn unbound(&self, template: &str, request: &HttpRequest, base: Context, params: Vec<String>) -> HttpResponse {
        let chain = self.chain(template);
        if !chain.is_empty() {
            let query = match request.query() {
                Ok(query) => query,
                Err(e) => {
                    warn!("Rejected query for {} {}: {e}", request.method, request.path);
                    return HttpResponse::from_failure(&HttpError::bad_request(e.to_string()));
                }
            };
            let context = base.with_value(QUERY_MAP_KEY, query);
            let body = match decode_body::<serde_json::Value>(&request.body) {
                Ok(body) => body,
                Err(e) => {
                    warn!("Rejected body for {} {}: {e}", request.method, request.path);
                    return HttpResponse::from_failure(&HttpError::bad_request(e.to_string()));
                }
            };

            let applied = std::panic::catch_unwind(AssertUnwindSafe(|| apply_chain(chain, context, body, params)));
            if let Err(panic) = applied {
                error!("Middleware for {template} panicked: {}", panic_message(&*panic));
                return HttpResponse::from_failure(&HttpError::internal(HANDLER_PANICKED));
            }
        }

        warn!("No handler bound for {} {template}", request.method);
        let response = HttpResponse::from_failure(&HttpError::bad_request(NOT_FOUND));
        let allowed: Vec<&str> = self
            .tables
            .routes
            .get(template)
            .map(|methods| methods.keys().map(Method::as_str).collect())
            .unwrap_or_default();

        if allowed.is_empty() {
            response
        } else {
            response.with_header("Allow", allowed.join(", "))
        }
    }

    fn chain(&self, template: &str) -> &[Arc<dyn Middleware>] {
        self.tables
            .middleware
            .get(template)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn render_schemas(&self) -> HttpResponse {
        HttpResponse::new(StatusCode::OK)
            .with_json(&self.tables.schemas.short_names())
            .unwrap_or_else(|e| HttpResponse::from_failure(&HttpError::internal(e.to_string())))
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.routes().collect::<Vec<_>>())
            .field("schemas", &self.tables.schemas.len())
            .finish()
    }
}

fn render_outcome(route: &Route, outcome: Outcome) -> HttpResponse {
    match outcome {
        Outcome::Success(bytes) => HttpResponse::new(StatusCode::OK)
            .with_content_type("application/json")
            .with_body_bytes(bytes),
        Outcome::Failed(failure) => HttpResponse::from_failure(failure.as_ref()),
        Outcome::Unencodable(e) => {
            error!("Could not encode the result of {}: {e}", route.name());
            HttpResponse::from_failure(&HttpError::internal(format!("error while encoding response: {e}")))
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
