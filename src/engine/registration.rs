//! The registration engine: builds the route, middleware and schema tables.

use std::any::type_name;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use log::{debug, error};

use crate::engine::convention;
use crate::engine::dispatch::Dispatcher;
use crate::engine::error::RegistrationError;
use crate::engine::handler::{Handler, Prepared, Route};
use crate::engine::middleware::Middleware;
use crate::engine::options::{EngineOptions, HandlerOptions, ServerOptions};
use crate::engine::schema::SchemaRegistry;
use crate::engine::service::{Operation, Operations, Server};
use crate::engine::shape::{classify, Kind, TypeShape};
use crate::parser::Method;
use crate::router::{count_placeholders, Router};

pub(crate) type RouteTable = BTreeMap<String, BTreeMap<Method, Arc<Route>>>;
pub(crate) type MiddlewareTable = HashMap<String, Vec<Arc<dyn Middleware>>>;

/// Everything a dispatcher reads.
#[derive(Clone, Default)]
pub(crate) struct Tables {
    pub(crate) routes: RouteTable,
    pub(crate) middleware: MiddlewareTable,
    pub(crate) schemas: SchemaRegistry,
    pub(crate) router: Router,
    pub(crate) schema_path: Option<String>,
}

/// Collects handlers, servers and middleware before serving.
///
/// Registration is single-threaded and happens up front; [`Engine::dispatcher`]
/// then takes an immutable snapshot of the tables for serving. Registering
/// twice for the same path and method keeps the later handler.
///
/// # Example
///
/// ```
/// use autoroute::engine::{Context, Engine, HandlerOptions};
/// use autoroute::Method;
///
/// async fn list_foos(_ctx: Context, _body: ()) -> Result<Vec<String>, String> {
///     Ok(vec!["Eamon".to_string(), "Courtney".to_string()])
/// }
///
/// let mut engine = Engine::new();
/// engine.register_handler(list_foos, Some(HandlerOptions::new().prefix("/api/v1")));
///
/// assert!(engine.route("/api/v1/foos", Method::GET).is_some());
/// ```
pub struct Engine {
    options: EngineOptions,
    tables: Tables,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    pub fn with_options(options: EngineOptions) -> Self {
        let mut tables = Tables::default();
        if let Some(path) = &options.schema_path {
            let path = normalize(path);
            tables.router.handle_func(&path);
            tables.schema_path = Some(path);
        }
        Self { options, tables }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Register a handler, panicking if it cannot be bound.
    ///
    /// The handler's name is its Rust path, so convention inference sees
    /// the function identifier (`list_foos`, `ListFoos`).
    ///
    /// # Panics
    ///
    /// Panics when the handler's shape is invalid or its path and method
    /// are neither given nor inferable.
    pub fn register_handler<H, Args>(&mut self, handler: H, options: Option<HandlerOptions>)
    where
        H: Handler<Args>,
    {
        if let Err(e) = self.try_register_handler(handler, options) {
            error!("Handler registration failed: {e}");
            panic!("handler registration failed: {e}");
        }
    }

    /// Register a handler, returning why it cannot be bound instead of
    /// panicking.
    pub fn try_register_handler<H, Args>(
        &mut self,
        handler: H,
        options: Option<HandlerOptions>,
    ) -> Result<(), RegistrationError>
    where
        H: Handler<Args>,
    {
        let prepared = handler.prepare(type_name::<H>().to_string());
        self.bind(prepared, options.unwrap_or_default())
    }

    /// Register every routable operation of a server, panicking on failure.
    ///
    /// # Panics
    ///
    /// Panics when the server is not a record or a reference to one, or
    /// when one of its handlers cannot be bound.
    pub fn register_server<S: Server>(&mut self, server: S, options: Option<ServerOptions>) {
        if let Err(e) = self.try_register_server(server, options) {
            error!("Server registration failed: {e}");
            panic!("server registration failed: {e}");
        }
    }

    pub fn try_register_server<S: Server>(
        &mut self,
        server: S,
        options: Option<ServerOptions>,
    ) -> Result<(), RegistrationError> {
        let shape = S::shape();
        let name = match &shape {
            TypeShape::Record(name) => name,
            TypeShape::Indirect(inner) => match inner.as_ref() {
                TypeShape::Record(name) => name,
                _ => {
                    return Err(RegistrationError::InvalidServer {
                        type_name: type_name::<S>().to_string(),
                    })
                }
            },
            _ => {
                return Err(RegistrationError::InvalidServer {
                    type_name: type_name::<S>().to_string(),
                })
            }
        };

        let options = options.unwrap_or_default();
        let prefix = options
            .prefix
            .clone()
            .unwrap_or_else(|| self.namespace_prefix(&name.namespace));
        debug!("Registering server {name} under prefix {prefix:?}");

        let mut ops = Operations::new();
        Arc::new(server).operations(&mut ops);

        for candidate in ops.into_candidates() {
            match (classify(&candidate.signature), candidate.operation) {
                (Kind::Handler, Operation::Handler(prepared)) => {
                    let mut handler_options = options
                        .handler_options
                        .get(&candidate.name)
                        .cloned()
                        .unwrap_or_default();
                    if handler_options.prefix.is_none() {
                        handler_options.prefix = Some(prefix.clone());
                    }
                    self.bind(prepared, handler_options)?;
                }
                (Kind::HandlerInstantiator, Operation::Instantiator(instantiate)) => {
                    let (handler_options, prepared) = instantiate(candidate.name);
                    self.bind(prepared, handler_options)?;
                }
                _ => debug!(
                    "Ignoring operation {} of {name}: {}",
                    candidate.name, candidate.signature
                ),
            }
        }
        Ok(())
    }

    /// Append a middleware to `path`, making the path reachable even if no
    /// handler is ever bound to it.
    pub fn register_middleware<M: Middleware>(&mut self, path: &str, middleware: M) {
        let path = normalize(path);
        self.tables.router.handle_func(&path);
        self.tables
            .middleware
            .entry(path)
            .or_default()
            .push(Arc::new(middleware));
    }

    fn bind(&mut self, prepared: Prepared, options: HandlerOptions) -> Result<(), RegistrationError> {
        if classify(&prepared.signature) != Kind::Handler {
            return Err(RegistrationError::InvalidShape {
                name: prepared.name,
                signature: prepared.signature,
            });
        }

        let (path, method) = match (options.path, options.method) {
            (Some(path), Some(method)) => (path, method),
            (path, method) => {
                let (inferred_path, inferred_method) = convention::parse(&prepared.name)?;
                (path.unwrap_or(inferred_path), method.unwrap_or(inferred_method))
            }
        };

        let mut template = join(options.prefix.as_deref(), &path);
        let declared = prepared.signature.path_params();
        let present = count_placeholders(&template);
        if present > declared {
            return Err(RegistrationError::Arity {
                name: prepared.name,
                template,
                expected: declared,
                found: present,
            });
        }
        for position in (2 + present)..(2 + declared) {
            template = format!("{}/{{string{position}}}", template.trim_end_matches('/'));
        }

        if let Some(body) = prepared.signature.body() {
            self.tables.schemas.register(body);
        }
        if let Some(reply) = prepared.signature.reply() {
            self.tables.schemas.register(reply);
        }

        self.tables.router.handle_func(&template);

        let route = Arc::new(Route::bind(prepared, template.clone(), method));
        debug!("Bound {method} {template} to {}", route.name());
        if let Some(previous) = self
            .tables
            .routes
            .entry(template.clone())
            .or_default()
            .insert(method, route)
        {
            debug!("Replaced {} at {method} {template}", previous.name());
        }
        Ok(())
    }

    fn namespace_prefix(&self, namespace: &str) -> String {
        let stripped = match self.options.package.as_deref() {
            Some(package) => match namespace.strip_prefix(package) {
                Some(rest) if rest.is_empty() || rest.starts_with("::") => rest,
                _ => namespace,
            },
            None => namespace,
        };
        let segments: Vec<&str> = stripped.split("::").filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            String::new()
        } else {
            format!("/{}", segments.join("/"))
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

    pub fn router(&self) -> &Router {
        &self.tables.router
    }

    /// Take an immutable snapshot of the current tables.
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(self.tables.clone())
    }
}

pub(crate) fn lookup<'a>(routes: &'a RouteTable, path: &str, method: Method) -> Option<&'a Route> {
    routes.get(path).and_then(|methods| methods.get(&method)).map(AsRef::as_ref)
}

// Leading slash added, trailing slashes dropped; the root stays `/`.
fn normalize(path: &str) -> String {
    let path = path.trim_end_matches('/');
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Join a prefix and a path with exactly one `/` between them.
fn join(prefix: Option<&str>, path: &str) -> String {
    let path = path.trim_start_matches('/');
    let joined = match prefix.map(|prefix| prefix.trim_end_matches('/')) {
        Some(prefix) if path.is_empty() => prefix.to_string(),
        Some(prefix) => format!("{prefix}/{path}"),
        None => path.to_string(),
    };
    normalize(&joined)
}
