//! Registration options.

use std::collections::HashMap;

use crate::engine::shape::{Payload, TypeShape};
use crate::parser::Method;

/// Per-handler overrides. Missing fields fall back to convention inference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerOptions {
    pub path: Option<String>,
    pub prefix: Option<String>,
    pub method: Option<Method>,
}

impl HandlerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }
}

impl Payload for HandlerOptions {
    fn shape() -> TypeShape {
        TypeShape::Options
    }
}

/// Options for registering every operation of a server value.
#[derive(Debug, Clone, Default)]
pub struct ServerOptions {
    /// Prefix for plain handler operations. Defaults to the server type's
    /// module path with [`EngineOptions::package`] stripped.
    pub prefix: Option<String>,
    /// Options for individual handler operations, by operation name.
    pub handler_options: HashMap<String, HandlerOptions>,
}

impl ServerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn handler(mut self, name: impl Into<String>, options: HandlerOptions) -> Self {
        self.handler_options.insert(name.into(), options);
        self
    }
}

/// Engine-wide settings.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Module path stripped from server namespaces, e.g. `my_app`.
    pub package: Option<String>,
    /// When set, `GET` on this path lists the registered schemas.
    pub schema_path: Option<String>,
}

impl EngineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn schema_path(mut self, path: impl Into<String>) -> Self {
        self.schema_path = Some(path.into());
        self
    }
}
