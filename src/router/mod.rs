//! Path-template router.
//!
//! The router only answers "which registered template does this path hit,
//! and what did the placeholders capture". Which callable runs for the
//! template is decided by the dispatcher's route table.
//!
//! # Example
//!
//! ```
//! use autoroute::router::Router;
//!
//! let mut router = Router::new();
//! router.handle_func("/api/v1/foos");
//! router.handle_func("/api/v1/foos/{string2}");
//!
//! let matched = router.match_path("/api/v1/foos/42").unwrap();
//! assert_eq!(matched.template, "/api/v1/foos/{string2}");
//! assert_eq!(matched.params, vec![("string2".to_string(), "42".to_string())]);
//! ```

use std::borrow::Cow;
use std::string::FromUtf8Error;

mod template;
mod tests;

pub use template::{count_placeholders, PathTemplate};

/// Percent-decode a request path before matching.
///
/// `+` is kept literally; only query strings treat it as a space.
pub fn decode_path(path: &str) -> Result<String, FromUtf8Error> {
    urlencoding::decode(path).map(Cow::into_owned)
}

/// A successful match of a request path against a registered template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    /// The template that matched, exactly as it was registered.
    pub template: &'a str,
    /// Captured placeholder values, in template order.
    pub params: Vec<(String, String)>,
}

/// Registry of reachable path templates.
///
/// Static templates are tried before templates with placeholders; among
/// templates with placeholders the first one registered wins.
#[derive(Debug, Clone, Default)]
pub struct Router {
    templates: Vec<PathTemplate>,
}

impl Router {
    /// Create an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a template reachable. Returns `false` if it already was.
    pub fn handle_func(&mut self, template: &str) -> bool {
        if self.templates.iter().any(|t| t.as_str() == template) {
            return false;
        }
        self.templates.push(PathTemplate::parse(template));
        true
    }

    /// Find the template a request path resolves to.
    pub fn match_path(&self, path: &str) -> Option<RouteMatch<'_>> {
        let statics = self.templates.iter().filter(|t| t.is_static());
        let dynamics = self.templates.iter().filter(|t| !t.is_static());

        statics.chain(dynamics).find_map(|template| {
            template.matches(path).map(|params| RouteMatch {
                template: template.as_str(),
                params,
            })
        })
    }

    /// Registered templates, in registration order.
    pub fn templates(&self) -> impl Iterator<Item = &PathTemplate> {
        self.templates.iter()
    }

    /// Number of reachable templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// True when nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
