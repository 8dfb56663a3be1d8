//! Path and method inference from handler identifiers.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::engine::error::ConventionError;
use crate::parser::Method;

static VERB_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(get|head|post|put|patch|delete|options|query|list|create|update)_?(\w*)$")
        .expect("verb prefix regex should be valid")
});

/// Infer a path fragment and method from a handler identifier.
///
/// Qualified identifiers (`module::Type::method`, `pkg.Method`) are reduced
/// to their last component and generic arguments are ignored. The component
/// must start with a verb synonym; what follows it, lower-cased, is the path
/// fragment and may be empty.
///
/// # Examples
///
/// ```
/// use autoroute::engine::convention::parse;
/// use autoroute::Method;
///
/// assert_eq!(parse("ListFoos").unwrap(), ("foos".to_string(), Method::GET));
/// assert_eq!(parse("my_app::handlers::create_user").unwrap(), ("user".to_string(), Method::POST));
/// assert!(parse("Foo").is_err());
/// ```
pub fn parse(identifier: &str) -> Result<(String, Method), ConventionError> {
    let component = unqualified(identifier);

    let captures = VERB_PREFIX
        .captures(&component)
        .ok_or_else(|| ConventionError::NotAutodetectable(identifier.to_string()))?;

    let method = Method::normalize(&captures[1])
        .map_err(|_| ConventionError::NotAutodetectable(identifier.to_string()))?;

    Ok((captures[2].to_lowercase(), method))
}

// Drop generic arguments, then every qualifier.
fn unqualified(identifier: &str) -> String {
    let mut depth = 0usize;
    let base: String = identifier
        .chars()
        .filter(|c| match c {
            '<' => {
                depth += 1;
                false
            }
            '>' => {
                depth = depth.saturating_sub(1);
                false
            }
            _ => depth == 0,
        })
        .collect();

    let base = base.rsplit("::").next().unwrap_or(&base);
    base.rsplit('.').next().unwrap_or(base).to_string()
}
