//! HTTP parser module.
//!
//! Turns raw bytes into [`HttpRequest`] values, decodes query strings, and
//! owns the verb vocabulary ([`Method::normalize`]) that convention
//! inference builds on.

mod request;
mod method;
mod version;
mod error;
mod tests;

// Re-export public items
pub use request::{HttpRequest, QueryMap};
pub use method::Method;
pub use version::HttpVersion;
pub use error::Error;

pub use request::{expected_length, parse_query, parse_request};
