//! HTTP request methods and the verb vocabulary used by convention inference.

use std::fmt;
use std::str::FromStr;

use crate::parser::error::Error;

/// HTTP request methods as defined in RFC 7231 and common extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    /// GET method: Requests a representation of the specified resource.
    GET,
    /// HEAD method: Same as GET but only transfers the status line and header section.
    HEAD,
    /// POST method: Submits data to be processed to the identified resource.
    POST,
    /// PUT method: Replaces all current representations of the target resource with the request payload.
    PUT,
    /// PATCH method: Applies partial modifications to a resource.
    PATCH,
    /// DELETE method: Deletes the specified resource.
    DELETE,
    /// OPTIONS method: Describes the communication options for the target resource.
    OPTIONS,
}

impl Method {
    /// Canonicalize a verb token, accepting the synonyms handler names use.
    ///
    /// Matching is case-insensitive. `QUERY` and `LIST` map to GET, `CREATE`
    /// to POST and `UPDATE` to PUT; the literal verbs map to themselves.
    ///
    /// # Examples
    ///
    /// ```
    /// use autoroute::Method;
    ///
    /// assert_eq!(Method::normalize("list").unwrap(), Method::GET);
    /// assert_eq!(Method::normalize("Create").unwrap(), Method::POST);
    /// assert!(Method::normalize("fetch").is_err());
    /// ```
    pub fn normalize(token: &str) -> Result<Self, Error> {
        match token.to_ascii_uppercase().as_str() {
            "GET" | "QUERY" | "LIST" => Ok(Method::GET),
            "POST" | "CREATE" => Ok(Method::POST),
            "PUT" | "UPDATE" => Ok(Method::PUT),
            "DELETE" => Ok(Method::DELETE),
            "HEAD" => Ok(Method::HEAD),
            "PATCH" => Ok(Method::PATCH),
            "OPTIONS" => Ok(Method::OPTIONS),
            _ => Err(Error::UnrecognizedVerb(token.to_string())),
        }
    }

    /// The canonical upper-case token for this method.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::PATCH => "PATCH",
            Method::DELETE => "DELETE",
            Method::OPTIONS => "OPTIONS",
        }
    }
}

// Wire methods are case-sensitive; synonyms are only accepted by `normalize`.
impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Method::GET),
            "POST" => Ok(Method::POST),
            "PUT" => Ok(Method::PUT),
            "DELETE" => Ok(Method::DELETE),
            "HEAD" => Ok(Method::HEAD),
            "OPTIONS" => Ok(Method::OPTIONS),
            "PATCH" => Ok(Method::PATCH),
            _ => Err(Error::InvalidMethod(s.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
