//! HTTP request parsing and representation.

use std::borrow::Cow;
use std::collections::HashMap;
use std::str::FromStr;

use crate::parser::error::Error;
use crate::parser::method::Method;
use crate::parser::version::HttpVersion;

/// Decoded query string: every key maps to all of its values, in order.
pub type QueryMap = HashMap<String, Vec<String>>;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Represents an HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The request path, without the query string
    pub path: String,
    /// The raw query string (everything after `?`), undecoded
    pub raw_query: String,
    /// The HTTP version
    pub version: HttpVersion,
    /// The HTTP headers
    pub headers: HashMap<String, String>,
    /// The request body
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Create a new HTTP request with an empty body.
    ///
    /// `target` is the request target as it appears on the request line; the
    /// query string, if any, is split off into `raw_query`.
    pub fn new(method: Method, target: &str, version: HttpVersion, headers: HashMap<String, String>) -> Self {
        let (path, raw_query) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), query.to_string()),
            None => (target.to_string(), String::new()),
        };

        Self {
            method,
            path,
            raw_query,
            version,
            headers,
            body: Vec::new(),
        }
    }

    /// Create a new HTTP request with a body.
    pub fn with_body(
        method: Method,
        target: &str,
        version: HttpVersion,
        headers: HashMap<String, String>,
        body: Vec<u8>,
    ) -> Self {
        let mut request = Self::new(method, target, version, headers);
        request.body = body;
        request
    }

    /// Get a header value. Header names are matched case-insensitively.
    pub fn get_header(&self, name: &str) -> Option<&String> {
        self.headers
            .iter()
            .find_map(|(k, v)| k.eq_ignore_ascii_case(name).then_some(v))
    }

    /// Check if a header exists.
    pub fn has_header(&self, name: &str) -> bool {
        self.get_header(name).is_some()
    }

    /// Check if the request declares a JSON body.
    pub fn is_json(&self) -> bool {
        self.get_header("Content-Type")
            .is_some_and(|content_type| content_type.starts_with("application/json"))
    }

    /// Decode the query string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedQuery`] when a pair contains `;` or a
    /// component has an invalid percent escape.
    pub fn query(&self) -> Result<QueryMap, Error> {
        parse_query(&self.raw_query)
    }
}

/// Decode a raw query string into a [`QueryMap`].
///
/// Pairs are separated by `&`; `+` decodes to a space and `%XX` escapes are
/// percent-decoded. A key without `=` maps to an empty value.
///
/// # Examples
///
/// ```
/// use autoroute::parser::parse_query;
///
/// let query = parse_query("name=eamon&tag=a&tag=b+c").unwrap();
/// assert_eq!(query["name"], vec!["eamon"]);
/// assert_eq!(query["tag"], vec!["a", "b c"]);
/// ```
pub fn parse_query(raw: &str) -> Result<QueryMap, Error> {
    let mut query = QueryMap::new();
    for pair in raw.split('&').filter(|pair| !pair.is_empty()) {
        if pair.contains(';') {
            return Err(Error::MalformedQuery(format!("invalid semicolon separator in {pair}")));
        }
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_component(key)?;
        let value = decode_component(value)?;
        query.entry(key).or_default().push(value);
    }
    Ok(query)
}

fn decode_component(component: &str) -> Result<String, Error> {
    let bytes = component.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape = bytes.get(i + 1..i + 3);
            if !escape.is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit)) {
                return Err(Error::MalformedQuery(format!("invalid escape in {component}")));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    let spaced = component.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(Cow::into_owned)
        .map_err(|_| Error::MalformedQuery(format!("invalid UTF-8 in {component}")))
}

/// Total number of bytes the request in `input` occupies, once known.
///
/// Returns `None` until the header block is complete. After that, the
/// length is the header block plus the declared `Content-Length` (zero when
/// the header is absent or unreadable; `parse_request` reports those).
pub fn expected_length(input: &[u8]) -> Option<usize> {
    let head_end = find_head_end(input)?;
    let head = String::from_utf8_lossy(&input[..head_end]);
    let body_len = head
        .lines()
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("Content-Length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    Some(head_end + HEADER_TERMINATOR.len() + body_len)
}

fn find_head_end(input: &[u8]) -> Option<usize> {
    input
        .windows(HEADER_TERMINATOR.len())
        .position(|window| window == HEADER_TERMINATOR)
}

/// Parse an HTTP request, head and body, from a byte slice.
///
/// When a `Content-Length` header is present the body is truncated to it;
/// otherwise everything after the header block is the body.
pub fn parse_request(input: &[u8]) -> Result<HttpRequest, Error> {
    if input.is_empty() {
        return Err(Error::EmptyRequest);
    }

    let (head_bytes, rest) = match find_head_end(input) {
        Some(end) => (&input[..end], &input[end + HEADER_TERMINATOR.len()..]),
        None => (input, &[][..]),
    };

    let head = std::str::from_utf8(head_bytes)
        .map_err(|_| Error::MalformedRequestLine("Invalid UTF-8".to_string()))?;
    let mut lines = head.lines();

    let request_line = lines.next().ok_or(Error::EmptyRequest)?;

    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() != 3 {
        return Err(Error::MalformedRequestLine(request_line.to_string()));
    }

    let method = Method::from_str(parts[0])?;

    let target = parts[1];
    if !target.starts_with('/') {
        return Err(Error::InvalidPath);
    }

    let version = HttpVersion::from_str(parts[2])?;

    let mut headers = HashMap::new();
    for line in lines {
        if line.is_empty() {
            break;
        }

        let (name, value) = line.split_once(':').ok_or(Error::InvalidHeaderFormat)?;
        headers.insert(name.trim().to_string(), value.trim().to_string());
    }

    if version.requires_host() && !headers.keys().any(|k| k.eq_ignore_ascii_case("Host")) {
        return Err(Error::MissingHeader("Host".to_string()));
    }

    let mut request = HttpRequest::new(method, target, version, headers);

    let body = match request.get_header("Content-Length") {
        Some(value) => {
            let declared = value
                .parse::<usize>()
                .map_err(|_| Error::InvalidContentLength(value.clone()))?;
            &rest[..declared.min(rest.len())]
        }
        None => rest,
    };
    request.body = body.to_vec();

    Ok(request)
}
