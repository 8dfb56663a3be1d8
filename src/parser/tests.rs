//! Tests for the HTTP parser.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::parser::{expected_length, parse_query, parse_request, Error, HttpRequest, HttpVersion, Method};

    #[test]
    fn test_parse_simple_get_request() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.method, Method::GET);
        assert_eq!(result.path, "/index.html");
        assert_eq!(result.raw_query, "");
        assert_eq!(result.version, HttpVersion::Http11);
        assert_eq!(result.headers.get("Host").unwrap(), "example.com");
        assert!(result.body.is_empty());
    }

    #[test]
    fn test_case_insensitive_headers() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert!(result.has_header("host"));
        assert!(result.has_header("HOST"));
        assert!(result.has_header("Host"));
    }

    #[test]
    fn test_missing_host_header() {
        let request = b"GET /index.html HTTP/1.1\r\n\r\n";
        let result = parse_request(request);
        assert!(matches!(result, Err(Error::MissingHeader(ref h)) if h == "Host"));
    }

    #[test]
    fn test_http10_without_host() {
        let request = b"GET /index.html HTTP/1.0\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.version, HttpVersion::Http10);
        assert!(result.headers.is_empty());
    }

    #[test]
    fn test_invalid_method() {
        let request = b"INVALID /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let result = parse_request(request);
        assert!(matches!(result, Err(Error::InvalidMethod(ref m)) if m == "INVALID"));
    }

    #[test]
    fn test_lowercase_wire_method_is_rejected() {
        let request = b"get /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n";
        assert!(matches!(parse_request(request), Err(Error::InvalidMethod(_))));
    }

    #[test]
    fn test_invalid_http_version() {
        let request = b"GET /index.html HTTP/9.9\r\nHost: example.com\r\n\r\n";
        let result = parse_request(request);
        assert!(matches!(result, Err(Error::InvalidVersion(ref v)) if v == "HTTP/9.9"));
    }

    #[test]
    fn test_invalid_header_format() {
        let request = b"GET /index.html HTTP/1.1\r\nInvalidHeader\r\n\r\n";
        assert!(matches!(parse_request(request), Err(Error::InvalidHeaderFormat)));
    }

    #[test]
    fn test_target_must_be_absolute_path() {
        let request = b"GET index.html HTTP/1.1\r\nHost: example.com\r\n\r\n";
        assert!(matches!(parse_request(request), Err(Error::InvalidPath)));
    }

    #[test]
    fn test_empty_request() {
        assert!(matches!(parse_request(b""), Err(Error::EmptyRequest)));
    }

    #[test]
    fn test_incomplete_request_line() {
        assert!(matches!(parse_request(b"GET\r\n"), Err(Error::MalformedRequestLine(_))));
    }

    #[test]
    fn test_malformed_utf8_in_request() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\nX-Test: \xFF\xFF\xFF\r\n\r\n";
        let result = parse_request(request);
        assert!(matches!(result, Err(Error::MalformedRequestLine(ref s)) if s == "Invalid UTF-8"));
    }

    #[test]
    fn test_mixed_line_endings() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: example.com\nUser-Agent: test\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.headers.get("Host").unwrap(), "example.com");
        assert_eq!(result.headers.get("User-Agent").unwrap(), "test");
    }

    #[test]
    fn test_query_is_split_from_path() {
        let request = b"GET /api/v1/foos?name=eamon&page=2 HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.path, "/api/v1/foos");
        assert_eq!(result.raw_query, "name=eamon&page=2");

        let query = result.query().unwrap();
        assert_eq!(query["name"], vec!["eamon"]);
        assert_eq!(query["page"], vec!["2"]);
    }

    #[test]
    fn test_body_is_bounded_by_content_length() {
        let request = b"POST /api/v1/foos HTTP/1.1\r\n\
            Host: example.com\r\n\
            Content-Type: application/json\r\n\
            Content-Length: 13\r\n\
            \r\n\
            {\"name\":\"\"}\r\ntrailing";

        let result = parse_request(request).unwrap();
        assert_eq!(result.method, Method::POST);
        assert!(result.is_json());
        assert_eq!(result.body, b"{\"name\":\"\"}\r\n".to_vec());
    }

    #[test]
    fn test_body_without_content_length_takes_the_rest() {
        let request = b"PUT /foo HTTP/1.0\r\n\r\n[1,2]";
        let result = parse_request(request).unwrap();
        assert_eq!(result.body, b"[1,2]".to_vec());
    }

    #[test]
    fn test_invalid_content_length() {
        let request = b"POST /foo HTTP/1.1\r\nHost: x\r\nContent-Length: lots\r\n\r\n{}";
        assert!(matches!(parse_request(request), Err(Error::InvalidContentLength(ref v)) if v == "lots"));
    }

    #[test]
    fn test_expected_length() {
        assert_eq!(expected_length(b"GET / HTTP/1.1\r\nHost: x\r\n"), None);

        let head = b"GET / HTTP/1.1\r\nHost: x\r\n\r\n";
        assert_eq!(expected_length(head), Some(head.len()));

        let post = b"POST / HTTP/1.1\r\nhost: x\r\ncontent-length: 5\r\n\r\n{\"a\"";
        assert_eq!(expected_length(post), Some(post.len() + 1));
    }

    #[test]
    fn test_parse_query_decoding() {
        let query = parse_query("q=test%20query&filter=name:john&tag=a&tag=b+c&flag&empty=").unwrap();
        assert_eq!(query["q"], vec!["test query"]);
        assert_eq!(query["filter"], vec!["name:john"]);
        assert_eq!(query["tag"], vec!["a", "b c"]);
        assert_eq!(query["flag"], vec![""]);
        assert_eq!(query["empty"], vec![""]);
    }

    #[test]
    fn test_parse_query_empty() {
        assert!(parse_query("").unwrap().is_empty());
        assert!(parse_query("&&").unwrap().is_empty());
    }

    #[test]
    fn test_parse_query_rejects_malformed_input() {
        assert!(matches!(parse_query("a=1;b=2"), Err(Error::MalformedQuery(_))));
        assert!(matches!(parse_query("a=%zz"), Err(Error::MalformedQuery(_))));
        assert!(matches!(parse_query("a=%4"), Err(Error::MalformedQuery(_))));
        assert!(matches!(parse_query("a=%FF"), Err(Error::MalformedQuery(_))));
    }

    #[test]
    fn test_method_normalize_synonyms() {
        let cases = [
            ("GET", Method::GET),
            ("get", Method::GET),
            ("Query", Method::GET),
            ("LIST", Method::GET),
            ("post", Method::POST),
            ("Create", Method::POST),
            ("put", Method::PUT),
            ("update", Method::PUT),
            ("Delete", Method::DELETE),
            ("head", Method::HEAD),
            ("PATCH", Method::PATCH),
            ("options", Method::OPTIONS),
        ];

        for (token, expected) in cases {
            assert_eq!(Method::normalize(token).unwrap(), expected, "token {token}");
        }
    }

    #[test]
    fn test_method_normalize_rejects_unknown_tokens() {
        assert!(matches!(Method::normalize("fetch"), Err(Error::UnrecognizedVerb(ref t)) if t == "fetch"));
        assert!(matches!(Method::normalize(""), Err(Error::UnrecognizedVerb(_))));
    }

    #[test]
    fn test_method_display() {
        assert_eq!(Method::GET.to_string(), "GET");
        assert_eq!(Method::OPTIONS.to_string(), "OPTIONS");
        assert_eq!(Method::PATCH.as_str(), "PATCH");
    }

    #[test]
    fn test_http_request_helpers() {
        let mut headers = HashMap::new();
        headers.insert("Host".to_string(), "example.com".to_string());
        headers.insert("Content-Type".to_string(), "application/json; charset=utf-8".to_string());

        let request = HttpRequest::with_body(
            Method::POST,
            "/api?x=1",
            HttpVersion::Http11,
            headers,
            b"{}".to_vec(),
        );

        assert_eq!(request.get_header("host").unwrap(), "example.com");
        assert!(!request.has_header("X-Test"));
        assert!(request.is_json());
        assert_eq!(request.path, "/api");
        assert_eq!(request.raw_query, "x=1");
        assert_eq!(request.body, b"{}".to_vec());
    }
}
