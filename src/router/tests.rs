//! Tests for the path-template router.

#[cfg(test)]
mod tests {
    use crate::router::{count_placeholders, decode_path, PathTemplate, Router};

    #[test]
    fn test_static_template_matches_exactly() {
        let template = PathTemplate::parse("/api/v1/foos");
        assert!(template.is_static());
        assert_eq!(template.matches("/api/v1/foos"), Some(vec![]));
        assert_eq!(template.matches("/api/v1/foos/"), None);
        assert_eq!(template.matches("/api/v1"), None);
        assert_eq!(template.matches("/api/v1/bars"), None);
    }

    #[test]
    fn test_placeholders_capture_in_order() {
        let template = PathTemplate::parse("/users/{user}/posts/{post}");
        assert_eq!(template.param_count(), 2);
        assert_eq!(template.param_names().collect::<Vec<_>>(), vec!["user", "post"]);

        let params = template.matches("/users/7/posts/99").unwrap();
        assert_eq!(
            params,
            vec![
                ("user".to_string(), "7".to_string()),
                ("post".to_string(), "99".to_string()),
            ]
        );
    }

    #[test]
    fn test_placeholder_requires_a_value() {
        let template = PathTemplate::parse("/users/{id}");
        assert_eq!(template.matches("/users/"), None);
        assert_eq!(template.matches("/users"), None);
    }

    #[test]
    fn test_root_template() {
        let template = PathTemplate::parse("/");
        assert_eq!(template.matches("/"), Some(vec![]));
        assert_eq!(template.matches("/x"), None);
    }

    #[test]
    fn test_count_placeholders() {
        assert_eq!(count_placeholders("/foo"), 0);
        assert_eq!(count_placeholders("/foo/{id}/bar/{name}"), 2);
    }

    #[test]
    fn test_handle_func_is_idempotent() {
        let mut router = Router::new();
        assert!(router.is_empty());
        assert!(router.handle_func("/foo"));
        assert!(!router.handle_func("/foo"));
        assert_eq!(router.len(), 1);
    }

    #[test]
    fn test_static_templates_win_over_placeholders() {
        let mut router = Router::new();
        router.handle_func("/users/{id}");
        router.handle_func("/users/me");

        let matched = router.match_path("/users/me").unwrap();
        assert_eq!(matched.template, "/users/me");
        assert!(matched.params.is_empty());

        let matched = router.match_path("/users/42").unwrap();
        assert_eq!(matched.template, "/users/{id}");
        assert_eq!(matched.params[0].1, "42");
    }

    #[test]
    fn test_first_registered_placeholder_template_wins() {
        let mut router = Router::new();
        router.handle_func("/items/{a}");
        router.handle_func("/items/{b}");

        let matched = router.match_path("/items/1").unwrap();
        assert_eq!(matched.template, "/items/{a}");
    }

    #[test]
    fn test_unknown_path() {
        let mut router = Router::new();
        router.handle_func("/foo");
        assert!(router.match_path("/bar").is_none());
    }

    #[test]
    fn test_decode_path() {
        assert_eq!(decode_path("/users/a%20b").unwrap(), "/users/a b");
        assert_eq!(decode_path("/api/v1/f%6Fos").unwrap(), "/api/v1/foos");
        assert_eq!(decode_path("/a+b").unwrap(), "/a+b");
        assert!(decode_path("/users/%FF").is_err());
    }
}
