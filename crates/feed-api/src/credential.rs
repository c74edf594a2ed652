use axum::http::{HeaderMap, header};

/// Bearer token from the `Authorization` header, or an empty string when
/// there is none. Absence is rejected later by the verifier, not here.
pub fn extract_bearer(headers: &HeaderMap) -> String {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers_with(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn strips_bearer_prefix_and_whitespace() {
        assert_eq!(extract_bearer(&headers_with("Bearer abc.def.ghi")), "abc.def.ghi");
        assert_eq!(extract_bearer(&headers_with("Bearer    abc.def.ghi  ")), "abc.def.ghi");
    }

    #[test]
    fn header_name_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        let name = header::HeaderName::from_bytes(b"AUTHORIZATION").unwrap();
        headers.insert(name, HeaderValue::from_static("Bearer tok"));
        assert_eq!(extract_bearer(&headers), "tok");
    }

    #[test]
    fn missing_or_foreign_scheme_is_empty() {
        assert_eq!(extract_bearer(&HeaderMap::new()), "");
        assert_eq!(extract_bearer(&headers_with("Basic dXNlcjpwYXNz")), "");
        assert_eq!(extract_bearer(&headers_with("Bearer")), "");
        assert_eq!(extract_bearer(&headers_with("Bearer   ")), "");
    }
}
