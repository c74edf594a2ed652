use serde::{Deserialize, Serialize};

// -- Posts --

/// Body of `POST /posts`. `content` is the only field a client may supply;
/// everything else on a post is derived by the server.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePostRequest {
    pub content: String,
}

// -- Errors --

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

// -- Health --

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_rejects_extra_fields() {
        let parsed = serde_json::from_str::<CreatePostRequest>(
            r#"{"content":"hi","author":{"username":"mallory@x.com"}}"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn create_request_requires_content() {
        assert!(serde_json::from_str::<CreatePostRequest>("{}").is_err());
        assert!(serde_json::from_str::<CreatePostRequest>(r#"{"content":5}"#).is_err());
    }
}
