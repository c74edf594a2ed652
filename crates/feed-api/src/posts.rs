use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::HeaderMap,
};
use tracing::{error, info};

use feed_types::api::CreatePostRequest;
use feed_types::models::{Author, Post};

use crate::AppState;
use crate::credential::extract_bearer;
use crate::error::ApiError;

/// Longest post body accepted, in characters.
pub const MAX_CONTENT_CHARS: usize = 5000;

pub async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<Post>>, ApiError> {
    let posts = state.store.read_all().await?;
    Ok(Json(posts))
}

/// The credential is checked before the body is even looked at, so an
/// unauthenticated caller always gets 401 and the store is never touched.
pub async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<Json<Vec<Post>>, ApiError> {
    let credential = extract_bearer(&headers);
    let claim = state.verifier.verify(&credential).await?;

    let Json(req) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    if req.content.trim().is_empty() {
        return Err(ApiError::BadRequest("content must not be blank".into()));
    }
    if req.content.chars().count() > MAX_CONTENT_CHARS {
        return Err(ApiError::BadRequest(format!(
            "content exceeds {} characters",
            MAX_CONTENT_CHARS
        )));
    }

    let post = Post::new(Author::from(claim), req.content);
    let username = post.author.username.clone();

    // Detached so a client disconnect cannot drop the append half way.
    let store = state.store.clone();
    let posts = tokio::spawn(async move { store.append(post).await })
        .await
        .map_err(|e| {
            error!("append task join error: {}", e);
            ApiError::Internal("failed to store post".into())
        })?
        .map_err(|e| {
            error!(username = %username, "Failed to append post: {}", e);
            ApiError::from(e)
        })?;

    info!(username = %username, total = posts.len(), "Post created");
    Ok(Json(posts))
}
