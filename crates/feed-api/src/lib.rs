pub mod credential;
pub mod error;
pub mod keys;
pub mod posts;
pub mod verifier;

use std::sync::Arc;

use axum::{Json, Router, extract::DefaultBodyLimit, routing::get};

use feed_store::PostStore;
use feed_types::api::HealthResponse;

use crate::verifier::IdentityVerifier;

/// Request bodies larger than this are rejected before parsing.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub store: Arc<dyn PostStore>,
    pub verifier: IdentityVerifier,
}

/// `/posts` answers GET and POST; any other method gets 405.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
