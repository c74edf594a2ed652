use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{Method, header::{AUTHORIZATION, CONTENT_TYPE}};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use feed_api::keys::{GOOGLE_JWKS_URL, RemoteKeys};
use feed_api::verifier::IdentityVerifier;
use feed_api::{AppStateInner, router};
use feed_store::JsonFileStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "feed=debug,feed_api=debug,feed_store=debug,tower_http=debug".into()
            }),
        )
        .init();

    // Config
    let client_id = std::env::var("FEED_GOOGLE_CLIENT_ID").unwrap_or_default();
    if client_id.trim().is_empty() {
        anyhow::bail!("FEED_GOOGLE_CLIENT_ID must name the OAuth client that ID tokens are issued for");
    }
    let posts_path = std::env::var("FEED_POSTS_PATH").unwrap_or_else(|_| "posts.json".into());
    let jwks_url = std::env::var("FEED_JWKS_URL").unwrap_or_else(|_| GOOGLE_JWKS_URL.into());
    let host = std::env::var("FEED_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("FEED_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    let store = Arc::new(JsonFileStore::open(&posts_path).await?);

    let mut verifier = IdentityVerifier::new(client_id.trim(), Arc::new(RemoteKeys::new(&jwks_url)));
    if let Ok(issuers) = std::env::var("FEED_TRUSTED_ISSUERS") {
        let issuers: Vec<String> = issuers
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        if !issuers.is_empty() {
            info!("Trusted issuers: {}", issuers.join(", "));
            verifier = verifier.with_issuers(issuers);
        }
    }
    info!("Signing keys from {}", jwks_url);

    let state = Arc::new(AppStateInner { store, verifier });

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(false);

    let app = router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Feed server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("SIGTERM handler unavailable: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = terminate => {}
    }
    info!("Shutdown signal received, draining connections");
}
