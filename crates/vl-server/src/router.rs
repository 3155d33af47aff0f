//! Axum router construction.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::middleware::auth::auth_middleware;
use crate::middleware::request_id::request_id_middleware;
use crate::routes;

/// Slack on top of the file limit for multipart boundaries and headers.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let upload_limit = ctx
        .config
        .storage
        .max_upload_bytes()
        .saturating_add(MULTIPART_OVERHEAD);
    let upload_limit = usize::try_from(upload_limit).unwrap_or(usize::MAX);

    // Management routes -- API key required when auth is enabled.
    let protected_routes = Router::new()
        .route(
            "/videos/upload",
            post(routes::videos::upload)
                .layer::<_, std::convert::Infallible>(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(upload_limit)),
        )
        .route("/videos/trim", post(routes::videos::trim))
        .route("/videos/merge", post(routes::videos::merge))
        .route("/videos/share", post(routes::share::create_link))
        .layer(middleware::from_fn_with_state(ctx.clone(), auth_middleware));

    // Shared-link routes are public; the token is the credential.
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/videos/shared/{token}", get(routes::share::access_link))
        .route("/stream/{token}", get(routes::stream::stream_shared));

    public_routes
        .merge(protected_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
