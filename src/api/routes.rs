//! API Routes
//!
//! The proxy answers every path through a single fallback handler.

use axum::{
    extract::Request,
    http::{header, Method},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{image_handler, AppState};
use crate::error::ProxyError;

/// Creates the router.
///
/// # Middleware
/// - Preflight guard: only real CORS preflights reach the CORS layer
/// - CORS: any origin may GET images
/// - Tracing: logs every request
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers([header::CACHE_CONTROL]);

    Router::new()
        .fallback(image_handler)
        .layer(cors)
        .layer(middleware::from_fn(preflight_guard))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `CorsLayer` answers every `OPTIONS` request itself. Anything that is not
/// a preflight (`Origin` plus `Access-Control-Request-Method`) is refused
/// like any other non-GET method.
async fn preflight_guard(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS && !is_preflight(&request) {
        return ProxyError::InvalidMethod.into_response();
    }
    next.run(request).await
}

fn is_preflight(request: &Request) -> bool {
    let headers = request.headers();
    headers.contains_key(header::ORIGIN) && headers.contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
}
