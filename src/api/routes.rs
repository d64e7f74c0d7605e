use axum::{http::StatusCode, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::{handlers, state::AppState};

/// Build the router. `predict_path` serves GET (health) and POST (predict).
pub fn create_router(state: AppState, predict_path: &str) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new().route(
        predict_path,
        get(handlers::health_handler)
            .post(handlers::predict_handler)
            .options(preflight_handler),
    );
    if predict_path != "/" {
        router = router.route("/", get(handlers::health_handler));
    }

    router
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// OPTIONS without preflight headers; CORS preflights are answered by the layer.
async fn preflight_handler() -> StatusCode {
    StatusCode::OK
}
