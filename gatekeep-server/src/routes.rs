use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::{handlers::auth, infra::app_state::AppState};

/// Build the full application router.
pub fn create_app(state: AppState) -> Router {
    let request_timeout = state.config.server.request_timeout;

    Router::new()
        .nest("/auth", auth_routes())
        .with_state(state)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/session", get(auth::current_session))
}
