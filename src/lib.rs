pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod session;
pub mod state;
#[cfg(test)]
pub mod testing;

use axum::{
    extract::Request,
    routing::{get, post},
    Router,
};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Static files directory, relative to the working directory
pub const STATIC_DIR: &str = "static";

/// Build the application router
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/deed", get(handlers::deed))
        .route("/edit", get(handlers::edit))
        .route("/add", post(handlers::add))
        .route("/update", get(handlers::update))
        .route("/delete", get(handlers::delete))
        .route("/logout", get(handlers::logout))
        .route("/warning", get(handlers::warning))
        .route("/fontsizes.css", get(handlers::font_sizes))
        .route_service("/styles.css", ServeFile::new(format!("{}/styles.css", STATIC_DIR)))
        .route_service("/cookies.html", ServeFile::new(format!("{}/cookies.html", STATIC_DIR)))
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .with_state(state)
}

/// Request span with the path only; the query may carry the password
fn request_span(request: &Request) -> tracing::Span {
    tracing::debug_span!(
        "request",
        method = %request.method(),
        path = request.uri().path(),
    )
}
