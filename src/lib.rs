pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod models;
pub mod routes;
pub mod store;

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::store::MovieStore;

#[derive(Clone)]
pub struct AppState {
    pub movies: Arc<dyn MovieStore>,
}

/// Builds the HTTP surface, with every route under `/api`.
pub fn app(state: Arc<AppState>) -> Router {
    let movies = Router::new()
        .route("/movies", get(routes::list).post(routes::create))
        .route(
            "/movies/{id}",
            get(routes::detail).patch(routes::update).delete(routes::remove),
        );

    Router::new()
        .nest("/api", movies)
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
