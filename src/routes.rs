use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use serde_json::{Map, Value};

use crate::{
    AppState,
    error::{AppError, AppResult},
    models::{Movie, MovieDraft, MovieId},
};

type JsonBody = Result<Json<Map<String, Value>>, JsonRejection>;
type IdPath = Result<Path<String>, PathRejection>;

pub async fn list(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Movie>>> {
    let movies = state.movies.find_all().await?;
    Ok(Json(movies))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    body: JsonBody,
) -> AppResult<(StatusCode, Json<Movie>)> {
    let Json(body) = body?;
    let movie = state.movies.insert(MovieDraft::from_json(&body)).await?;
    tracing::debug!(id = %movie.id, title = %movie.title, "movie created");
    Ok((StatusCode::CREATED, Json(movie)))
}

pub async fn detail(
    State(state): State<Arc<AppState>>,
    id: IdPath,
) -> AppResult<Json<Movie>> {
    let id = parse_id(id)?;
    let movie = state.movies.find_by_id(&id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(movie))
}

/// Partial update: keys missing from the body keep their stored value.
pub async fn update(
    State(state): State<Arc<AppState>>,
    id: IdPath,
    body: JsonBody,
) -> AppResult<Json<Movie>> {
    let id = parse_id(id)?;
    let Json(body) = body?;
    let movie = state
        .movies
        .update_by_id(&id, MovieDraft::from_json(&body))
        .await?
        .ok_or(AppError::NotFound)?;
    tracing::debug!(%id, "movie updated");
    Ok(Json(movie))
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    id: IdPath,
) -> AppResult<StatusCode> {
    let id = parse_id(id)?;
    if !state.movies.delete_by_id(&id).await? {
        return Err(AppError::NotFound);
    }
    tracing::debug!(%id, "movie deleted");
    Ok(StatusCode::NO_CONTENT)
}

// Malformed ids, including ones that do not decode as UTF-8, are reported
// exactly like unknown ones.
fn parse_id(id: IdPath) -> AppResult<MovieId> {
    let Ok(Path(raw)) = id else {
        return Err(AppError::NotFound);
    };
    MovieId::parse(&raw).ok_or(AppError::NotFound)
}
