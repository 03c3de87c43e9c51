use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::Expr,
};

use crate::{
    entities::movie,
    models::{Movie, MovieDraft, MovieId, ValidationErrors},
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("stored timestamp out of range: {0}")]
    Timestamp(#[from] jiff::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The document collection holding movies.
///
/// Writes validate the draft against the movie schema before touching
/// storage, and each write is a single statement.
#[async_trait]
pub trait MovieStore: Send + Sync {
    async fn insert(&self, draft: MovieDraft) -> StoreResult<Movie>;

    async fn find_all(&self) -> StoreResult<Vec<Movie>>;

    async fn find_by_id(&self, id: &MovieId) -> StoreResult<Option<Movie>>;

    /// Applies only the supplied fields. `None` when no movie has this id.
    async fn update_by_id(&self, id: &MovieId, draft: MovieDraft) -> StoreResult<Option<Movie>>;

    async fn delete_by_id(&self, id: &MovieId) -> StoreResult<bool>;
}

#[derive(Clone)]
pub struct SeaOrmMovieStore {
    db: DatabaseConnection,
}

impl SeaOrmMovieStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MovieStore for SeaOrmMovieStore {
    async fn insert(&self, draft: MovieDraft) -> StoreResult<Movie> {
        let new = draft.validate_new()?;
        let now = now_ms();

        let model = movie::ActiveModel {
            id: Set(MovieId::generate().to_string()),
            title: Set(new.title),
            director: Set(new.director),
            year: Set(new.year),
            genre: Set(new.genre),
            rating: Set(new.rating),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let row = model.insert(&self.db).await?;
        Ok(Movie::try_from(row)?)
    }

    async fn find_all(&self) -> StoreResult<Vec<Movie>> {
        let rows = movie::Entity::find()
            .order_by_asc(movie::Column::CreatedAt)
            .order_by_asc(movie::Column::Id)
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(Movie::try_from).collect::<Result<Vec<_>, _>>()?)
    }

    async fn find_by_id(&self, id: &MovieId) -> StoreResult<Option<Movie>> {
        let row = movie::Entity::find_by_id(id.to_string()).one(&self.db).await?;
        Ok(row.map(Movie::try_from).transpose()?)
    }

    async fn update_by_id(&self, id: &MovieId, draft: MovieDraft) -> StoreResult<Option<Movie>> {
        let changes = draft.validate_changes()?;

        let mut update = movie::Entity::update_many()
            .col_expr(movie::Column::UpdatedAt, Expr::value(now_ms()))
            .filter(movie::Column::Id.eq(id.as_str()));

        if let Some(title) = changes.title {
            update = update.col_expr(movie::Column::Title, Expr::value(title));
        }
        if let Some(director) = changes.director {
            update = update.col_expr(movie::Column::Director, Expr::value(director));
        }
        if let Some(year) = changes.year {
            update = update.col_expr(movie::Column::Year, Expr::value(year));
        }
        if let Some(genre) = changes.genre {
            update = update.col_expr(movie::Column::Genre, Expr::value(genre));
        }
        if let Some(rating) = changes.rating {
            update = update.col_expr(movie::Column::Rating, Expr::value(rating));
        }

        let row = update.exec_with_returning(&self.db).await?.into_iter().next();
        Ok(row.map(Movie::try_from).transpose()?)
    }

    async fn delete_by_id(&self, id: &MovieId) -> StoreResult<bool> {
        let res = movie::Entity::delete_by_id(id.to_string()).exec(&self.db).await?;
        Ok(res.rows_affected > 0)
    }
}

fn now_ms() -> i64 {
    jiff::Timestamp::now().as_millisecond()
}
