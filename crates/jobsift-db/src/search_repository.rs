use chrono::{DateTime, Utc};
use jobsift_core::error::AppError;
use jobsift_core::models::SearchRecord;
use sqlx::{PgPool, Pool, Postgres};
use uuid::Uuid;

use crate::listing_repository::truncate_chars;

const QUERY_MAX_CHARS: usize = 200;
const CITY_MAX_CHARS: usize = 100;

/// Repository for search queries in PostgreSQL.
#[derive(Clone)]
pub struct SearchRepository {
    pool: Pool<Postgres>,
}

impl SearchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a new search. The caller passes the effective city, i.e. the
    /// default city when the user gave none.
    pub async fn create(&self, query: &str, city: &str) -> Result<SearchRecord, AppError> {
        let row = sqlx::query_as::<_, SearchRow>(
            r#"
            INSERT INTO search_queries (query, city)
            VALUES ($1, $2)
            RETURNING id, query, city, results_count, created_at
            "#,
        )
        .bind(truncate_chars(query.trim(), QUERY_MAX_CHARS))
        .bind(truncate_chars(city.trim(), CITY_MAX_CHARS))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        tracing::debug!(search_id = %row.id, "Search recorded");
        Ok(row.into())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<SearchRecord>, AppError> {
        let row = sqlx::query_as::<_, SearchRow>(
            r#"
            SELECT id, query, city, results_count, created_at
            FROM search_queries
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.map(Into::into))
    }
}

#[derive(sqlx::FromRow)]
struct SearchRow {
    id: Uuid,
    query: String,
    city: String,
    results_count: i32,
    created_at: DateTime<Utc>,
}

impl From<SearchRow> for SearchRecord {
    fn from(row: SearchRow) -> Self {
        SearchRecord {
            id: row.id,
            query: row.query,
            city: row.city,
            results_count: row.results_count,
            created_at: row.created_at,
        }
    }
}
