use chrono::{DateTime, Utc};
use jobsift_core::error::AppError;
use jobsift_core::models::Listing;
use jobsift_core::normalize::MIN_TITLE_CHARS;
use jobsift_core::traits::ListingStore;
use sqlx::{PgPool, Pool, Postgres};
use uuid::Uuid;

// Column bounds, in characters.
const TITLE_MAX: usize = 200;
const COMPANY_MAX: usize = 200;
const SALARY_MAX: usize = 100;
const CITY_MAX: usize = 100;
const EXPERIENCE_MAX: usize = 100;
const URL_MAX: usize = 500;
const DESCRIPTION_MAX: usize = 1000;

/// Repository for listings in PostgreSQL. A URL is stored at most once
/// across all searches.
#[derive(Clone)]
pub struct ListingRepository {
    pool: Pool<Postgres>,
}

impl ListingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert the listings of one search and add the number of new rows to
    /// the search's `results_count`. Runs in a single transaction.
    pub async fn save(&self, search_id: Uuid, listings: &[Listing]) -> Result<u64, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        let mut saved = 0;
        for listing in listings {
            if !is_storable(listing) {
                tracing::debug!(url = %listing.url, "Skipping listing without usable title or URL");
                continue;
            }

            let result = sqlx::query(
                r#"
                INSERT INTO listings
                    (search_id, title, company, salary, city, experience, url, description, published_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ON CONFLICT (url) DO NOTHING
                "#,
            )
            .bind(search_id)
            .bind(truncate_chars(&listing.title, TITLE_MAX))
            .bind(truncate_chars(&listing.company, COMPANY_MAX))
            .bind(truncate_chars(&listing.salary, SALARY_MAX))
            .bind(truncate_chars(&listing.city, CITY_MAX))
            .bind(truncate_chars(&listing.experience, EXPERIENCE_MAX))
            .bind(&listing.url)
            .bind(truncate_chars(&listing.description, DESCRIPTION_MAX))
            .bind(listing.published_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

            saved += result.rows_affected();
        }

        sqlx::query("UPDATE search_queries SET results_count = results_count + $2 WHERE id = $1")
            .bind(search_id)
            .bind(saved as i32)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        tracing::info!(%search_id, saved, skipped = listings.len() as u64 - saved, "Listings saved");
        Ok(saved)
    }

    /// Listings stored for a search, in insertion order.
    pub async fn list(&self, search_id: Uuid) -> Result<Vec<Listing>, AppError> {
        let rows = sqlx::query_as::<_, ListingRow>(
            r#"
            SELECT title, company, salary, city, experience, url, description, published_at
            FROM listings
            WHERE search_id = $1
            ORDER BY id
            "#,
        )
        .bind(search_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

/// First `max` characters of `value`.
/// A listing is stored only with a real title and a URL that fits its
/// column untouched, since the URL is the dedup key.
fn is_storable(listing: &Listing) -> bool {
    let url_chars = listing.url.chars().count();
    listing.title.trim().chars().count() >= MIN_TITLE_CHARS && url_chars > 0 && url_chars <= URL_MAX
}

pub(crate) fn truncate_chars(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((byte_index, _)) => value[..byte_index].to_string(),
        None => value.to_string(),
    }
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct ListingRow {
    title: String,
    company: String,
    salary: String,
    city: String,
    experience: String,
    url: String,
    description: String,
    published_at: DateTime<Utc>,
}

impl From<ListingRow> for Listing {
    fn from(row: ListingRow) -> Self {
        Listing {
            title: row.title,
            company: row.company,
            salary: row.salary,
            city: row.city,
            experience: row.experience,
            url: row.url,
            description: row.description,
            published_at: row.published_at,
        }
    }
}

// -- Trait implementation --

impl ListingStore for ListingRepository {
    async fn save_listings(&self, search_id: Uuid, listings: &[Listing]) -> Result<u64, AppError> {
        ListingRepository::save(self, search_id, listings).await
    }

    async fn list_for_search(&self, search_id: Uuid) -> Result<Vec<Listing>, AppError> {
        ListingRepository::list(self, search_id).await
    }
}
