use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use jobsift_core::models::{Listing, SearchRecord, SearchStats};

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SearchBody {
    /// Search text.
    pub query: String,
    /// City name; the configured default city when omitted.
    pub city: Option<String>,
    /// Pages to read, clamped to 1..=10 (default 3).
    pub max_pages: Option<u32>,
    /// "api" or "scrape"; the server default when omitted.
    pub mode: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ListingResponse {
    pub title: String,
    pub company: String,
    pub salary: String,
    pub city: String,
    pub experience: String,
    pub url: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
}

impl From<Listing> for ListingResponse {
    fn from(l: Listing) -> Self {
        Self {
            title: l.title,
            company: l.company,
            salary: l.salary,
            city: l.city,
            experience: l.experience,
            url: l.url,
            description: l.description,
            published_at: l.published_at,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SearchResponse {
    pub count: usize,
    pub listings: Vec<ListingResponse>,
}

// ---------------------------------------------------------------------------
// Saved searches
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CreateSearchResponse {
    pub search_id: Uuid,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SearchRecordResponse {
    pub id: Uuid,
    pub query: String,
    pub city: String,
    pub results_count: i32,
    pub created_at: DateTime<Utc>,
}

impl From<SearchRecord> for SearchRecordResponse {
    fn from(r: SearchRecord) -> Self {
        Self {
            id: r.id,
            query: r.query,
            city: r.city,
            results_count: r.results_count,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct StatsResponse {
    pub total: usize,
    pub with_salary: usize,
    pub cities: usize,
}

impl From<SearchStats> for StatsResponse {
    fn from(s: SearchStats) -> Self {
        Self {
            total: s.total,
            with_salary: s.with_salary,
            cities: s.cities,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SearchDetailResponse {
    pub search: SearchRecordResponse,
    pub stats: StatsResponse,
    pub listings: Vec<ListingResponse>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ExportQuery {
    /// "csv" (default), "tsv" or "xlsx".
    pub format: Option<String>,
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
