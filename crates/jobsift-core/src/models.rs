use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Placeholder used for any text field that could not be determined.
pub const NOT_SPECIFIED: &str = "Not specified";

/// Currency assumed when the source omits one.
pub const DEFAULT_CURRENCY: &str = "RUR";

/// A normalized, storage-ready job listing.
///
/// `url` is the only identity a listing has; two listings with the same
/// URL are the same vacancy regardless of the other fields.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Listing {
    pub title: String,
    pub company: String,
    pub salary: String,
    pub city: String,
    pub experience: String,
    pub url: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
}

impl Listing {
    /// True when the salary field carries an actual figure.
    pub fn has_salary(&self) -> bool {
        !self.salary.is_empty() && self.salary != NOT_SPECIFIED
    }
}

/// Which acquisition path produced (or should produce) listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// Structured JSON API.
    #[default]
    Api,
    /// Rendered search-result pages.
    Scrape,
}

impl std::fmt::Display for SourceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceMode::Api => write!(f, "api"),
            SourceMode::Scrape => write!(f, "scrape"),
        }
    }
}

impl std::str::FromStr for SourceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "api" => Ok(SourceMode::Api),
            "scrape" | "html" => Ok(SourceMode::Scrape),
            other => Err(format!("Unknown source mode: {other}")),
        }
    }
}

/// One acquisition request: a query, an optional city and a page limit.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub city: Option<String>,
    pub max_pages: u32,
    /// Search record the results belong to, when they are persisted.
    pub search_id: Option<Uuid>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, city: Option<String>, max_pages: u32) -> Self {
        Self {
            query: query.into(),
            city,
            max_pages,
            search_id: None,
        }
    }

    pub fn with_search_id(mut self, search_id: Uuid) -> Self {
        self.search_id = Some(search_id);
        self
    }
}

/// Result of [`SearchService::run`](crate::search::SearchService::run).
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub listings: Vec<Listing>,
    /// Number of listings newly stored (`None` when nothing was persisted).
    pub saved: Option<u64>,
}

/// A persisted search query.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SearchRecord {
    pub id: Uuid,
    pub query: String,
    pub city: String,
    pub results_count: i32,
    pub created_at: DateTime<Utc>,
}

/// Summary figures for a set of listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct SearchStats {
    pub total: usize,
    pub with_salary: usize,
    pub cities: usize,
}

impl SearchStats {
    pub fn from_listings(listings: &[Listing]) -> Self {
        let cities: HashSet<&str> = listings
            .iter()
            .map(|l| l.city.as_str())
            .filter(|c| !c.is_empty() && *c != NOT_SPECIFIED)
            .collect();

        Self {
            total: listings.len(),
            with_salary: listings.iter().filter(|l| l.has_salary()).count(),
            cities: cities.len(),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_listing(url: &str) -> Listing {
    Listing {
        title: "Rust developer".into(),
        company: "Acme".into(),
        salary: NOT_SPECIFIED.into(),
        city: "Москва".into(),
        experience: NOT_SPECIFIED.into(),
        url: url.into(),
        description: String::new(),
        published_at: Utc::now(),
    }
}
