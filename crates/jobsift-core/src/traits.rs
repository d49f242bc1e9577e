use std::future::Future;

use uuid::Uuid;

use crate::error::AppError;
use crate::models::Listing;

/// Fetches a response body from a URL.
///
/// Implementations report non-success statuses as
/// [`AppError::HttpStatus`] and transport problems as
/// [`AppError::Timeout`] / [`AppError::NetworkError`].
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// A paginated listing source (API client or HTML scraper).
///
/// Sources absorb every network and markup failure: they stop paginating
/// and return what they collected so far, so `fetch` has no error case.
pub trait ListingSource: Send + Sync {
    fn fetch(
        &self,
        query: &str,
        region_id: u32,
        max_pages: u32,
    ) -> impl Future<Output = Vec<Listing>> + Send;
}

/// Persists listings, enforcing one stored record per URL.
pub trait ListingStore: Send + Sync + Clone {
    /// Store the listings of one search. Listings whose URL is already
    /// stored are skipped. Returns the number of newly stored rows.
    fn save_listings(
        &self,
        search_id: Uuid,
        listings: &[Listing],
    ) -> impl Future<Output = Result<u64, AppError>> + Send;

    /// All listings stored for a search, in insertion order.
    fn list_for_search(
        &self,
        search_id: Uuid,
    ) -> impl Future<Output = Result<Vec<Listing>, AppError>> + Send;
}

/// A no-op ListingStore for use when persistence is not needed.
#[derive(Debug, Clone)]
pub struct NullStore;

impl ListingStore for NullStore {
    async fn save_listings(&self, _search_id: Uuid, _listings: &[Listing]) -> Result<u64, AppError> {
        Ok(0)
    }

    async fn list_for_search(&self, _search_id: Uuid) -> Result<Vec<Listing>, AppError> {
        Ok(vec![])
    }
}

impl<S: ListingSource> ListingSource for std::sync::Arc<S> {
    fn fetch(
        &self,
        query: &str,
        region_id: u32,
        max_pages: u32,
    ) -> impl Future<Output = Vec<Listing>> + Send {
        S::fetch(self, query, region_id, max_pages)
    }
}
