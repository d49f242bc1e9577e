use crate::error::AppError;
use crate::models::{Listing, SearchOutcome, SearchRequest};
use crate::region;
use crate::traits::{ListingSource, ListingStore, NullStore};

/// Orchestrates one acquisition run: validate → resolve region → fetch →
/// retry against the default city if empty → (optionally) persist.
///
/// Generic over the listing source and the store, so the API client and
/// the HTML scraper are interchangeable and tests need no network.
pub struct SearchService<Src, S = NullStore>
where
    Src: ListingSource,
    S: ListingStore,
{
    source: Src,
    store: Option<S>,
    default_city: String,
}

impl<Src: ListingSource> SearchService<Src, NullStore> {
    /// Create a new SearchService without persistence.
    pub fn new(source: Src, default_city: impl Into<String>) -> Self {
        Self {
            source,
            store: None,
            default_city: default_city.into(),
        }
    }
}

impl<Src, S> SearchService<Src, S>
where
    Src: ListingSource,
    S: ListingStore,
{
    /// Create a new SearchService that persists each run.
    pub fn with_store(source: Src, store: S, default_city: impl Into<String>) -> Self {
        Self {
            source,
            store: Some(store),
            default_city: default_city.into(),
        }
    }

    pub fn default_city(&self) -> &str {
        &self.default_city
    }

    /// Search listings for `query` in `city` (default city when `None`),
    /// reading at most `max_pages` pages.
    ///
    /// Network and markup trouble never surfaces here; the only error is an
    /// empty query, rejected before any request is made. When a city other
    /// than the default comes back empty, the default city is searched
    /// exactly once more.
    pub async fn search(
        &self,
        query: &str,
        city: Option<&str>,
        max_pages: u32,
    ) -> Result<Vec<Listing>, AppError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidInput("search query must not be empty".into()));
        }

        let city = city.map(str::trim).filter(|c| !c.is_empty());
        let default_region = region::resolve(Some(&self.default_city));
        let region_id = match city {
            Some(name) => region::resolve(Some(name)),
            None => default_region,
        };

        tracing::info!(
            query,
            city = city.unwrap_or(&self.default_city),
            region_id,
            max_pages,
            "Starting search"
        );

        let listings = self.source.fetch(query, region_id, max_pages).await;
        if !listings.is_empty() || region_id == default_region {
            tracing::info!(found = listings.len(), "Search finished");
            return Ok(listings);
        }

        tracing::info!(
            default_city = %self.default_city,
            "No listings for requested city, retrying with default city"
        );
        let listings = self.source.fetch(query, default_region, max_pages).await;
        tracing::info!(found = listings.len(), "Search finished after retry");
        Ok(listings)
    }

    /// Run a search and, when a store and a search id are present, persist
    /// the results.
    pub async fn run(&self, request: &SearchRequest) -> Result<SearchOutcome, AppError> {
        let listings = self
            .search(&request.query, request.city.as_deref(), request.max_pages)
            .await?;

        let saved = match (&self.store, request.search_id) {
            (Some(store), Some(search_id)) if !listings.is_empty() => {
                let saved = store.save_listings(search_id, &listings).await?;
                tracing::info!(%search_id, saved, found = listings.len(), "Saved listings");
                Some(saved)
            }
            (Some(_), Some(search_id)) => {
                tracing::info!(%search_id, "Nothing to save");
                Some(0)
            }
            _ => None,
        };

        Ok(SearchOutcome { listings, saved })
    }
}
