use std::sync::Arc;

use chrono::{DateTime, Utc};
use jobsift_core::config::{DEFAULT_SEARCH_URL, SourceConfig};
use jobsift_core::error::AppError;
use jobsift_core::models::Listing;
use jobsift_core::normalize::{DEFAULT_SITE_URL, RawListing, normalize_with_base};
use jobsift_core::pacing::Pacing;
use jobsift_core::traits::{Fetcher, ListingSource};
use scraper::{ElementRef, Html};
use url::Url;

use crate::fetcher::ReqwestFetcher;
use crate::selectors::SelectorSet;

/// Results requested per search page.
pub const ITEMS_ON_PAGE: u32 = 20;

/// Scraper for the human-facing search-result pages.
///
/// Used when the JSON API is unavailable. Pages are parsed synchronously
/// into owned listings before the next await, since the parsed document
/// cannot cross task boundaries.
#[derive(Clone)]
pub struct ScrapeSource<F: Fetcher> {
    fetcher: F,
    search_url: String,
    site_url: String,
    selectors: Arc<SelectorSet>,
    pacing: Pacing,
}

impl ScrapeSource<ReqwestFetcher> {
    pub fn from_config(config: &SourceConfig) -> Result<Self, AppError> {
        Ok(Self::new(ReqwestFetcher::browser()?, &config.search_url)?
            .with_site_url(&config.site_url))
    }
}

impl<F: Fetcher> ScrapeSource<F> {
    pub fn new(fetcher: F, search_url: &str) -> Result<Self, AppError> {
        Ok(Self {
            fetcher,
            search_url: search_url.to_string(),
            site_url: DEFAULT_SITE_URL.to_string(),
            selectors: Arc::new(SelectorSet::standard()?),
            pacing: Pacing::scrape(),
        })
    }

    /// Scraper for the public hh.ru search page.
    pub fn hh(fetcher: F) -> Result<Self, AppError> {
        Self::new(fetcher, DEFAULT_SEARCH_URL)
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_site_url(mut self, site_url: &str) -> Self {
        self.site_url = site_url.to_string();
        self
    }

    fn page_url(&self, query: &str, region_id: u32, page: u32) -> Result<Url, AppError> {
        Url::parse_with_params(
            &self.search_url,
            &[
                ("text", query.to_string()),
                ("area", region_id.to_string()),
                ("page", page.to_string()),
                ("items_on_page", ITEMS_ON_PAGE.to_string()),
                ("search_period", "30".to_string()),
                ("order_by", "publication_time".to_string()),
                ("search_field", "name".to_string()),
                ("clusters", "true".to_string()),
                ("enable_snippets", "true".to_string()),
                ("no_magic", "true".to_string()),
            ],
        )
        .map_err(|e| {
            AppError::ConfigError(format!("Invalid search URL '{}': {e}", self.search_url))
        })
    }

    /// Extract the listings of one result page.
    ///
    /// Runs the container pass first. When it yields nothing valid, every
    /// listing link on the page is used to guess item boundaries instead.
    pub fn parse_results_page(&self, html: &str, fetched_at: DateTime<Utc>) -> Vec<Listing> {
        let document = Html::parse_document(html);

        let containers = self.selectors.containers(&document);
        let listings = self.extract_all(&containers, fetched_at);
        if !listings.is_empty() {
            return listings;
        }

        tracing::warn!(
            containers = containers.len(),
            "Container pass found no valid items, falling back to link scan"
        );
        let boundaries = self.selectors.heuristic_containers(&document);
        self.extract_all(&boundaries, fetched_at)
    }

    fn extract_all(&self, items: &[ElementRef<'_>], fetched_at: DateTime<Utc>) -> Vec<Listing> {
        items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                let fields = self.selectors.extract(*item);
                let listing =
                    normalize_with_base(RawListing::Markup(fields), fetched_at, &self.site_url);
                if listing.is_none() {
                    tracing::debug!(index, "Item without title or link skipped");
                }
                listing
            })
            .collect()
    }
}

impl<F: Fetcher> ListingSource for ScrapeSource<F> {
    async fn fetch(&self, query: &str, region_id: u32, max_pages: u32) -> Vec<Listing> {
        let mut all = Vec::new();

        for page in 0..max_pages {
            let url = match self.page_url(query, region_id, page) {
                Ok(url) => url,
                Err(e) => {
                    tracing::error!(error = %e, "Cannot build search page URL");
                    break;
                }
            };

            tracing::info!(query, page = page + 1, "Requesting search page");
            self.pacing.before_request().await;

            let html = match self.fetcher.fetch(url.as_str()).await {
                Ok(html) => html,
                Err(e) => {
                    tracing::error!(
                        page = page + 1,
                        error = %e,
                        retryable = e.is_retryable(),
                        "Search page failed, stopping pagination"
                    );
                    break;
                }
            };

            let listings = self.parse_results_page(&html, Utc::now());
            tracing::info!(page = page + 1, items = listings.len(), "Search page parsed");

            if listings.is_empty() {
                tracing::info!(page = page + 1, "No listings on page, stopping");
                break;
            }
            all.extend(listings);

            if page + 1 < max_pages {
                self.pacing.after_page().await;
            }
        }

        tracing::info!(total = all.len(), "Scrape acquisition finished");
        all
    }
}
