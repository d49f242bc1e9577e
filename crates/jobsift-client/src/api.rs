use std::collections::HashSet;

use chrono::Utc;
use jobsift_core::config::{DEFAULT_API_URL, SourceConfig};
use jobsift_core::error::AppError;
use jobsift_core::models::Listing;
use jobsift_core::normalize::{ApiVacancy, DEFAULT_SITE_URL, RawListing, normalize_with_base};
use jobsift_core::pacing::Pacing;
use jobsift_core::traits::{Fetcher, ListingSource};
use serde::Deserialize;
use url::Url;

use crate::fetcher::ReqwestFetcher;

/// Listings requested per API page.
pub const PER_PAGE: u32 = 20;
/// Only listings published within this many days are requested.
pub const PERIOD_DAYS: u32 = 30;

/// One page of the listings endpoint. `items` stays untyped so a single
/// malformed element can be skipped without losing the page; `pages` is
/// read separately so an odd value only ends pagination.
#[derive(Debug, Deserialize)]
struct ApiPage {
    items: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pages: serde_json::Value,
}

impl ApiPage {
    /// Total page count, or `None` when absent or not a whole number.
    fn page_count(&self) -> Option<u32> {
        self.pages.as_u64().and_then(|p| u32::try_from(p).ok())
    }
}

/// Paginated client for the structured listings API.
#[derive(Clone)]
pub struct ApiSource<F: Fetcher> {
    fetcher: F,
    endpoint: String,
    site_url: String,
    pacing: Pacing,
}

impl ApiSource<ReqwestFetcher> {
    /// Client against the configured endpoint with the default 1–2 s pacing.
    pub fn from_config(config: &SourceConfig) -> Result<Self, AppError> {
        Ok(Self::new(ReqwestFetcher::api()?, &config.api_url)
            .with_site_url(&config.site_url))
    }
}

impl<F: Fetcher> ApiSource<F> {
    pub fn new(fetcher: F, endpoint: &str) -> Self {
        Self {
            fetcher,
            endpoint: endpoint.to_string(),
            site_url: DEFAULT_SITE_URL.to_string(),
            pacing: Pacing::api(),
        }
    }

    /// Client against the public hh.ru endpoint.
    pub fn hh(fetcher: F) -> Self {
        Self::new(fetcher, DEFAULT_API_URL)
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
            &self.endpoint,
            &[
                ("text", query.to_string()),
                ("area", region_id.to_string()),
                ("page", page.to_string()),
                ("per_page", PER_PAGE.to_string()),
                ("order_by", "publication_time".to_string()),
                ("period", PERIOD_DAYS.to_string()),
            ],
        )
        .map_err(|e| AppError::ConfigError(format!("Invalid API endpoint '{}': {e}", self.endpoint)))
    }

    /// Fetch and decode one page. Returns the normalized listings and the
    /// total page count reported by the source.
    async fn fetch_page(
        &self,
        query: &str,
        region_id: u32,
        page: u32,
    ) -> Result<(Vec<Listing>, u32), AppError> {
        let url = self.page_url(query, region_id, page)?;

        self.pacing.before_request().await;
        let body = self.fetcher.fetch(url.as_str()).await?;

        let parsed: ApiPage = serde_json::from_str(&body)?;
        let pages = parsed.page_count().unwrap_or_else(|| {
            if !parsed.pages.is_null() {
                tracing::warn!(pages = %parsed.pages, "Unreadable page count, treating page as last");
            }
            page + 1
        });

        let items = parsed
            .items
            .ok_or_else(|| AppError::ParseError("response has no 'items' field".into()))?;

        tracing::info!(page = page + 1, items = items.len(), "API page received");

        let fetched_at = Utc::now();
        let listings = items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| match serde_json::from_value::<ApiVacancy>(item) {
                Ok(vacancy) => {
                    normalize_with_base(RawListing::Api(vacancy), fetched_at, &self.site_url)
                }
                Err(e) => {
                    tracing::warn!(page = page + 1, index, error = %e, "Skipping unreadable item");
                    None
                }
            })
            .collect();

        Ok((listings, pages))
    }
}

impl<F: Fetcher> ListingSource for ApiSource<F> {
    async fn fetch(&self, query: &str, region_id: u32, max_pages: u32) -> Vec<Listing> {
        let mut all = Vec::new();
        let mut seen = HashSet::new();
        let mut page = 0;

        while page < max_pages {
            tracing::info!(query, page = page + 1, "Requesting API page");

            let (listings, pages) = match self.fetch_page(query, region_id, page).await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(
                        page = page + 1,
                        error = %e,
                        retryable = e.is_retryable(),
                        "API page failed, stopping pagination"
                    );
                    break;
                }
            };

            for listing in listings {
                if seen.insert(listing.url.clone()) {
                    all.push(listing);
                }
            }

            if page + 1 >= pages {
                tracing::info!(page = page + 1, "Reached last page");
                break;
            }
            page += 1;
        }

        tracing::info!(total = all.len(), "API acquisition finished");
        all
    }
}

#[cfg(test)]
mod tests {
    use jobsift_core::NOT_SPECIFIED;
    use jobsift_core::testutil::MockFetcher;

    use super::*;

    fn item(id: usize) -> serde_json::Value {
        serde_json::json!({
            "id": id.to_string(),
            "name": format!("Rust developer #{id}"),
            "alternate_url": format!("https://hh.ru/vacancy/{id}"),
            "employer": {"name": "Acme"},
            "area": {"name": "Москва"},
            "salary": {"from": 100000, "to": null, "currency": "RUR"},
            "experience": {"name": "1–3 years"},
            "snippet": {"requirement": "Rust", "responsibility": "Services"},
            "published_at": "2024-01-15T10:30:00+0300"
        })
    }

    fn page_body(ids: std::ops::Range<usize>, pages: u32) -> String {
        let items: Vec<_> = ids.map(item).collect();
        serde_json::json!({"items": items, "pages": pages, "found": 25}).to_string()
    }

    fn source(fetcher: MockFetcher) -> ApiSource<MockFetcher> {
        ApiSource::new(fetcher, "https://api.test/vacancies").with_pacing(Pacing::none())
    }

    #[tokio::test]
    async fn stops_after_last_reported_page() {
        let fetcher = MockFetcher::with_responses(vec![
            Ok(page_body(0..20, 2)),
            Ok(page_body(20..25, 2)),
            Ok(page_body(25..45, 2)),
        ]);
        let src = source(fetcher.clone());

        let listings = src.fetch("rust", 1, 5).await;

        assert_eq!(listings.len(), 25);
        assert_eq!(fetcher.requests().len(), 2);
        assert!(fetcher.requests()[1].contains("page=1"));
    }

    #[tokio::test]
    async fn request_carries_search_parameters() {
        let fetcher = MockFetcher::with_responses(vec![Ok(page_body(0..1, 1))]);
        let src = source(fetcher.clone());

        src.fetch("rust developer", 88, 3).await;

        let url = Url::parse(&fetcher.requests()[0]).unwrap();
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(params["text"], "rust developer");
        assert_eq!(params["area"], "88");
        assert_eq!(params["page"], "0");
        assert_eq!(params["per_page"], "20");
        assert_eq!(params["order_by"], "publication_time");
        assert_eq!(params["period"], "30");
    }

    #[tokio::test]
    async fn stops_at_max_pages() {
        let fetcher = MockFetcher::with_responses(vec![
            Ok(page_body(0..20, 10)),
            Ok(page_body(20..40, 10)),
            Ok(page_body(40..60, 10)),
        ]);
        let src = source(fetcher.clone());

        let listings = src.fetch("rust", 1, 2).await;

        assert_eq!(listings.len(), 40);
        assert_eq!(fetcher.requests().len(), 2);
    }

    #[tokio::test]
    async fn transport_failure_returns_earlier_pages() {
        let fetcher = MockFetcher::with_responses(vec![
            Ok(page_body(0..20, 5)),
            Err(AppError::Timeout(10)),
            Ok(page_body(40..60, 5)),
        ]);
        let src = source(fetcher.clone());

        let listings = src.fetch("rust", 1, 5).await;

        assert_eq!(listings.len(), 20);
        assert_eq!(fetcher.requests().len(), 2);
    }

    #[tokio::test]
    async fn error_status_stops_immediately() {
        let fetcher = MockFetcher::with_responses(vec![Err(AppError::HttpStatus {
            status: 403,
            url: "https://api.test/vacancies".into(),
        })]);
        let src = source(fetcher.clone());

        assert!(src.fetch("rust", 1, 5).await.is_empty());
        assert_eq!(fetcher.requests().len(), 1);
    }

    #[tokio::test]
    async fn missing_items_or_garbage_body_stops() {
        for body in [r#"{"pages": 3}"#, "<html>not json</html>"] {
            let fetcher = MockFetcher::with_responses(vec![
                Ok(body.to_string()),
                Ok(page_body(0..20, 3)),
            ]);
            let src = source(fetcher.clone());

            assert!(src.fetch("rust", 1, 3).await.is_empty());
            assert_eq!(fetcher.requests().len(), 1);
        }
    }

    #[tokio::test]
    async fn invalid_items_are_skipped() {
        let body = serde_json::json!({
            "items": [
                item(1),
                {"name": "", "alternate_url": "https://hh.ru/vacancy/2"},
                {"name": "X", "alternate_url": "https://hh.ru/vacancy/3"},
                {"name": ["not", "a", "string"]},
                {"name": "Go developer", "alternate_url": "https://hh.ru/vacancy/4", "salary": null},
            ],
            "pages": 1
        });
        let fetcher = MockFetcher::with_responses(vec![Ok(body.to_string())]);

        let listings = source(fetcher).fetch("dev", 1, 1).await;

        assert_eq!(listings.len(), 2);
        assert!(listings.iter().all(|l| !l.title.is_empty() && !l.url.is_empty()));
        assert_eq!(listings[0].salary, "from 100000 RUR");
        assert_eq!(listings[1].salary, NOT_SPECIFIED);
    }

    #[tokio::test]
    async fn odd_typed_fields_do_not_drop_items() {
        let body = serde_json::json!({
            "items": [
                {"name": "Rust developer", "alternate_url": "https://hh.ru/vacancy/1", "published_at": 1705300000},
                {"name": "Go developer", "alternate_url": "https://hh.ru/vacancy/2", "salary": {"from": 100000.0, "currency": "RUR"}},
                {"name": "Java developer", "alternate_url": "https://hh.ru/vacancy/3", "employer": "Acme"},
                {"name": "Python developer", "id": 4},
            ],
            "pages": 1
        });
        let fetcher = MockFetcher::with_responses(vec![Ok(body.to_string())]);

        let listings = source(fetcher).fetch("dev", 1, 1).await;

        assert_eq!(listings.len(), 4);
        assert_eq!(listings[1].salary, "from 100000 RUR");
        assert_eq!(listings[2].company, NOT_SPECIFIED);
        assert_eq!(listings[3].url, "https://hh.ru/vacancy/4");
    }

    #[tokio::test]
    async fn unreadable_page_count_keeps_items_and_stops() {
        for pages in [serde_json::json!(null), serde_json::json!("many"), serde_json::json!(2.5)] {
            let body = serde_json::json!({"items": [item(1)], "pages": pages});
            let fetcher = MockFetcher::with_responses(vec![
                Ok(body.to_string()),
                Ok(page_body(2..4, 3)),
            ]);
            let src = source(fetcher.clone());

            let listings = src.fetch("rust", 1, 3).await;

            assert_eq!(listings.len(), 1);
            assert_eq!(fetcher.requests().len(), 1);
        }
    }

    #[tokio::test]
    async fn repeated_urls_across_pages_are_emitted_once() {
        let fetcher = MockFetcher::with_responses(vec![
            Ok(page_body(0..20, 2)),
            Ok(page_body(15..25, 2)),
        ]);

        let listings = source(fetcher).fetch("rust", 1, 5).await;

        assert_eq!(listings.len(), 25);
    }

    #[tokio::test]
    async fn zero_max_pages_makes_no_requests() {
        let fetcher = MockFetcher::with_responses(vec![Ok(page_body(0..20, 2))]);
        let src = source(fetcher.clone());

        assert!(src.fetch("rust", 1, 0).await.is_empty());
        assert!(fetcher.requests().is_empty());
    }
}
