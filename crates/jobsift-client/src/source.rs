use jobsift_core::config::SourceConfig;
use jobsift_core::error::AppError;
use jobsift_core::models::{Listing, SourceMode};
use jobsift_core::traits::ListingSource;

use crate::api::ApiSource;
use crate::fetcher::ReqwestFetcher;
use crate::scrape::ScrapeSource;

/// Either listing source behind one type, picked at runtime.
#[derive(Clone)]
pub enum AnySource {
    Api(ApiSource<ReqwestFetcher>),
    Scrape(ScrapeSource<ReqwestFetcher>),
}

impl AnySource {
    pub fn from_config(mode: SourceMode, config: &SourceConfig) -> Result<Self, AppError> {
        tracing::debug!(%mode, "Building listing source");
        Ok(match mode {
            SourceMode::Api => AnySource::Api(ApiSource::from_config(config)?),
            SourceMode::Scrape => AnySource::Scrape(ScrapeSource::from_config(config)?),
        })
    }

    pub fn mode(&self) -> SourceMode {
        match self {
            AnySource::Api(_) => SourceMode::Api,
            AnySource::Scrape(_) => SourceMode::Scrape,
        }
    }
}

impl ListingSource for AnySource {
    async fn fetch(&self, query: &str, region_id: u32, max_pages: u32) -> Vec<Listing> {
        match self {
            AnySource::Api(source) => source.fetch(query, region_id, max_pages).await,
            AnySource::Scrape(source) => source.fetch(query, region_id, max_pages).await,
        }
    }
}
