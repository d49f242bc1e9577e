use jobsift_core::error::AppError;
use jobsift_core::pacing::{DelayRange, Pacing};
use jobsift_core::traits::Fetcher;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use crate::fetcher::ReqwestFetcher;
use crate::selectors::{element_text, parse_selector};

/// Marker for requirement lines inside a free-form description.
const REQUIREMENT_MARKER: &str = "требован";

/// Fields read from a single listing page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListingDetails {
    pub description: String,
    pub requirements: Vec<String>,
}

impl ListingDetails {
    pub fn is_empty(&self) -> bool {
        self.description.is_empty() && self.requirements.is_empty()
    }
}

/// Reads the full description and requirement list of one listing.
#[derive(Clone)]
pub struct DetailParser<F: Fetcher> {
    fetcher: F,
    pacing: Pacing,
    description: Selector,
    description_fallback: Selector,
    requirements: Selector,
}

impl DetailParser<ReqwestFetcher> {
    pub fn browser() -> Result<Self, AppError> {
        Self::new(ReqwestFetcher::browser()?)
    }
}

impl<F: Fetcher> DetailParser<F> {
    pub fn new(fetcher: F) -> Result<Self, AppError> {
        Ok(Self {
            fetcher,
            pacing: Pacing::new(DelayRange::secs(1, 2)),
            description: parse_selector(r#"div[data-qa="vacancy-description"]"#)?,
            description_fallback: parse_selector(
                r#"div[class*="description"], div[class*="vacancy-desc"]"#,
            )?,
            requirements: parse_selector(r#"li[data-qa="vacancy-requirement"]"#)?,
        })
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Fetch and parse a listing page. Any failure yields empty details.
    pub async fn fetch_details(&self, url: &str) -> ListingDetails {
        self.pacing.before_request().await;
        match self.fetcher.fetch(url).await {
            Ok(html) => self.parse(&html),
            Err(e) => {
                tracing::error!(url, error = %e, "Failed to fetch listing details");
                ListingDetails::default()
            }
        }
    }

    pub fn parse(&self, html: &str) -> ListingDetails {
        let document = Html::parse_document(html);

        let description_element = document
            .select(&self.description)
            .next()
            .or_else(|| document.select(&self.description_fallback).next());

        let description = description_element.map(element_text).unwrap_or_default();

        let mut requirements: Vec<String> = document
            .select(&self.requirements)
            .map(element_text)
            .filter(|r| !r.is_empty())
            .collect();

        if requirements.is_empty() {
            requirements = description_element
                .map(requirement_lines)
                .unwrap_or_default();
        }

        ListingDetails {
            description,
            requirements,
        }
    }
}

/// Text lines of `element` that mention requirements.
fn requirement_lines(element: ElementRef<'_>) -> Vec<String> {
    element
        .text()
        .flat_map(str::lines)
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| line.to_lowercase().contains(REQUIREMENT_MARKER))
        .collect()
}
