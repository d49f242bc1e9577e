pub mod api;
pub mod details;
pub mod fetcher;
pub mod scrape;
pub mod selectors;
pub mod source;

pub use api::ApiSource;
pub use details::{DetailParser, ListingDetails};
pub use fetcher::ReqwestFetcher;
pub use scrape::ScrapeSource;
pub use selectors::{FieldChain, Matcher, SelectorSet};
pub use source::AnySource;
