pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod normalize;
pub mod pacing;
pub mod region;
pub mod salary;
pub mod search;
pub mod traits;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use config::SourceConfig;
pub use error::AppError;
pub use export::ExportFormat;
pub use models::{Listing, NOT_SPECIFIED, SearchOutcome, SearchRecord, SearchRequest, SearchStats, SourceMode};
pub use normalize::{RawListing, normalize};
pub use pacing::{DelayRange, Pacing};
pub use search::SearchService;
pub use traits::{Fetcher, ListingSource, ListingStore, NullStore};
