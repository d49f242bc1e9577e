pub mod config;
pub mod database;
pub mod listing_repository;
pub mod search_repository;

pub use config::DatabaseConfig;
pub use database::Database;
pub use listing_repository::ListingRepository;
pub use search_repository::SearchRepository;
