//! Test utilities: mock implementations of the core traits.
//!
//! Handwritten mocks for dependency injection in unit tests. All mocks use
//! `Arc<Mutex<_>>` for interior mutability, so clones share recorded calls
//! and tests can assert on them afterwards.
//!
//! Compiled for this crate's tests and, through the `testutil` feature,
//! for the tests of sibling crates.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::error::AppError;
use crate::models::Listing;
use crate::traits::{Fetcher, ListingSource, ListingStore};

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Mock fetcher that replays a queue of responses and records every URL.
#[derive(Clone)]
pub struct MockFetcher {
    /// Each call pops the first element. When empty, returns a network error.
    responses: Arc<Mutex<Vec<Result<String, AppError>>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn new(body: &str) -> Self {
        Self::with_responses(vec![Ok(body.to_string())])
    }

    pub fn with_error(error: AppError) -> Self {
        Self::with_responses(vec![Err(error)])
    }

    pub fn with_responses(responses: Vec<Result<String, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        self.requests.lock().unwrap().push(url.to_string());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Err(AppError::NetworkError("no more mock responses".into()))
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockSource
// ---------------------------------------------------------------------------

/// Mock listing source returning queued result sets.
#[derive(Clone)]
pub struct MockSource {
    /// Each call pops the first element. When empty, returns no listings.
    results: Arc<Mutex<Vec<Vec<Listing>>>>,
    calls: Arc<Mutex<Vec<(String, u32, u32)>>>,
}

impl MockSource {
    pub fn new(results: Vec<Vec<Listing>>) -> Self {
        Self {
            results: Arc::new(Mutex::new(results)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// `(query, region_id, max_pages)` of every call, in order.
    pub fn calls(&self) -> Vec<(String, u32, u32)> {
        self.calls.lock().unwrap().clone()
    }
}

impl ListingSource for MockSource {
    async fn fetch(&self, query: &str, region_id: u32, max_pages: u32) -> Vec<Listing> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), region_id, max_pages));
        let mut results = self.results.lock().unwrap();
        if results.is_empty() {
            Vec::new()
        } else {
            results.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockStore
// ---------------------------------------------------------------------------

/// Mock store that records saves and skips URLs it has already seen.
#[derive(Clone)]
pub struct MockStore {
    pub saved: Arc<Mutex<Vec<(Uuid, Listing)>>>,
    save_error: Arc<Mutex<Option<AppError>>>,
}

impl MockStore {
    /// Empty store, nothing saved yet.
    pub fn empty() -> Self {
        Self {
            saved: Arc::new(Mutex::new(Vec::new())),
            save_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Store whose next save fails.
    pub fn with_save_error(error: AppError) -> Self {
        Self {
            saved: Arc::new(Mutex::new(Vec::new())),
            save_error: Arc::new(Mutex::new(Some(error))),
        }
    }
}

impl ListingStore for MockStore {
    async fn save_listings(&self, search_id: Uuid, listings: &[Listing]) -> Result<u64, AppError> {
        if let Some(e) = self.save_error.lock().unwrap().take() {
            return Err(e);
        }
        let mut saved = self.saved.lock().unwrap();
        let mut known: HashSet<String> = saved.iter().map(|(_, l)| l.url.clone()).collect();
        let mut count = 0;
        for listing in listings {
            if known.insert(listing.url.clone()) {
                saved.push((search_id, listing.clone()));
                count += 1;
            }
        }
        Ok(count)
    }

    async fn list_for_search(&self, search_id: Uuid) -> Result<Vec<Listing>, AppError> {
        Ok(self
            .saved
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == search_id)
            .map(|(_, l)| l.clone())
            .collect())
    }
}
