//! Randomized delays between requests to the listing source.
//!
//! Acquisition deliberately slows itself down: every request is preceded
//! by a random pause, and scrape mode pauses again after each page. The
//! delays are awaited in order, so one acquisition never has two requests
//! in flight.
//!
//! ```rust
//! use std::time::Duration;
//! use jobsift_core::pacing::{DelayRange, Pacing};
//!
//! let pacing = Pacing::new(DelayRange::secs(1, 2));
//! assert!(pacing.after_page.is_none());
//!
//! let none = Pacing::none();
//! assert_eq!(none.before_request.sample(), Duration::ZERO);
//! ```

use std::time::Duration;

/// A uniform random delay in `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min: Duration,
    pub max: Duration,
}

impl DelayRange {
    pub fn new(min: Duration, max: Duration) -> Self {
        if max < min {
            return Self { min: max, max: min };
        }
        Self { min, max }
    }

    pub fn secs(min: u64, max: u64) -> Self {
        Self::new(Duration::from_secs(min), Duration::from_secs(max))
    }

    pub const ZERO: DelayRange = DelayRange {
        min: Duration::ZERO,
        max: Duration::ZERO,
    };

    /// Draw one delay from the range.
    pub fn sample(&self) -> Duration {
        let spread_ms = (self.max - self.min).as_millis() as u64;
        if spread_ms == 0 {
            return self.min;
        }
        self.min + Duration::from_millis(rand_below(spread_ms + 1))
    }

    /// Sleep for one sampled delay.
    pub async fn wait(&self) {
        let delay = self.sample();
        if delay.is_zero() {
            return;
        }
        tracing::debug!(delay_ms = %delay.as_millis(), "Pacing request");
        tokio::time::sleep(delay).await;
    }
}

/// Delays applied by one acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Awaited before every page request.
    pub before_request: DelayRange,
    /// Awaited after a page has been processed, if set.
    pub after_page: Option<DelayRange>,
}

impl Pacing {
    pub fn new(before_request: DelayRange) -> Self {
        Self {
            before_request,
            after_page: None,
        }
    }

    pub fn with_after_page(mut self, after_page: DelayRange) -> Self {
        self.after_page = Some(after_page);
        self
    }

    /// No delays at all (tests, local fixtures).
    pub fn none() -> Self {
        Self::new(DelayRange::ZERO)
    }

    /// 1–2 s before each API request.
    pub fn api() -> Self {
        Self::new(DelayRange::secs(1, 2))
    }

    /// 2–4 s before each page request, 3–5 s after each page.
    pub fn scrape() -> Self {
        Self::new(DelayRange::secs(2, 4)).with_after_page(DelayRange::secs(3, 5))
    }

    pub async fn before_request(&self) {
        self.before_request.wait().await;
    }

    pub async fn after_page(&self) {
        if let Some(range) = &self.after_page {
            range.wait().await;
        }
    }
}

// Jitter only needs to look irregular to the remote side, so a time-seeded
// xorshift is enough and keeps `rand` out of the dependency tree.
fn rand_below(bound: u64) -> u64 {
    if bound == 0 {
        return 0;
    }
    let mut x = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
        | 1;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    x % bound
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_stays_within_bounds() {
        let range = DelayRange::new(Duration::from_millis(100), Duration::from_millis(150));
        for _ in 0..200 {
            let d = range.sample();
            assert!(d >= Duration::from_millis(100), "{d:?}");
            assert!(d <= Duration::from_millis(150), "{d:?}");
        }
    }

    #[test]
    fn reversed_bounds_are_swapped() {
        let range = DelayRange::new(Duration::from_secs(4), Duration::from_secs(2));
        assert_eq!(range.min, Duration::from_secs(2));
        assert_eq!(range.max, Duration::from_secs(4));
    }

    #[test]
    fn fixed_range_returns_min() {
        let range = DelayRange::secs(3, 3);
        assert_eq!(range.sample(), Duration::from_secs(3));
    }

    #[test]
    fn presets_match_source_etiquette() {
        let api = Pacing::api();
        assert_eq!(api.before_request, DelayRange::secs(1, 2));
        assert!(api.after_page.is_none());

        let scrape = Pacing::scrape();
        assert_eq!(scrape.before_request, DelayRange::secs(2, 4));
        assert_eq!(scrape.after_page, Some(DelayRange::secs(3, 5)));
    }

    #[tokio::test]
    async fn zero_pacing_does_not_sleep() {
        let start = std::time::Instant::now();
        let pacing = Pacing::none().with_after_page(DelayRange::ZERO);
        pacing.before_request().await;
        pacing.after_page().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn wait_sleeps_at_least_min() {
        let range = DelayRange::new(Duration::from_millis(30), Duration::from_millis(40));
        let start = std::time::Instant::now();
        range.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}
