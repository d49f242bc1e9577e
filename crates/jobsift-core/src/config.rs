use std::path::PathBuf;

use crate::error::AppError;
use crate::normalize::DEFAULT_SITE_URL;
use crate::region;

pub const DEFAULT_API_URL: &str = "https://api.hh.ru/vacancies";
pub const DEFAULT_SEARCH_URL: &str = "https://hh.ru/search/vacancy";
pub const DEFAULT_CITY: &str = "Москва";
pub const DEFAULT_EXPORT_DIR: &str = "downloads";

/// Largest page limit accepted from callers.
pub const MAX_PAGES_LIMIT: u32 = 10;
/// Page limit used when the caller does not give one.
pub const DEFAULT_MAX_PAGES: u32 = 3;

/// Where listings come from and where exports go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    /// Structured listings endpoint.
    pub api_url: String,
    /// Rendered search-results page.
    pub search_url: String,
    /// Site root for relative links.
    pub site_url: String,
    /// City searched when none is given, and the retry target when a
    /// city-scoped search comes back empty.
    pub default_city: String,
    pub export_dir: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            site_url: DEFAULT_SITE_URL.to_string(),
            default_city: DEFAULT_CITY.to_string(),
            export_dir: PathBuf::from(DEFAULT_EXPORT_DIR),
        }
    }
}

impl SourceConfig {
    /// Read configuration from environment variables, falling back to the
    /// hh.ru defaults.
    ///
    /// - `JOBSIFT_API_URL`
    /// - `JOBSIFT_SEARCH_URL`
    /// - `JOBSIFT_SITE_URL`
    /// - `JOBSIFT_DEFAULT_CITY` (must be a known city)
    /// - `JOBSIFT_EXPORT_DIR`
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let default_city = get("JOBSIFT_DEFAULT_CITY").unwrap_or(defaults.default_city);
        if !region::is_known(&default_city) {
            return Err(AppError::ConfigError(format!(
                "JOBSIFT_DEFAULT_CITY '{default_city}' is not a known city"
            )));
        }

        Ok(Self {
            api_url: get("JOBSIFT_API_URL").unwrap_or(defaults.api_url),
            search_url: get("JOBSIFT_SEARCH_URL").unwrap_or(defaults.search_url),
            site_url: get("JOBSIFT_SITE_URL").unwrap_or(defaults.site_url),
            default_city,
            export_dir: get("JOBSIFT_EXPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.export_dir),
        })
    }
}

/// Clamp a caller-supplied page limit into `1..=MAX_PAGES_LIMIT`.
pub fn clamp_max_pages(requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(DEFAULT_MAX_PAGES)
        .clamp(1, MAX_PAGES_LIMIT)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_env_is_empty() {
        let config = SourceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, SourceConfig::default());
        assert_eq!(config.default_city, "Москва");
    }

    #[test]
    fn overrides_are_applied() {
        let config = SourceConfig::from_lookup(lookup(&[
            ("JOBSIFT_API_URL", "http://localhost:9000/vacancies"),
            ("JOBSIFT_DEFAULT_CITY", "Казань"),
            ("JOBSIFT_EXPORT_DIR", "/tmp/out"),
            ("JOBSIFT_SEARCH_URL", "  "),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "http://localhost:9000/vacancies");
        assert_eq!(config.default_city, "Казань");
        assert_eq!(config.export_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.search_url, DEFAULT_SEARCH_URL);
    }

    #[test]
    fn unknown_default_city_is_rejected() {
        let err = SourceConfig::from_lookup(lookup(&[("JOBSIFT_DEFAULT_CITY", "Атлантида")]))
            .unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn page_limit_is_clamped() {
        assert_eq!(clamp_max_pages(None), 3);
        assert_eq!(clamp_max_pages(Some(0)), 1);
        assert_eq!(clamp_max_pages(Some(7)), 7);
        assert_eq!(clamp_max_pages(Some(50)), 10);
    }
}
