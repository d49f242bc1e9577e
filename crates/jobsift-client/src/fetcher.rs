use std::time::Duration;

use jobsift_core::error::AppError;
use jobsift_core::traits::Fetcher;
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};

/// Per-request timeout against the JSON API.
pub const API_TIMEOUT: Duration = Duration::from_secs(10);
/// Per-request timeout against rendered pages.
pub const PAGE_TIMEOUT: Duration = Duration::from_secs(15);

const API_USER_AGENT: &str = "jobsift/0.1 (vacancy search)";

// Rotated per fetcher so consecutive scrape runs do not share one fingerprint.
const BROWSER_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
];

/// HTTP fetcher using reqwest.
///
/// Each instance owns its own connection pool, so one acquisition run owns
/// one session. Two profiles exist: [`api`](Self::api) for the JSON
/// endpoint and [`browser`](Self::browser) for search-result pages.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
    timeout_secs: u64,
}

impl ReqwestFetcher {
    /// JSON API profile: 10 s timeout, `Accept: application/json`.
    pub fn api() -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Self::build(API_USER_AGENT, headers, API_TIMEOUT)
    }

    /// Browser-like profile for HTML pages: 15 s timeout, HTML accept
    /// headers, Russian-first language preference, rotating User-Agent.
    pub fn browser() -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("ru-RU,ru;q=0.8,en-US;q=0.5,en;q=0.3"),
        );
        headers.insert("Upgrade-Insecure-Requests", HeaderValue::from_static("1"));
        Self::build(pick_user_agent(), headers, PAGE_TIMEOUT)
    }

    fn build(user_agent: &str, headers: HeaderMap, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs: timeout.as_secs(),
        })
    }
}

impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                AppError::NetworkError(format!("Connection failed: {e}"))
            } else {
                AppError::HttpError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = status.as_u16(),
                url,
                body = %preview(&body, 200),
                "Source returned an error status"
            );
            return Err(AppError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout_secs)
            } else {
                AppError::HttpError(format!("Failed to read response body: {e}"))
            }
        })
    }
}

fn pick_user_agent() -> &'static str {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos() as usize;
    BROWSER_USER_AGENTS[nanos % BROWSER_USER_AGENTS.len()]
}

/// First `max_chars` characters of `body`, for log lines.
pub(crate) fn preview(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}
