//! Raw listing → canonical [`Listing`].
//!
//! Both acquisition modes hand their raw items to [`normalize`]. The API
//! mode supplies a deserialized JSON object ([`ApiVacancy`]); the scrape
//! mode supplies whatever text its selector chains managed to pull out of
//! a markup fragment ([`MarkupFields`]). Missing fields degrade to
//! [`NOT_SPECIFIED`]; only a missing title or URL drops the record.

use chrono::{DateTime, FixedOffset, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use url::Url;

use crate::models::{Listing, NOT_SPECIFIED};
use crate::salary;

/// Titles shorter than this (after trimming) are rejected.
pub const MIN_TITLE_CHARS: usize = 2;

/// Site root used to absolutize relative links and to build a URL from an id.
pub const DEFAULT_SITE_URL: &str = "https://hh.ru";

/// A transient, source-specific listing.
#[derive(Debug, Clone)]
pub enum RawListing {
    Api(ApiVacancy),
    Markup(MarkupFields),
}

/// One element of the API `items` array. Every field is optional because
/// the source omits or nulls them freely. A field of an unexpected type
/// reads as absent instead of failing the whole item.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiVacancy {
    #[serde(deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub alternate_url: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub employer: Option<Named>,
    #[serde(deserialize_with = "lenient")]
    pub area: Option<Named>,
    #[serde(deserialize_with = "lenient")]
    pub salary: Option<ApiSalary>,
    #[serde(deserialize_with = "lenient")]
    pub experience: Option<Named>,
    #[serde(deserialize_with = "lenient")]
    pub snippet: Option<ApiSnippet>,
    #[serde(deserialize_with = "lenient")]
    pub published_at: Option<String>,
}

/// `{ "name": ... }` sub-objects (employer, area, experience).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Named {
    #[serde(deserialize_with = "lenient")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiSalary {
    #[serde(deserialize_with = "amount")]
    pub from: Option<u64>,
    #[serde(deserialize_with = "amount")]
    pub to: Option<u64>,
    #[serde(deserialize_with = "lenient")]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiSnippet {
    #[serde(deserialize_with = "lenient")]
    pub requirement: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub responsibility: Option<String>,
}

/// Any value that does not decode as `T` becomes `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Salary bound: integers as-is, non-negative floats rounded, numeric
/// strings parsed.
fn amount<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let parsed = match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(whole)),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok().and_then(whole),
        _ => None,
    };
    Ok(parsed)
}

fn whole(f: f64) -> Option<u64> {
    (f.is_finite() && f >= 0.0).then(|| f.round() as u64)
}

/// Text extracted from one search-result fragment. `None` means no
/// selector in the field's chain produced text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkupFields {
    pub title: Option<String>,
    pub href: Option<String>,
    pub company: Option<String>,
    pub salary: Option<String>,
    pub city: Option<String>,
    pub experience: Option<String>,
    pub description: Option<String>,
}

/// Normalize against the default site root.
pub fn normalize(raw: RawListing, fetched_at: DateTime<Utc>) -> Option<Listing> {
    normalize_with_base(raw, fetched_at, DEFAULT_SITE_URL)
}

/// Normalize a raw listing. `site_url` resolves relative links.
pub fn normalize_with_base(
    raw: RawListing,
    fetched_at: DateTime<Utc>,
    site_url: &str,
) -> Option<Listing> {
    match raw {
        RawListing::Api(item) => from_api(item, fetched_at, site_url),
        RawListing::Markup(fields) => from_markup(fields, fetched_at, site_url),
    }
}

fn from_api(item: ApiVacancy, fetched_at: DateTime<Utc>, site_url: &str) -> Option<Listing> {
    let title = valid_title(item.name.as_deref())?;

    let url = non_empty(item.alternate_url.as_deref())
        .or_else(|| {
            non_empty(item.id.as_deref())
                .map(|id| format!("{}/vacancy/{id}", site_url.trim_end_matches('/')))
        })?;

    let salary = match item.salary {
        Some(s) => salary::compose(s.from, s.to, s.currency.as_deref()),
        None => NOT_SPECIFIED.to_string(),
    };

    let description = item
        .snippet
        .map(|s| {
            let requirement = s.requirement.as_deref().map(strip_highlight).unwrap_or_default();
            let responsibility = s
                .responsibility
                .as_deref()
                .map(strip_highlight)
                .unwrap_or_default();
            collapse(&format!("{requirement} {responsibility}"))
        })
        .unwrap_or_default();

    let published_at = item
        .published_at
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or(fetched_at);

    Some(Listing {
        title,
        company: named_or_sentinel(item.employer),
        salary,
        city: named_or_sentinel(item.area),
        experience: named_or_sentinel(item.experience),
        url,
        description,
        published_at,
    })
}

fn from_markup(fields: MarkupFields, fetched_at: DateTime<Utc>, site_url: &str) -> Option<Listing> {
    let title = valid_title(fields.title.as_deref())?;
    let url = absolutize(non_empty(fields.href.as_deref())?.as_str(), site_url)?;

    let city = non_empty(fields.city.as_deref())
        .and_then(|c| non_empty(c.split(',').next()))
        .unwrap_or_else(|| NOT_SPECIFIED.to_string());

    Some(Listing {
        title,
        company: or_sentinel(fields.company.as_deref()),
        salary: or_sentinel(fields.salary.as_deref()),
        city,
        experience: or_sentinel(fields.experience.as_deref()),
        url,
        description: non_empty(fields.description.as_deref()).unwrap_or_default(),
        published_at: fetched_at,
    })
}

/// Parse an ISO-8601 timestamp with an offset, accepting both `+03:00`
/// and the compact `+0300` form the API emits.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::<FixedOffset>::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .or_else(|_| DateTime::<FixedOffset>::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Resolve a possibly relative link against the site root.
pub fn absolutize(href: &str, site_url: &str) -> Option<String> {
    if let Ok(url) = Url::parse(href) {
        return Some(url.to_string());
    }
    Url::parse(site_url)
        .and_then(|base| base.join(href))
        .ok()
        .map(|u| u.to_string())
}

fn valid_title(raw: Option<&str>) -> Option<String> {
    non_empty(raw).filter(|t| t.chars().count() >= MIN_TITLE_CHARS)
}

fn named_or_sentinel(named: Option<Named>) -> String {
    or_sentinel(named.and_then(|n| n.name).as_deref())
}

fn or_sentinel(raw: Option<&str>) -> String {
    non_empty(raw).unwrap_or_else(|| NOT_SPECIFIED.to_string())
}

/// Trimmed, whitespace-collapsed text, or `None` if nothing is left.
fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(collapse).filter(|s| !s.is_empty())
}

fn collapse(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The API wraps query matches in `<highlighttext>` tags.
fn strip_highlight(raw: &str) -> String {
    raw.replace("<highlighttext>", "")
        .replace("</highlighttext>", "")
}
