//! Salary text: composition from API sub-fields, display, and range parsing.

use crate::models::{DEFAULT_CURRENCY, NOT_SPECIFIED};

/// Shown instead of the sentinel when a salary is presented to people.
pub const NEGOTIABLE: &str = "Negotiable";

/// Compose the salary string from optional bounds. A zero bound counts as
/// absent.
pub fn compose(from: Option<u64>, to: Option<u64>, currency: Option<&str>) -> String {
    let from = from.filter(|v| *v > 0);
    let to = to.filter(|v| *v > 0);
    let currency = currency
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CURRENCY);

    match (from, to) {
        (Some(from), Some(to)) => format!("{from} - {to} {currency}"),
        (Some(from), None) => format!("from {from} {currency}"),
        (None, Some(to)) => format!("up to {to} {currency}"),
        (None, None) => NOT_SPECIFIED.to_string(),
    }
}

/// Human-facing salary text: the sentinel becomes [`NEGOTIABLE`].
pub fn format_salary(salary: &str) -> String {
    let collapsed = salary.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() || collapsed == NOT_SPECIFIED {
        NEGOTIABLE.to_string()
    } else {
        collapsed
    }
}

/// Numeric bounds recovered from free-text salary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SalaryRange {
    pub min: Option<u64>,
    pub max: Option<u64>,
}

impl SalaryRange {
    /// Parse `from N`, `up to N`, `N - M` and their Russian forms (`от N`,
    /// `до N`). Digit groups may be separated by spaces or NBSP; en and em
    /// dashes count as range separators. Anything else yields an empty range.
    pub fn parse(salary: &str) -> Self {
        if salary.trim().is_empty() || salary.trim() == NOT_SPECIFIED {
            return Self::default();
        }

        let lower = salary.to_lowercase();
        let numbers = extract_numbers(&lower);

        if let Some(rest) = strip_any_prefix(&lower, &["from", "от"]) {
            // "from 100 to 200" carries both bounds
            let nums = extract_numbers(rest);
            return Self {
                min: nums.first().copied(),
                max: nums.get(1).copied(),
            };
        }
        if strip_any_prefix(&lower, &["up to", "до"]).is_some() {
            return Self {
                min: None,
                max: numbers.first().copied(),
            };
        }
        if numbers.len() >= 2 && lower.contains(['-', '–', '—']) {
            return Self {
                min: Some(numbers[0]),
                max: Some(numbers[1]),
            };
        }
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

fn strip_any_prefix<'a>(s: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    let s = s.trim_start();
    prefixes.iter().find_map(|p| s.strip_prefix(p))
}

/// Numbers in order of appearance; whitespace between digits joins groups
/// ("150 000" is one number).
fn extract_numbers(s: &str) -> Vec<u64> {
    let mut numbers = Vec::new();
    let mut current = String::new();
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_ascii_digit() {
            current.push(c);
        } else if c.is_whitespace() && !current.is_empty() {
            let joins_group = chars.peek().is_some_and(|n| n.is_ascii_digit());
            if !joins_group {
                numbers.extend(current.parse::<u64>().ok());
                current.clear();
            }
        } else if !current.is_empty() {
            numbers.extend(current.parse::<u64>().ok());
            current.clear();
        }
    }
    if !current.is_empty() {
        numbers.extend(current.parse::<u64>().ok());
    }
    numbers
}
