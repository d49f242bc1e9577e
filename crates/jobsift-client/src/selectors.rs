//! Selector chains for search-result markup.
//!
//! Listing sites reshuffle their class names often, so every field is
//! located by an ordered chain of [`Matcher`]s: the first one that finds an
//! element with non-empty text wins. Chains are independent, so a missing
//! salary never hides a title.

use std::collections::HashSet;

use jobsift_core::error::AppError;
use jobsift_core::normalize::MarkupFields;
use scraper::{ElementRef, Html, Selector};

/// Locates one element inside a scope.
pub trait Matcher: Send + Sync {
    fn find<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>>;

    /// Short label for debug logs.
    fn describe(&self) -> &str;
}

/// Matches the first descendant selected by a CSS selector.
pub struct CssMatcher {
    source: String,
    selector: Selector,
}

impl CssMatcher {
    pub fn new(source: &str) -> Result<Self, AppError> {
        Ok(Self {
            source: source.to_string(),
            selector: parse_selector(source)?,
        })
    }
}

impl Matcher for CssMatcher {
    fn find<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        scope.select(&self.selector).next()
    }

    fn describe(&self) -> &str {
        &self.source
    }
}

/// Matches the first link with meaningful text, skipping links whose text
/// contains one of the `boilerplate` fragments (compared lowercase).
pub struct LinkTextMatcher {
    links: Selector,
    boilerplate: &'static [&'static str],
}

/// Link text must be longer than this to count as a title.
pub const MIN_LINK_TEXT_CHARS: usize = 3;

const TITLE_BOILERPLATE: &[&str] = &["hh.ru", "откликнуться", "показать"];
const NAVIGATION_BOILERPLATE: &[&str] = &["hh.ru", "hh", "вакансии", "найти"];

impl LinkTextMatcher {
    pub fn new(boilerplate: &'static [&'static str]) -> Result<Self, AppError> {
        Ok(Self {
            links: parse_selector("a[href]")?,
            boilerplate,
        })
    }
}

impl Matcher for LinkTextMatcher {
    fn find<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        scope
            .select(&self.links)
            .find(|link| is_meaningful_link_text(&element_text(*link), self.boilerplate))
    }

    fn describe(&self) -> &str {
        "first meaningful link"
    }
}

/// Ordered matchers for one field.
pub struct FieldChain {
    matchers: Vec<Box<dyn Matcher>>,
}

impl FieldChain {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }

    /// Chain of plain CSS selectors, most specific first.
    pub fn css(selectors: &[&str]) -> Result<Self, AppError> {
        let matchers = selectors
            .iter()
            .map(|s| CssMatcher::new(s).map(|m| Box::new(m) as Box<dyn Matcher>))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(matchers))
    }

    pub fn then(mut self, matcher: impl Matcher + 'static) -> Self {
        self.matchers.push(Box::new(matcher));
        self
    }

    /// First element whose collapsed text is non-empty, with that text.
    pub fn first_match<'a>(&self, scope: ElementRef<'a>) -> Option<(ElementRef<'a>, String)> {
        self.matchers.iter().find_map(|matcher| {
            let element = matcher.find(scope)?;
            let text = element_text(element);
            if text.is_empty() {
                None
            } else {
                tracing::trace!(matcher = matcher.describe(), "Field matched");
                Some((element, text))
            }
        })
    }

    pub fn text(&self, scope: ElementRef<'_>) -> Option<String> {
        self.first_match(scope).map(|(_, text)| text)
    }
}

/// Container selectors, most specific first. The loose class-substring
/// tier comes last.
const CONTAINER_SELECTORS: &[&str] = &[
    "div.vacancy-serp-item",
    r#"div[data-qa="vacancy-serp__vacancy"]"#,
    "div.serp-item",
    "div.vacancy-card",
    "article.vacancy-card",
    "div.vacancy-preview-card",
    r#"div[class*="vacancy"]"#,
    r#"div[class*="serp-item"]"#,
    r#"div[class*="card"]"#,
];

const TITLE_SELECTORS: &[&str] = &[
    r#"a[data-qa="vacancy-serp__vacancy-title"]"#,
    "a.serp-item__title",
    "a.vacancy-card__title",
    "h3 a",
    r#"a[class*="title"]"#,
    r#"a[class*="Title"]"#,
];

const COMPANY_SELECTORS: &[&str] = &[
    r#"a[data-qa="vacancy-serp__vacancy-employer"]"#,
    r#"span[data-qa="vacancy-serp__vacancy-employer"]"#,
    "div.vacancy-serp-item__meta-info",
    r#"a[class*="company"]"#,
    r#"span[class*="company"]"#,
    r#"div[class*="company"]"#,
];

const SALARY_SELECTORS: &[&str] = &[
    r#"span[data-qa="vacancy-serp__vacancy-compensation"]"#,
    "div.vacancy-serp-item__compensation",
    r#"span[class*="salary"]"#,
    r#"div[class*="salary"]"#,
];

const CITY_SELECTORS: &[&str] = &[
    r#"span[data-qa="vacancy-serp__vacancy-address"]"#,
    r#"span[class*="address"]"#,
    r#"div[class*="address"]"#,
    r#"span[class*="location"]"#,
    r#"div[class*="location"]"#,
];

const EXPERIENCE_SELECTORS: &[&str] = &[
    r#"div[data-qa="vacancy-serp__vacancy-work-experience"]"#,
    r#"span[class*="experience"]"#,
    r#"div[class*="experience"]"#,
];

const DESCRIPTION_SELECTORS: &[&str] = &[
    r#"div[data-qa="vacancy-serp__vacancy_snippet_requirement"]"#,
    r#"div[class*="snippet"]"#,
    r#"div[class*="description"]"#,
];

/// Class fragments that mark an item boundary in the heuristic pass.
const BOUNDARY_CLASS_FRAGMENTS: &[&str] = &["item", "card", "row"];

/// Compiled selectors for a search-result page.
pub struct SelectorSet {
    containers: Vec<CssMatcher>,
    vacancy_links: Selector,
    title: FieldChain,
    company: FieldChain,
    salary: FieldChain,
    city: FieldChain,
    experience: FieldChain,
    description: FieldChain,
}

impl SelectorSet {
    /// Selectors for hh.ru search results.
    pub fn standard() -> Result<Self, AppError> {
        Ok(Self {
            containers: CONTAINER_SELECTORS
                .iter()
                .map(|s| CssMatcher::new(s))
                .collect::<Result<_, _>>()?,
            vacancy_links: parse_selector(r#"a[href*="vacancy"]"#)?,
            title: FieldChain::css(TITLE_SELECTORS)?.then(LinkTextMatcher::new(TITLE_BOILERPLATE)?),
            company: FieldChain::css(COMPANY_SELECTORS)?,
            salary: FieldChain::css(SALARY_SELECTORS)?,
            city: FieldChain::css(CITY_SELECTORS)?,
            experience: FieldChain::css(EXPERIENCE_SELECTORS)?,
            description: FieldChain::css(DESCRIPTION_SELECTORS)?,
        })
    }

    /// Item containers from the first container selector that matches
    /// anything on the page.
    pub fn containers<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        for matcher in &self.containers {
            let found: Vec<_> = document.select(&matcher.selector).collect();
            if !found.is_empty() {
                tracing::debug!(selector = matcher.describe(), count = found.len(), "Container selector matched");
                return found;
            }
        }
        Vec::new()
    }

    /// Item boundaries guessed from listing links: the nearest ancestor
    /// `div` whose class looks like an item, card or row. Each boundary
    /// appears once, in document order of its first link.
    pub fn heuristic_containers<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        let mut seen = HashSet::new();
        let mut boundaries = Vec::new();

        for link in document.select(&self.vacancy_links) {
            if !is_meaningful_link_text(&element_text(link), NAVIGATION_BOILERPLATE) {
                continue;
            }
            let Some(boundary) = nearest_boundary(link) else {
                continue;
            };
            if seen.insert(boundary.id()) {
                boundaries.push(boundary);
            }
        }

        tracing::debug!(count = boundaries.len(), "Heuristic pass found item boundaries");
        boundaries
    }

    /// Run every field chain against one item scope.
    pub fn extract(&self, item: ElementRef<'_>) -> MarkupFields {
        let (title, href) = match self.title.first_match(item) {
            Some((element, text)) => (Some(text), element.value().attr("href").map(str::to_string)),
            None => (None, None),
        };

        MarkupFields {
            title,
            href,
            company: self.company.text(item),
            salary: self.salary.text(item),
            city: self.city.text(item),
            experience: self.experience.text(item),
            description: self.description.text(item),
        }
    }
}

fn nearest_boundary(link: ElementRef<'_>) -> Option<ElementRef<'_>> {
    link.ancestors().filter_map(ElementRef::wrap).find(|element| {
        element.value().name() == "div"
            && element
                .value()
                .attr("class")
                .is_some_and(|class| BOUNDARY_CLASS_FRAGMENTS.iter().any(|f| class.contains(f)))
    })
}

fn is_meaningful_link_text(text: &str, boilerplate: &[&str]) -> bool {
    if text.chars().count() <= MIN_LINK_TEXT_CHARS {
        return false;
    }
    let lower = text.to_lowercase();
    !boilerplate.iter().any(|b| lower.contains(b))
}

/// All text below `element`, whitespace-collapsed.
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn parse_selector(source: &str) -> Result<Selector, AppError> {
    Selector::parse(source).map_err(|e| AppError::SelectorError(format!("{source}: {e:?}")))
}
