//! Search, facet filtering and pagination for the country listing.
//!
//! Everything here is a pure function of `(collection, FilterState)` and is
//! recomputed from scratch on each state change. Callers may memoize, but
//! correctness never depends on it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{ALL, DEFAULT_PAGE_SIZE};
use crate::error::SharedError;
use crate::types::Country;

// ---------------------------------------------------------------------------
// Facet selection
// ---------------------------------------------------------------------------

/// Selected value of a facet control. `All` is the "no constraint" sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Facet {
    #[default]
    All,
    Only(String),
}

impl Facet {
    pub fn is_all(&self) -> bool {
        matches!(self, Facet::All)
    }

    fn admits(&self, pred: impl FnOnce(&str) -> bool) -> bool {
        match self {
            Facet::All => true,
            Facet::Only(value) => pred(value),
        }
    }
}

impl From<String> for Facet {
    fn from(value: String) -> Self {
        if value.is_empty() || value == ALL {
            Facet::All
        } else {
            Facet::Only(value)
        }
    }
}

impl From<&str> for Facet {
    fn from(value: &str) -> Self {
        Facet::from(value.to_string())
    }
}

impl From<Facet> for String {
    fn from(facet: Facet) -> Self {
        match facet {
            Facet::All => ALL.to_string(),
            Facet::Only(value) => value,
        }
    }
}

// ---------------------------------------------------------------------------
// Match mode
// ---------------------------------------------------------------------------

/// How the free-text query is compared against the common name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Prefix,
    Substring,
}

impl MatchMode {
    fn matches(self, name: &str, query: &str) -> bool {
        match self {
            MatchMode::Prefix => name.starts_with(query),
            MatchMode::Substring => name.contains(query),
        }
    }
}

impl FromStr for MatchMode {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prefix" => Ok(MatchMode::Prefix),
            "substring" => Ok(MatchMode::Substring),
            _ => Err(SharedError::InvalidMatchMode(s.to_string())),
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMode::Prefix => f.write_str("prefix"),
            MatchMode::Substring => f.write_str("substring"),
        }
    }
}

// ---------------------------------------------------------------------------
// Filter state
// ---------------------------------------------------------------------------

/// Transient listing state: query, facet selections and the 1-based page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub query: String,
    pub region: Facet,
    pub language: Facet,
    pub page: usize,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            query: String::new(),
            region: Facet::All,
            language: Facet::All,
            page: 1,
        }
    }
}

/// Raw URL query parameters of the listing (`?search=&region=&language=&page=`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterParams {
    pub search: Option<String>,
    pub region: Option<String>,
    pub language: Option<String>,
    pub page: Option<String>,
}

impl FilterState {
    /// Rebuild the state from URL parameters. Missing values fall back to
    /// the defaults; an unparseable or zero page becomes page 1.
    pub fn from_params(params: &FilterParams) -> Self {
        let page = params
            .page
            .as_deref()
            .and_then(|p| p.trim().parse::<usize>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);

        Self {
            query: params.search.clone().unwrap_or_default(),
            region: params.region.clone().map(Facet::from).unwrap_or_default(),
            language: params.language.clone().map(Facet::from).unwrap_or_default(),
            page,
        }
    }

    /// Whether a facet (not the search text) narrows the listing.
    pub fn filters_active(&self) -> bool {
        !self.region.is_all() || !self.language.is_all()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self.page = 1;
        self
    }

    pub fn with_region(mut self, region: impl Into<Facet>) -> Self {
        self.region = region.into();
        self.page = 1;
        self
    }

    pub fn with_language(mut self, language: impl Into<Facet>) -> Self {
        self.language = language.into();
        self.page = 1;
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    /// Reset both facets to `All`; the query is kept.
    pub fn cleared(mut self) -> Self {
        self.region = Facet::All;
        self.language = Facet::All;
        self.page = 1;
        self
    }

    pub fn matches(&self, country: &Country, mode: MatchMode) -> bool {
        let query = self.query.trim().to_lowercase();
        let name_match =
            query.is_empty() || mode.matches(&country.common_name().to_lowercase(), &query);
        let region_match = self.region.admits(|r| country.region == r);
        let language_match = self.language.admits(|l| country.speaks(l));

        name_match && region_match && language_match
    }
}

/// All countries admitted by `filter`, in collection order.
pub fn filter_countries<'a>(
    all: &'a [Country],
    filter: &FilterState,
    mode: MatchMode,
) -> Vec<&'a Country> {
    all.iter().filter(|c| filter.matches(c, mode)).collect()
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// One page of a filtered listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page actually served after clamping.
    pub page: usize,
    pub page_count: usize,
    pub page_size: usize,
    /// Number of matches across all pages.
    pub total: usize,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_count: self.page_count,
            page_size: self.page_size,
            total: self.total,
        }
    }
}

/// Slice `items` into the requested page.
///
/// A page past the end is clamped to the last page, and page 0 to page 1,
/// so a filter change that shrinks the result set never yields an empty
/// page while matches exist. A `page_size` of 0 means the default size.
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Page<T> {
    let page_size = if page_size == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        page_size
    };
    let total = items.len();
    let page_count = total.div_ceil(page_size);
    let page = page.clamp(1, page_count.max(1));

    let items = items
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();

    Page {
        items,
        page,
        page_count,
        page_size,
        total,
    }
}
