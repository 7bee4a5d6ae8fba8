//! What a search request points at: a relative resource query built from
//! filters, or an absolute page link handed back by the server.

use std::fmt;

use url::Url;
use url::form_urlencoded;

use crate::error::Result;
use crate::patient::PATIENT;

/// Page size used by the initial listing
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Relative resource query, e.g. `Patient?family=Smith&_count=10`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    resource_type: String,
    params: Vec<(String, String)>,
}

impl SearchQuery {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            params: Vec::new(),
        }
    }

    /// `Patient?_count=10`, the listing shown before any filter is applied
    pub fn initial_patients() -> Self {
        Self::new(PATIENT).count(DEFAULT_PAGE_SIZE)
    }

    /// Add a parameter; blank values are skipped like unused filter inputs.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.is_empty() {
            self.params.push((key.into(), value));
        }
        self
    }

    pub fn count(self, count: u32) -> Self {
        self.param("_count", count.to_string())
    }

    /// Path relative to the server base, with percent-encoded values
    pub fn to_relative(&self) -> String {
        if self.params.is_empty() {
            return self.resource_type.clone();
        }
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter())
            .finish();
        format!("{}?{}", self.resource_type, query)
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_relative())
    }
}

/// Opaque absolute URL of a result page, fetched verbatim
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageLink(Url);

impl PageLink {
    pub fn parse(url: &str) -> Result<Self> {
        Ok(Self(Url::parse(url)?))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PageLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Target of a search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTarget {
    /// Appended to the server base URL
    Query(SearchQuery),
    /// Requested as-is
    Page(PageLink),
}

impl From<SearchQuery> for SearchTarget {
    fn from(query: SearchQuery) -> Self {
        Self::Query(query)
    }
}

impl From<PageLink> for SearchTarget {
    fn from(link: PageLink) -> Self {
        Self::Page(link)
    }
}

impl fmt::Display for SearchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query(query) => fmt::Display::fmt(query, f),
            Self::Page(link) => fmt::Display::fmt(link, f),
        }
    }
}
