//! Feed query values and pagination

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{NewsCategory, PulseError};

/// Highest page number any list endpoint will serve
pub const MAX_PAGE: u32 = 500;

/// Maximum length of a sanitized search string, in characters
pub const SEARCH_MAX_LEN: usize = 200;

/// Sort order of a news feed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Newest first
    #[default]
    Latest,
    /// Highest score first
    Popular,
    /// Recency-decayed popularity
    Trending,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Latest => "latest",
            SortOrder::Popular => "popular",
            SortOrder::Trending => "trending",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "latest" | "" => Ok(SortOrder::Latest),
            "popular" => Ok(SortOrder::Popular),
            "trending" => Ok(SortOrder::Trending),
            other => Err(PulseError::validation(format!("unknown sort order: {other}"))),
        }
    }
}

/// Clamped page/limit pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Clamp raw client input to `[1, MAX_PAGE]` and `[1, max_limit]`.
    /// Missing values fall back to page 1 and `default_limit`.
    pub fn clamped(
        page: Option<i64>,
        limit: Option<i64>,
        default_limit: u32,
        max_limit: u32,
    ) -> Self {
        let max_limit = max_limit.max(1);
        let page = page.unwrap_or(1).clamp(1, MAX_PAGE as i64) as u32;
        let limit = limit
            .unwrap_or(default_limit as i64)
            .clamp(1, max_limit as i64) as u32;
        Self { page, limit }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Index of the first item on this page
    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }

    /// Slice an already filtered and sorted sequence into this page
    pub fn paginate<T>(&self, items: Vec<T>) -> Page<T> {
        let total = items.len();
        let items = items
            .into_iter()
            .skip(self.offset())
            .take(self.limit as usize)
            .collect();

        Page {
            items,
            total,
            page: self.page,
            limit: self.limit,
        }
    }

    /// An empty page that still echoes the request
    pub fn empty<T>(&self) -> Page<T> {
        Page {
            items: Vec::new(),
            total: 0,
            page: self.page,
            limit: self.limit,
        }
    }
}

/// One page of a list response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Number of items matching the filter before pagination
    pub total: usize,
    pub page: u32,
    pub limit: u32,
}

/// Filter, sort and pagination parameters of one news feed request
#[derive(Debug, Clone, PartialEq)]
pub struct FeedQuery {
    pub category: Option<NewsCategory>,
    /// Uppercase ISO country code
    pub country: Option<String>,
    pub source: Option<String>,
    /// Sanitized search text
    pub search: Option<String>,
    pub sort: SortOrder,
    pub page: PageRequest,
}

impl FeedQuery {
    pub fn new(page: PageRequest) -> Self {
        Self {
            category: None,
            country: None,
            source: None,
            search: None,
            sort: SortOrder::Latest,
            page,
        }
    }

    pub fn with_category(mut self, category: NewsCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_country(mut self, country: &str) -> Self {
        let country = country.trim().to_uppercase();
        self.country = (!country.is_empty()).then_some(country);
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        let source = source.trim();
        self.source = (!source.is_empty()).then(|| source.to_string());
        self
    }

    /// Set the free-text search, sanitizing it first
    pub fn with_search(mut self, search: &str) -> Self {
        self.search = sanitize_search(search);
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }
}

/// Strip SQL wildcard characters, trim, and cap the length of a search string.
/// Returns `None` when nothing searchable remains.
pub fn sanitize_search(raw: &str) -> Option<String> {
    let stripped: String = raw.chars().filter(|c| *c != '%' && *c != '_').collect();
    let trimmed: String = stripped.trim().chars().take(SEARCH_MAX_LEN).collect();

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_clamps() {
        let req = PageRequest::clamped(Some(0), Some(1000), 20, 50);
        assert_eq!(req.page(), 1);
        assert_eq!(req.limit(), 50);

        let req = PageRequest::clamped(Some(-3), Some(-1), 20, 50);
        assert_eq!(req.page(), 1);
        assert_eq!(req.limit(), 1);

        let req = PageRequest::clamped(Some(99_999), None, 20, 50);
        assert_eq!(req.page(), MAX_PAGE);
        assert_eq!(req.limit(), 20);
    }

    #[test]
    fn test_paginate_beyond_end_keeps_total() {
        let req = PageRequest::clamped(Some(4), Some(5), 20, 50);
        let page = req.paginate((0..12).collect::<Vec<_>>());
        assert!(page.items.is_empty());
        assert_eq!(page.total, 12);
    }

    #[test]
    fn test_paginate_middle_page() {
        let req = PageRequest::clamped(Some(2), Some(5), 20, 50);
        let page = req.paginate((0..12).collect::<Vec<_>>());
        assert_eq!(page.items, vec![5, 6, 7, 8, 9]);
        assert_eq!(page.total, 12);
    }

    #[test]
    fn test_sanitize_strips_wildcards() {
        assert_eq!(sanitize_search("50%_off").as_deref(), Some("50off"));
        assert_eq!(sanitize_search("  %%__  "), None);
        assert_eq!(sanitize_search(""), None);
    }

    #[test]
    fn test_sanitize_truncates() {
        let long = "a".repeat(SEARCH_MAX_LEN + 50);
        assert_eq!(sanitize_search(&long).unwrap().chars().count(), SEARCH_MAX_LEN);
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("Trending".parse::<SortOrder>().unwrap(), SortOrder::Trending);
        assert!("oldest".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_feed_query_normalizes_country() {
        let query = FeedQuery::new(PageRequest::clamped(None, None, 20, 50)).with_country(" kr ");
        assert_eq!(query.country.as_deref(), Some("KR"));
        let query = query.with_country("  ");
        assert_eq!(query.country, None);
    }
}
