//! Feed Assembly / Query Engine
//!
//! Filter, sort and paginate a pool of normalized news items. Everything here
//! is pure and deterministic for a given pool and query.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Utc};

use pulse_core::{FeedQuery, NewsItem, Page, SortOrder};

/// Exponent of the trending age decay
const GRAVITY: f64 = 1.5;
/// Hours added to every age so fresh items do not divide by zero
const AGE_OFFSET_HOURS: f64 = 2.0;

/// Run a query against a pool: filter, sort, then paginate
pub fn query_feed(pool: &[NewsItem], query: &FeedQuery) -> Page<NewsItem> {
    let mut items = filter_items(pool, query);
    sort_items(&mut items, query.sort);
    query.page.paginate(items)
}

/// Items matching every filter of the query, in pool order
pub fn filter_items(pool: &[NewsItem], query: &FeedQuery) -> Vec<NewsItem> {
    let search = query.search.as_deref().map(str::to_lowercase);

    pool.iter()
        .filter(|item| query.category.map_or(true, |c| item.category == c))
        .filter(|item| {
            query
                .country
                .as_deref()
                .map_or(true, |country| item.country.eq_ignore_ascii_case(country))
        })
        .filter(|item| {
            query
                .source
                .as_deref()
                .map_or(true, |source| item.source.eq_ignore_ascii_case(source))
        })
        .filter(|item| {
            search
                .as_deref()
                .map_or(true, |needle| matches_search(item, needle))
        })
        .cloned()
        .collect()
}

/// Case-insensitive substring match over the original and translated title
fn matches_search(item: &NewsItem, needle: &str) -> bool {
    item.title.to_lowercase().contains(needle)
        || item
            .title_translated
            .as_deref()
            .is_some_and(|t| t.to_lowercase().contains(needle))
}

/// Sort in place. Ties fall back to newest first, then id ascending.
pub fn sort_items(items: &mut [NewsItem], sort: SortOrder) {
    match sort {
        SortOrder::Latest => items.sort_by(tie_break),
        SortOrder::Popular => {
            items.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| tie_break(a, b)))
        }
        SortOrder::Trending => {
            let Some(reference) = newest(items) else {
                return;
            };
            items.sort_by(|a, b| {
                let score_a = trending_score(a, reference);
                let score_b = trending_score(b, reference);
                score_b
                    .partial_cmp(&score_a)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| tie_break(a, b))
            });
        }
    }
}

fn tie_break(a: &NewsItem, b: &NewsItem) -> Ordering {
    b.published_at
        .cmp(&a.published_at)
        .then_with(|| a.id.cmp(&b.id))
}

/// Most recent publication time in the pool
pub fn newest(items: &[NewsItem]) -> Option<DateTime<Utc>> {
    items.iter().map(|item| item.published_at).max()
}

/// Gravity score `(score + 1) / (age_hours + 2)^1.5`, with age measured from
/// `reference` rather than the wall clock
pub fn trending_score(item: &NewsItem, reference: DateTime<Utc>) -> f64 {
    let age_hours = ((reference - item.published_at).num_seconds() as f64 / 3600.0).max(0.0);
    (item.score as f64 + 1.0) / (age_hours + AGE_OFFSET_HOURS).powf(GRAVITY)
}

/// Top `limit` items of the pool by trending score
pub fn trending(pool: &[NewsItem], limit: usize) -> Vec<NewsItem> {
    let mut items = pool.to_vec();
    sort_items(&mut items, SortOrder::Trending);
    items.truncate(limit);
    items
}

/// Remove items whose id was already seen; the first occurrence wins
pub fn dedupe_by_id(items: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.id.clone()))
        .collect()
}
