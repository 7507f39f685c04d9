//! Watchdog Matcher
//!
//! Filters a news pool down to the items that mention any ticker on a
//! caller's watchlist.

use pulse_core::{NewsItem, Page, PageRequest, PulseError, PulseResult};

use crate::feed::sort_items;

/// Longest accepted watchlist; extra tickers are ignored
pub const MAX_TICKERS: usize = 20;
/// Longest accepted ticker symbol
pub const MAX_TICKER_LEN: usize = 10;

/// Parse a comma-separated watchlist: uppercase, validate, drop duplicates
/// (keeping order). Tokens after the first [`MAX_TICKERS`] distinct tickers
/// are ignored unchecked.
pub fn parse_watchlist(raw: &str) -> PulseResult<Vec<String>> {
    let mut tickers: Vec<String> = Vec::new();

    for token in raw.split(',') {
        if tickers.len() == MAX_TICKERS {
            break;
        }
        let ticker = token.trim().trim_start_matches('$').to_uppercase();
        if ticker.is_empty() {
            continue;
        }
        if !is_valid_ticker(&ticker) {
            return Err(PulseError::validation(format!("invalid ticker: {ticker}")));
        }
        if !tickers.contains(&ticker) {
            tickers.push(ticker);
        }
    }

    Ok(tickers)
}

/// 1-10 characters of `A-Z 0-9 . -`, starting with a letter or digit
pub fn is_valid_ticker(ticker: &str) -> bool {
    let mut chars = ticker.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    ticker.len() <= MAX_TICKER_LEN
        && (first.is_ascii_uppercase() || first.is_ascii_digit())
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '.' || c == '-')
}

/// Whether a news item references any of the tickers
pub fn matches(item: &NewsItem, tickers: &[String]) -> bool {
    if item
        .tickers
        .iter()
        .any(|t| tickers.iter().any(|w| w.eq_ignore_ascii_case(t)))
    {
        return true;
    }

    [
        Some(item.title.as_str()),
        item.title_translated.as_deref(),
        item.summary.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|text| mentions_any(text, tickers))
}

/// Word-boundary match: an exact uppercase token, or a `$ticker` cashtag in any case
fn mentions_any(text: &str, tickers: &[String]) -> bool {
    text.split(|c: char| !(c.is_alphanumeric() || c == '.' || c == '-' || c == '$'))
        .map(|token| token.trim_end_matches(['.', '-']))
        .filter(|token| !token.is_empty())
        .any(|token| match token.strip_prefix('$') {
            Some(cashtag) => tickers.iter().any(|t| t.eq_ignore_ascii_case(cashtag)),
            None => tickers.iter().any(|t| t == token),
        })
}

/// Matching items, latest first, paginated
pub fn watch(pool: &[NewsItem], tickers: &[String], page: PageRequest) -> Page<NewsItem> {
    if tickers.is_empty() {
        return page.empty();
    }

    let mut items: Vec<NewsItem> = pool
        .iter()
        .filter(|item| matches(item, tickers))
        .cloned()
        .collect();
    sort_items(&mut items, pulse_core::SortOrder::Latest);
    page.paginate(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use pulse_core::NewsCategory;

    fn item(id: &str, title: &str, hours_ago: i64) -> NewsItem {
        NewsItem {
            id: id.to_string(),
            title: title.to_string(),
            title_translated: None,
            source: "Example".to_string(),
            country: "US".to_string(),
            category: NewsCategory::Economy,
            published_at: Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap()
                - Duration::hours(hours_ago),
            score: 0,
            url: format!("https://example.com/{id}"),
            summary: None,
            tickers: Vec::new(),
        }
    }

    fn watchlist(raw: &str) -> Vec<String> {
        parse_watchlist(raw).unwrap()
    }

    #[test]
    fn test_parse_dedupes_and_uppercases() {
        assert_eq!(watchlist(" aapl, NVDA ,$aapl,,brk.b"), vec!["AAPL", "NVDA", "BRK.B"]);
    }

    #[test]
    fn test_parse_caps_at_twenty() {
        let raw: Vec<String> = (0..30).map(|i| format!("T{i}")).collect();
        let tickers = watchlist(&raw.join(","));
        assert_eq!(tickers.len(), MAX_TICKERS);
        assert_eq!(tickers[0], "T0");
    }

    #[test]
    fn test_tokens_past_cap_are_not_validated() {
        let mut raw: Vec<String> = (0..MAX_TICKERS).map(|i| format!("T{i}")).collect();
        raw.push("T0".to_string());
        raw.push("DROP TABLE".to_string());
        let tickers = watchlist(&raw.join(","));
        assert_eq!(tickers.len(), MAX_TICKERS);
        assert_eq!(tickers[MAX_TICKERS - 1], "T19");

        // Duplicates do not count toward the cap
        let mut raw = vec!["T0".to_string(); 5];
        raw.push("DROP TABLE".to_string());
        assert!(parse_watchlist(&raw.join(",")).is_err());
    }

    #[test]
    fn test_parse_rejects_bad_syntax() {
        assert!(parse_watchlist("AAPL,DROP TABLE").is_err());
        assert!(parse_watchlist("TOOLONGTICKER").is_err());
        assert!(parse_watchlist(".X").is_err());
    }

    #[test]
    fn test_word_boundary_matching() {
        let tickers = watchlist("AI,NVDA");
        assert!(matches(&item("1", "NVDA beats estimates", 0), &tickers));
        assert!(matches(&item("2", "Chipmakers rally: AI.", 0), &tickers));
        assert!(!matches(&item("3", "MAIN street retail", 0), &tickers));
        // Lowercase words are not tickers
        assert!(!matches(&item("4", "said ai adoption grows", 0), &tickers));
        // Cashtags match in any case
        assert!(matches(&item("5", "Buying $nvda today", 0), &tickers));
    }

    #[test]
    fn test_ticker_metadata_matches() {
        let mut tagged = item("1", "Quarterly filing", 0);
        tagged.tickers = vec!["tsla".to_string()];
        assert!(matches(&tagged, &watchlist("TSLA")));
    }

    #[test]
    fn test_empty_watchlist_returns_empty_page() {
        let pool = vec![item("1", "NVDA beats estimates", 0)];
        let page = watch(&pool, &[], PageRequest::clamped(None, None, 20, 50));
        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
    }

    #[test]
    fn test_watch_sorts_latest_first() {
        let pool = vec![
            item("old", "NVDA guidance", 5),
            item("none", "Weather update", 0),
            item("new", "NVDA supply deal", 1),
        ];
        let page = watch(&pool, &watchlist("NVDA"), PageRequest::clamped(None, None, 20, 50));
        let ids: Vec<&str> = page.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
        assert_eq!(page.total, 2);
    }
}
