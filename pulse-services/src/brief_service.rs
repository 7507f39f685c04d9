//! Brief Service
//!
//! Daily briefs and weekly industry reports. Summaries come from the text
//! completer when one is configured and fall back to templated text.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, instrument, warn};

use pulse_core::{
    week_start_of, DailyBrief, Industry, IndustryReport, MarketSnapshot, NewsItem, PulseError,
    PulseResult, SortOrder, BRIEF_TOP_NEWS,
};

use crate::cache::{keys, ttl, CacheLayer};
use crate::capabilities::Capabilities;
use crate::fallback;
use crate::feed::sort_items;
use crate::market_service::MarketService;
use crate::news_service::NewsService;
use crate::store::Store;
use crate::text::TextCompleter;

/// Headlines a report is built from at most
const REPORT_MAX_SOURCES: usize = 8;
/// Highlights listed in a report
const REPORT_HIGHLIGHTS: usize = 3;

const BRIEF_SYSTEM_PROMPT: &str = "You write a short morning briefing for a news dashboard. \
Summarize the headlines and market moves in three sentences. Plain text, no lists.";

const REPORT_SYSTEM_PROMPT: &str = "You write a weekly industry report for a news dashboard. \
Summarize the week's developments from the headlines in four sentences. Plain text, no lists.";

/// Brief and report generation
pub struct BriefService {
    caps: Capabilities,
    cache: CacheLayer,
    store: Option<Arc<dyn Store>>,
    news: Arc<NewsService>,
    market: Arc<MarketService>,
    completer: Option<Arc<dyn TextCompleter>>,
}

impl BriefService {
    pub fn new(
        caps: Capabilities,
        cache: CacheLayer,
        store: Option<Arc<dyn Store>>,
        news: Arc<NewsService>,
        market: Arc<MarketService>,
        completer: Option<Arc<dyn TextCompleter>>,
    ) -> Self {
        info!(
            "Initializing BriefService (store: {}, text generation: {})",
            store.is_some(),
            completer.is_some()
        );
        Self {
            caps,
            cache,
            store,
            news,
            market,
            completer,
        }
    }

    /// Today's brief, generated on first request of the day
    #[instrument(skip(self))]
    pub async fn today(&self, today: NaiveDate) -> PulseResult<DailyBrief> {
        if self.caps.is_demo() {
            return Ok(fallback::brief(today));
        }

        if let Some(brief) = self.lookup_brief(today).await? {
            return Ok(brief);
        }

        let brief = self.generate_brief(today).await;
        self.persist_brief(&brief).await;
        Ok(brief)
    }

    /// Brief for a specific date. Only today's brief is generated on demand.
    #[instrument(skip(self))]
    pub async fn by_date(&self, date: NaiveDate, today: NaiveDate) -> PulseResult<DailyBrief> {
        if date == today {
            return self.today(today).await;
        }
        if date > today {
            return Err(PulseError::not_found(format!("brief {date}")));
        }
        if self.caps.is_demo() {
            return Ok(fallback::brief(date));
        }

        self.lookup_brief(date)
            .await?
            .ok_or_else(|| PulseError::not_found(format!("brief {date}")))
    }

    /// A generated report. Missing reports are not generated on request.
    #[instrument(skip(self))]
    pub async fn report(&self, industry: Industry, week_start: NaiveDate) -> PulseResult<IndustryReport> {
        if self.caps.is_demo() {
            return Ok(fallback::report(industry, week_start));
        }

        let key = keys::report(industry, week_start);
        if let Some(report) = self.cache.get::<IndustryReport>(&key).await {
            return Ok(report);
        }

        let stored = match &self.store {
            Some(store) => store.get_report(industry, week_start).await?,
            None => None,
        };

        match stored {
            Some(report) => {
                self.cache.set(&key, &report, ttl::REPORT).await;
                Ok(report)
            }
            None => Err(PulseError::not_found(format!(
                "report {} {}",
                industry, week_start
            ))),
        }
    }

    /// Generate every industry report for the week containing `today`.
    /// Returns the number of reports generated.
    #[instrument(skip(self))]
    pub async fn generate_weekly_reports(&self, today: NaiveDate, now: DateTime<Utc>) -> usize {
        let week_start = week_start_of(today);
        let pool = self.news.pool().await;
        let mut generated = 0;

        for industry in Industry::ALL {
            let report = self.generate_report(industry, week_start, &pool, now).await;

            if let Some(store) = &self.store {
                if let Err(e) = store.save_report(&report).await {
                    warn!("[BRIEF] Failed to store {} report: {}", industry, e);
                }
            }
            self.cache
                .set(&keys::report(industry, week_start), &report, ttl::REPORT)
                .await;
            generated += 1;
        }

        info!("[BRIEF] Generated {} reports for week of {}", generated, week_start);
        generated
    }

    async fn lookup_brief(&self, date: NaiveDate) -> PulseResult<Option<DailyBrief>> {
        let key = keys::brief(date);
        if let Some(brief) = self.cache.get::<DailyBrief>(&key).await {
            return Ok(Some(brief));
        }

        let Some(store) = &self.store else {
            return Ok(None);
        };
        let stored = store.get_brief(date).await?;
        if let Some(brief) = &stored {
            self.cache.set(&key, brief, ttl::BRIEF).await;
        }
        Ok(stored)
    }

    async fn persist_brief(&self, brief: &DailyBrief) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save_brief(brief).await {
                warn!("[BRIEF] Failed to store brief {}: {}", brief.date, e);
            }
        }
        self.cache.set(&keys::brief(brief.date), brief, ttl::BRIEF).await;
    }

    async fn generate_brief(&self, date: NaiveDate) -> DailyBrief {
        let mut top_news = self.news.pool().await;
        sort_items(&mut top_news, SortOrder::Popular);
        top_news.truncate(BRIEF_TOP_NEWS);

        let market = self.market.snapshot().await;
        let generated_at = Utc::now();
        let mut brief = template_brief(date, top_news, Some(market), generated_at);

        if let Some(completer) = &self.completer {
            let prompt = brief_prompt(&brief);
            match completer.complete(BRIEF_SYSTEM_PROMPT, &prompt).await {
                Ok(summary) => brief.summary = summary,
                Err(e) => warn!("[BRIEF] Text generation failed, using template: {}", e),
            }
        }

        debug!("[BRIEF] Generated brief for {}", date);
        brief
    }

    async fn generate_report(
        &self,
        industry: Industry,
        week_start: NaiveDate,
        pool: &[NewsItem],
        now: DateTime<Utc>,
    ) -> IndustryReport {
        let matched = matching_headlines(pool, industry);
        let mut report = template_report(industry, week_start, &matched, now);

        if let (Some(completer), false) = (&self.completer, matched.is_empty()) {
            let prompt = matched
                .iter()
                .map(|item| format!("- {} ({})", item.title, item.source))
                .collect::<Vec<_>>()
                .join("\n");
            match completer.complete(REPORT_SYSTEM_PROMPT, &prompt).await {
                Ok(summary) => report.summary = summary,
                Err(e) => warn!("[BRIEF] Report generation for {} failed: {}", industry, e),
            }
        }

        report
    }
}

fn brief_prompt(brief: &DailyBrief) -> String {
    let mut prompt = String::from("Headlines:\n");
    for item in &brief.top_news {
        prompt.push_str(&format!("- {} ({})\n", item.title, item.source));
    }
    if let Some(market) = &brief.market {
        prompt.push_str("Markets:\n");
        for quote in market.indices.iter().chain(&market.crypto) {
            prompt.push_str(&format!("- {} {} ({}%)\n", quote.name, quote.price, quote.change_percent));
        }
    }
    prompt
}

/// Most popular headlines mentioning one of the industry's keywords
pub fn matching_headlines(pool: &[NewsItem], industry: Industry) -> Vec<NewsItem> {
    let keywords = industry.keywords();
    let mut matched: Vec<NewsItem> = pool
        .iter()
        .filter(|item| {
            let text = format!(
                "{} {}",
                item.title.to_lowercase(),
                item.summary.as_deref().unwrap_or_default().to_lowercase()
            );
            keywords.iter().any(|keyword| contains_word(&text, keyword))
        })
        .cloned()
        .collect();

    sort_items(&mut matched, SortOrder::Popular);
    matched.truncate(REPORT_MAX_SOURCES);
    matched
}

/// Keyword match at a word start, so "ai" does not match "said"
fn contains_word(text: &str, keyword: &str) -> bool {
    text.match_indices(keyword).any(|(idx, _)| {
        text[..idx]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric())
    })
}

/// Brief with a headline and summary assembled from its inputs
pub fn template_brief(
    date: NaiveDate,
    top_news: Vec<NewsItem>,
    market: Option<MarketSnapshot>,
    generated_at: DateTime<Utc>,
) -> DailyBrief {
    let headline = top_news
        .first()
        .map(|item| item.title_translated.clone().unwrap_or_else(|| item.title.clone()))
        .unwrap_or_else(|| format!("Daily brief for {}", date.format("%B %-d, %Y")));

    let mut summary = match top_news.len() {
        0 => "No major stories yet today.".to_string(),
        n => format!("{n} stories are leading today's news."),
    };

    if let Some(market) = &market {
        if let Some(lead) = market.indices.first() {
            let direction = if lead.change_percent.is_sign_negative() {
                "down"
            } else {
                "up"
            };
            summary.push_str(&format!(
                " {} is {} {}%.",
                lead.name,
                direction,
                lead.change_percent.abs()
            ));
        }
        if let Some(sentiment) = &market.fear_greed {
            summary.push_str(&format!(
                " Crypto sentiment reads {} ({}).",
                sentiment.classification, sentiment.value
            ));
        }
    }

    DailyBrief {
        date,
        headline,
        summary,
        top_news,
        market,
        generated_at,
    }
}

/// Report listing the top matched headlines
pub fn template_report(
    industry: Industry,
    week_start: NaiveDate,
    matched: &[NewsItem],
    generated_at: DateTime<Utc>,
) -> IndustryReport {
    let name = capitalize(industry.as_str());
    let highlights: Vec<String> = matched
        .iter()
        .take(REPORT_HIGHLIGHTS)
        .map(|item| item.title.clone())
        .collect();

    let summary = if matched.is_empty() {
        format!("No notable {} coverage this week.", industry.as_str())
    } else {
        format!(
            "{} articles covered the {} industry this week. Leading story: {}",
            matched.len(),
            industry.as_str(),
            matched[0].title
        )
    };

    IndustryReport {
        industry,
        week_start,
        title: format!("{} weekly: {}", name, week_start.format("%b %-d")),
        summary,
        highlights,
        source_count: matched.len(),
        generated_at,
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
