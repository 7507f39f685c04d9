//! Deterministic fallback data
//!
//! Served when no store is configured and live feeds are off. Every value is
//! derived from a fixed anchor instant, so repeated calls return identical,
//! schema-valid payloads without reading the clock.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;

use pulse_collectors::stable_id;
use pulse_core::{
    week_start_of, DailyBrief, FearGreedReading, HumorItem, HumorKind, Industry, IndustryReport,
    MarketQuote, MarketSnapshot, NewsCategory, NewsItem, Prediction, SortOrder, BRIEF_TOP_NEWS,
};

use crate::brief_service::{matching_headlines, template_brief, template_report};
use crate::feed::sort_items;

/// 2026-01-05T09:00:00Z, a Monday
const ANCHOR_TIMESTAMP: i64 = 1_767_603_600;

/// Fixed instant every fallback timestamp is derived from
pub fn anchor() -> DateTime<Utc> {
    DateTime::from_timestamp(ANCHOR_TIMESTAMP, 0).unwrap_or_default()
}

pub fn anchor_date() -> NaiveDate {
    anchor().date_naive()
}

struct NewsFixture {
    title: &'static str,
    source: &'static str,
    country: &'static str,
    category: NewsCategory,
    minutes_ago: i64,
    score: u64,
    path: &'static str,
    summary: Option<&'static str>,
    tickers: &'static [&'static str],
}

const NEWS: &[NewsFixture] = &[
    NewsFixture {
        title: "Central banks signal a slower pace of rate cuts",
        source: "Reuters",
        country: "US",
        category: NewsCategory::Economy,
        minutes_ago: 20,
        score: 412,
        path: "markets/central-banks-slower-cuts",
        summary: Some("Policy makers cited sticky services inflation."),
        tickers: &[],
    },
    NewsFixture {
        title: "NVDA extends rally as data center orders climb",
        source: "CNBC",
        country: "US",
        category: NewsCategory::Tech,
        minutes_ago: 45,
        score: 388,
        path: "tech/nvda-data-center-orders",
        summary: Some("Chip demand from cloud providers keeps growing."),
        tickers: &["NVDA"],
    },
    NewsFixture {
        title: "삼성전자, 차세대 반도체 공장 착공",
        source: "연합뉴스",
        country: "KR",
        category: NewsCategory::Tech,
        minutes_ago: 60,
        score: 301,
        path: "economy/samsung-new-fab",
        summary: None,
        tickers: &["005930"],
    },
    NewsFixture {
        title: "코스피, 외국인 매수세에 2% 상승 마감",
        source: "한국경제",
        country: "KR",
        category: NewsCategory::Economy,
        minutes_ago: 80,
        score: 254,
        path: "market/kospi-foreign-buying",
        summary: None,
        tickers: &[],
    },
    NewsFixture {
        title: "Leaders gather for emergency climate summit",
        source: "BBC News",
        country: "GB",
        category: NewsCategory::International,
        minutes_ago: 95,
        score: 276,
        path: "world/emergency-climate-summit",
        summary: Some("Delegates from 40 countries attend the talks."),
        tickers: &[],
    },
    NewsFixture {
        title: "Parliament passes landmark data privacy bill",
        source: "The Guardian",
        country: "GB",
        category: NewsCategory::Politics,
        minutes_ago: 130,
        score: 198,
        path: "politics/data-privacy-bill",
        summary: None,
        tickers: &[],
    },
    NewsFixture {
        title: "TSLA recalls 120,000 vehicles over software fault",
        source: "Bloomberg",
        country: "US",
        category: NewsCategory::Risk,
        minutes_ago: 150,
        score: 245,
        path: "autos/tsla-software-recall",
        summary: Some("The fix ships as an over-the-air update."),
        tickers: &["TSLA"],
    },
    NewsFixture {
        title: "トヨタ、全固体電池の量産計画を前倒し",
        source: "NHK",
        country: "JP",
        category: NewsCategory::Tech,
        minutes_ago: 170,
        score: 167,
        path: "business/toyota-solid-state",
        summary: None,
        tickers: &["7203"],
    },
    NewsFixture {
        title: "Oil slips as OPEC+ weighs output increase",
        source: "Reuters",
        country: "US",
        category: NewsCategory::Economy,
        minutes_ago: 200,
        score: 176,
        path: "commodities/opec-output",
        summary: None,
        tickers: &[],
    },
    NewsFixture {
        title: "Bundestag debates new energy subsidy package",
        source: "Deutsche Welle",
        country: "DE",
        category: NewsCategory::Politics,
        minutes_ago: 230,
        score: 121,
        path: "politics/energy-subsidy",
        summary: None,
        tickers: &[],
    },
    NewsFixture {
        title: "Cyberattack disrupts port operations in northern Europe",
        source: "Associated Press",
        country: "US",
        category: NewsCategory::Risk,
        minutes_ago: 260,
        score: 233,
        path: "world/port-cyberattack",
        summary: Some("Shipping delays expected through the week."),
        tickers: &[],
    },
    NewsFixture {
        title: "FDA approves first oral drug for rare liver disease",
        source: "STAT",
        country: "US",
        category: NewsCategory::Tech,
        minutes_ago: 300,
        score: 143,
        path: "biotech/fda-oral-liver-drug",
        summary: None,
        tickers: &[],
    },
    NewsFixture {
        title: "K-pop agencies report record overseas concert revenue",
        source: "Korea Herald",
        country: "KR",
        category: NewsCategory::Culture,
        minutes_ago: 330,
        score: 187,
        path: "culture/kpop-concert-revenue",
        summary: None,
        tickers: &[],
    },
    NewsFixture {
        title: "AAPL and MSFT lead gains in software shares",
        source: "MarketWatch",
        country: "US",
        category: NewsCategory::Economy,
        minutes_ago: 360,
        score: 165,
        path: "stocks/aapl-msft-software-gains",
        summary: None,
        tickers: &["AAPL", "MSFT"],
    },
    NewsFixture {
        title: "China unveils stimulus to support property developers",
        source: "South China Morning Post",
        country: "CN",
        category: NewsCategory::International,
        minutes_ago: 400,
        score: 209,
        path: "economy/property-stimulus",
        summary: None,
        tickers: &[],
    },
    NewsFixture {
        title: "Blockbuster sequel breaks opening weekend record",
        source: "Variety",
        country: "US",
        category: NewsCategory::Culture,
        minutes_ago: 450,
        score: 98,
        path: "film/sequel-opening-record",
        summary: None,
        tickers: &[],
    },
    NewsFixture {
        title: "Ceasefire talks resume with new mediators",
        source: "Al Jazeera",
        country: "QA",
        category: NewsCategory::International,
        minutes_ago: 500,
        score: 221,
        path: "news/ceasefire-talks-resume",
        summary: None,
        tickers: &[],
    },
    NewsFixture {
        title: "Startup raises $400M to build AI cloud in Europe",
        source: "TechCrunch",
        country: "US",
        category: NewsCategory::Tech,
        minutes_ago: 560,
        score: 156,
        path: "startups/ai-cloud-europe",
        summary: None,
        tickers: &[],
    },
    NewsFixture {
        title: "Election polls tighten ahead of final debate",
        source: "Politico",
        country: "US",
        category: NewsCategory::Politics,
        minutes_ago: 620,
        score: 134,
        path: "elections/polls-tighten",
        summary: None,
        tickers: &[],
    },
    NewsFixture {
        title: "Bank regulators flag rising commercial real estate risk",
        source: "Financial Times",
        country: "GB",
        category: NewsCategory::Risk,
        minutes_ago: 700,
        score: 112,
        path: "banks/cre-risk",
        summary: None,
        tickers: &[],
    },
];

fn news_url(fixture: &NewsFixture) -> String {
    format!("https://news.example.com/{}", fixture.path)
}

/// Fallback news pool, latest first
pub fn news() -> Vec<NewsItem> {
    let anchor = anchor();
    NEWS.iter()
        .map(|f| {
            let url = news_url(f);
            NewsItem {
                id: stable_id(f.source, &url),
                title: f.title.to_string(),
                title_translated: None,
                source: f.source.to_string(),
                country: f.country.to_string(),
                category: f.category,
                published_at: anchor - Duration::minutes(f.minutes_ago),
                score: f.score,
                url,
                summary: f.summary.map(str::to_string),
                tickers: f.tickers.iter().map(|t| t.to_string()).collect(),
            }
        })
        .collect()
}

struct HumorFixture {
    title: &'static str,
    kind: HumorKind,
    source: &'static str,
    media: &'static str,
    upvotes: u64,
    minutes_ago: i64,
}

const HUMOR: &[HumorFixture] = &[
    HumorFixture {
        title: "When the market opens green after you sold everything",
        kind: HumorKind::Meme,
        source: "r/wallstreetbets",
        media: "https://i.redd.it/pulse-demo-green-open.jpg",
        upvotes: 18_204,
        minutes_ago: 35,
    },
    HumorFixture {
        title: "Me explaining crypto to my parents",
        kind: HumorKind::Meme,
        source: "r/memes",
        media: "https://i.redd.it/pulse-demo-crypto-parents.png",
        upvotes: 9_870,
        minutes_ago: 90,
    },
    HumorFixture {
        title: "Stonks",
        kind: HumorKind::Gif,
        source: "Giphy",
        media: "https://media.giphy.com/media/pulse-demo-stonks/giphy.gif",
        upvotes: 0,
        minutes_ago: 120,
    },
    HumorFixture {
        title: "Area man confident he can time the market this time",
        kind: HumorKind::Satire,
        source: "The Onion",
        media: "https://media.example.com/satire/time-the-market.jpg",
        upvotes: 0,
        minutes_ago: 180,
    },
    HumorFixture {
        title: "Correlation",
        kind: HumorKind::Comic,
        source: "xkcd",
        media: "https://imgs.xkcd.com/comics/correlation.png",
        upvotes: 0,
        minutes_ago: 240,
    },
    HumorFixture {
        title: "Economists predict nine of the last five recessions",
        kind: HumorKind::Satire,
        source: "The Babylon Bee",
        media: "https://media.example.com/satire/nine-recessions.jpg",
        upvotes: 0,
        minutes_ago: 300,
    },
    HumorFixture {
        title: "Nobody: Me refreshing the portfolio every 5 minutes",
        kind: HumorKind::Meme,
        source: "r/ProgrammerHumor",
        media: "https://i.redd.it/pulse-demo-refresh.jpg",
        upvotes: 6_412,
        minutes_ago: 360,
    },
    HumorFixture {
        title: "This is fine",
        kind: HumorKind::Gif,
        source: "Giphy",
        media: "https://media.giphy.com/media/pulse-demo-this-is-fine/giphy.gif",
        upvotes: 0,
        minutes_ago: 420,
    },
];

/// Fallback humor pool, latest first
pub fn humor() -> Vec<HumorItem> {
    let anchor = anchor();
    HUMOR
        .iter()
        .map(|f| HumorItem {
            id: stable_id(f.source, f.media),
            title: f.title.to_string(),
            kind: f.kind,
            media_url: f.media.to_string(),
            source: f.source.to_string(),
            upvotes: f.upvotes,
            published_at: anchor - Duration::minutes(f.minutes_ago),
            collected_at: anchor,
        })
        .collect()
}

/// `(symbol, name, localized name, price, change percent)` with two-decimal
/// fixed-point prices
type QuoteFixture = (&'static str, &'static str, &'static str, i64, i64);

const INDICES: &[QuoteFixture] = &[
    ("^GSPC", "S&P 500", "S&P 500", 6_912_45, 0_62),
    ("^IXIC", "NASDAQ Composite", "나스닥", 23_408_12, 1_05),
    ("^DJI", "Dow Jones", "다우존스", 48_977_30, -0_14),
    ("^KS11", "KOSPI", "코스피", 4_457_52, 2_01),
    ("^N225", "Nikkei 225", "닛케이 225", 51_832_80, -0_48),
];

const CRYPTO: &[QuoteFixture] = &[
    ("BTC", "Bitcoin", "비트코인", 98_412_55, 1_84),
    ("ETH", "Ethereum", "이더리움", 3_621_10, -0_92),
    ("SOL", "Solana", "솔라나", 187_34, 3_27),
    ("XRP", "XRP", "리플", 2_41, -1_15),
    ("DOGE", "Dogecoin", "도지코인", 0_38, 0_53),
    ("ADA", "Cardano", "에이다", 1_02, -2_06),
];

const FOREX: &[QuoteFixture] = &[
    ("USD/KRW", "US Dollar / Korean Won", "달러/원", 1_452_30, 0_21),
    ("USD/JPY", "US Dollar / Japanese Yen", "달러/엔", 157_12, -0_33),
    ("USD/EUR", "US Dollar / Euro", "달러/유로", 0_86, 0_12),
    ("USD/CNY", "US Dollar / Chinese Yuan", "달러/위안", 7_03, -0_05),
];

fn quotes(fixtures: &[QuoteFixture]) -> Vec<MarketQuote> {
    let updated_at = anchor();
    fixtures
        .iter()
        .filter_map(|(symbol, name, localized, price, percent)| {
            MarketQuote::from_percent(
                *symbol,
                *name,
                Decimal::new(*price, 2),
                Decimal::new(*percent, 2),
                updated_at,
            )
            .map(|quote| quote.with_localized_name(*localized))
        })
        .collect()
}

pub fn indices() -> Vec<MarketQuote> {
    quotes(INDICES)
}

pub fn crypto() -> Vec<MarketQuote> {
    quotes(CRYPTO)
}

pub fn forex() -> Vec<MarketQuote> {
    quotes(FOREX)
}

pub fn fear_greed() -> FearGreedReading {
    FearGreedReading::new(62, "Greed", anchor())
}

pub fn market_snapshot() -> MarketSnapshot {
    MarketSnapshot {
        indices: indices(),
        crypto: crypto(),
        forex: forex(),
        fear_greed: Some(fear_greed()),
        updated_at: anchor(),
    }
}

/// Fallback brief for any date, built from the fallback pool
pub fn brief(date: NaiveDate) -> DailyBrief {
    let mut top_news = news();
    sort_items(&mut top_news, SortOrder::Popular);
    top_news.truncate(BRIEF_TOP_NEWS);

    let generated_at = date
        .and_hms_opt(6, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or_else(anchor);

    template_brief(date, top_news, Some(market_snapshot()), generated_at)
}

/// Fallback report for any industry and week, built from the fallback pool
pub fn report(industry: Industry, week_start: NaiveDate) -> IndustryReport {
    let matched = matching_headlines(&news(), industry);
    let generated_at = week_start
        .and_hms_opt(9, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or_else(anchor);

    template_report(industry, week_start, &matched, generated_at)
}

/// `(slug, question, option a, option b)`
const PREDICTIONS: &[(&str, &str, &str, &str)] = &[
    ("kospi-close", "Will KOSPI close the week higher?", "Higher", "Lower"),
    ("btc-100k", "Will Bitcoin trade above $100,000 by Friday?", "Yes", "No"),
    ("fed-hold", "Will the Fed hold rates at the next meeting?", "Hold", "Cut"),
    ("usd-krw", "Will USD/KRW end the week above 1,450?", "Above", "Below"),
];

/// Weekly poll set for the week starting `week_start`. Ids are scoped to the
/// week so reseeding the same week is idempotent.
pub fn weekly_predictions(week_start: NaiveDate) -> Vec<Prediction> {
    let closes_at = (week_start + Duration::days(7))
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or_else(anchor);

    PREDICTIONS
        .iter()
        .map(|(slug, question, a, b)| Prediction {
            id: format!("{}-{}", week_start.format("%Y-%m-%d"), slug),
            question: question.to_string(),
            option_a: a.to_string(),
            option_b: b.to_string(),
            votes_a: 0,
            votes_b: 0,
            closes_at,
        })
        .collect()
}

/// Demo polls with fixed vote counts
pub fn predictions() -> Vec<Prediction> {
    const VOTES: [(u64, u64); 4] = [(128, 97), (211, 184), (305, 88), (64, 71)];

    weekly_predictions(week_start_of(anchor_date()))
        .into_iter()
        .zip(VOTES)
        .map(|(mut p, (a, b))| {
            p.votes_a = a;
            p.votes_b = b;
            p
        })
        .collect()
}
