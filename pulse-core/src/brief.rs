//! Daily briefs and weekly industry reports

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::{MarketSnapshot, NewsItem, PulseError};

/// Number of headlines carried by a daily brief
pub const BRIEF_TOP_NEWS: usize = 5;

/// Aggregate of the day's most relevant news and market state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBrief {
    pub date: NaiveDate,
    pub headline: String,
    pub summary: String,
    pub top_news: Vec<NewsItem>,
    pub market: Option<MarketSnapshot>,
    pub generated_at: DateTime<Utc>,
}

/// Industries covered by weekly reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Industry {
    Semiconductor,
    Automotive,
    Finance,
    Energy,
    Biotech,
    Software,
}

impl Industry {
    pub const ALL: [Industry; 6] = [
        Industry::Semiconductor,
        Industry::Automotive,
        Industry::Finance,
        Industry::Energy,
        Industry::Biotech,
        Industry::Software,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Industry::Semiconductor => "semiconductor",
            Industry::Automotive => "automotive",
            Industry::Finance => "finance",
            Industry::Energy => "energy",
            Industry::Biotech => "biotech",
            Industry::Software => "software",
        }
    }

    /// Lowercase keywords used to pick relevant headlines for a report
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Industry::Semiconductor => &["chip", "semiconductor", "nvidia", "tsmc", "samsung", "foundry"],
            Industry::Automotive => &["car", "auto", "tesla", "ev ", "electric vehicle", "toyota"],
            Industry::Finance => &["bank", "fed", "rate", "bond", "stock", "inflation"],
            Industry::Energy => &["oil", "gas", "energy", "opec", "solar", "power"],
            Industry::Biotech => &["drug", "fda", "biotech", "vaccine", "pharma", "trial"],
            Industry::Software => &["software", "ai", "cloud", "microsoft", "google", "startup"],
        }
    }
}

impl fmt::Display for Industry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Industry {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Industry::ALL
            .into_iter()
            .find(|industry| industry.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| PulseError::validation(format!("unknown industry: {s}")))
    }
}

/// Weekly report for one industry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndustryReport {
    pub industry: Industry,
    /// Monday of the covered week
    pub week_start: NaiveDate,
    pub title: String,
    pub summary: String,
    pub highlights: Vec<String>,
    /// Number of articles the report was built from
    pub source_count: usize,
    pub generated_at: DateTime<Utc>,
}

/// Monday of the week containing `date`
pub fn week_start_of(date: NaiveDate) -> NaiveDate {
    date - chrono::Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Parse a `YYYY-MM-DD` week start, requiring a Monday
pub fn parse_week_start(raw: &str) -> Result<NaiveDate, PulseError> {
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| PulseError::validation(format!("invalid date: {raw}")))?;
    if date.weekday() != Weekday::Mon {
        return Err(PulseError::validation(format!("week start must be a Monday: {raw}")));
    }
    Ok(date)
}
