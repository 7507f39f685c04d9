//! SEC EDGAR current filings collector
//!
//! Reads the "current events" Atom feed for one form type. EDGAR rejects
//! requests without a contact address in the user agent, so this collector
//! carries its own identity.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use tracing::info;

use crate::collector::Collector;
use crate::error::CollectError;
use crate::http::{build_client, fetch_bytes};
use crate::record::{FilingEntry, RawRecord, RawTime};

const EDGAR_BASE: &str = "https://www.sec.gov";

const FILINGS_LIMIT: usize = 40;

/// Current filings of a single form type
pub struct FilingsCollector {
    client: Client,
    base_url: String,
    form: String,
}

impl FilingsCollector {
    /// Current 8-K (material event) filings
    pub fn new(sec_user_agent: &str) -> Self {
        Self {
            client: build_client(sec_user_agent),
            base_url: EDGAR_BASE.to_string(),
            form: "8-K".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_form(mut self, form: impl Into<String>) -> Self {
        self.form = form.into();
        self
    }
}

#[async_trait]
impl Collector for FilingsCollector {
    fn name(&self) -> &'static str {
        "filings"
    }

    async fn collect(&self) -> Result<Vec<RawRecord>, CollectError> {
        let url = format!("{}/cgi-bin/browse-edgar", self.base_url);
        let request = self.client.get(url).query(&[
            ("action", "getcurrent"),
            ("type", self.form.as_str()),
            ("owner", "include"),
            ("count", "40"),
            ("output", "atom"),
        ]);

        let content = fetch_bytes(request).await?;
        let feed = atom_syndication::Feed::read_from(&content[..])
            .map_err(|e| CollectError::ParseError(format!("EDGAR feed: {e}")))?;
        let collected_at = Utc::now();

        let records: Vec<RawRecord> = feed
            .entries()
            .iter()
            .take(FILINGS_LIMIT)
            .map(|entry| {
                RawRecord::Filing(FilingEntry {
                    form: self.form.clone(),
                    title: Some(entry.title().as_str().to_string()),
                    link: entry.links().first().map(|l| l.href().to_string()),
                    updated: RawTime::Parsed(entry.updated().with_timezone(&Utc)),
                    summary_html: entry.summary().map(|s| s.as_str().to_string()),
                    collected_at,
                })
            })
            .collect();

        info!("[EDGAR] Fetched {} {} filings", records.len(), self.form);
        Ok(records)
    }
}
