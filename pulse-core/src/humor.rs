//! Normalized humor items

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::PulseError;

/// Closed set of humor item kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HumorKind {
    Meme,
    Gif,
    Satire,
    Comic,
}

impl HumorKind {
    pub const ALL: [HumorKind; 4] = [
        HumorKind::Meme,
        HumorKind::Gif,
        HumorKind::Satire,
        HumorKind::Comic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HumorKind::Meme => "meme",
            HumorKind::Gif => "gif",
            HumorKind::Satire => "satire",
            HumorKind::Comic => "comic",
        }
    }
}

impl fmt::Display for HumorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HumorKind {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "meme" => Ok(HumorKind::Meme),
            "gif" => Ok(HumorKind::Gif),
            "satire" => Ok(HumorKind::Satire),
            "comic" => Ok(HumorKind::Comic),
            other => Err(PulseError::validation(format!("unknown humor type: {other}"))),
        }
    }
}

/// A normalized meme, gif, satire piece or comic strip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumorItem {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: HumorKind,
    /// Image, gif or article thumbnail. Never empty.
    pub media_url: String,
    pub source: String,
    pub upvotes: u64,
    pub published_at: DateTime<Utc>,
    pub collected_at: DateTime<Utc>,
}
