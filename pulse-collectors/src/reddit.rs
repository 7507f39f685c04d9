//! Reddit collector (public listing JSON)
//!
//! The same adapter serves the news pool (news subreddits) and the humor pool
//! (meme and comic subreddits); the subreddit list decides the destination.

use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use pulse_core::{HumorKind, NewsCategory};

use crate::collector::Collector;
use crate::error::CollectError;
use crate::http::{build_client, fetch_json};
use crate::normalize::decode_entities;
use crate::record::{LinkPost, RawRecord, RawTime, SourceProfile};

const REDDIT_BASE: &str = "https://www.reddit.com";

/// Posts requested per subreddit
const PER_SUBREDDIT_LIMIT: usize = 25;

/// A subreddit and where its posts belong
#[derive(Debug, Clone)]
pub struct Subreddit {
    pub name: String,
    pub profile: SourceProfile,
}

impl Subreddit {
    pub fn news(name: &str, category: NewsCategory) -> Self {
        Self {
            name: name.to_string(),
            profile: SourceProfile::news(&format!("r/{name}"), "US", category),
        }
    }

    pub fn humor(name: &str, kind: HumorKind) -> Self {
        Self {
            name: name.to_string(),
            profile: SourceProfile::humor(&format!("r/{name}"), kind),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    permalink: Option<String>,
    #[serde(default)]
    score: Option<i64>,
    #[serde(default)]
    created_utc: Option<f64>,
    #[serde(default)]
    over_18: bool,
    #[serde(default)]
    is_self: bool,
    #[serde(default)]
    stickied: bool,
    #[serde(default)]
    post_hint: Option<String>,
    #[serde(default)]
    preview: Option<Preview>,
}

#[derive(Debug, Deserialize)]
struct Preview {
    #[serde(default)]
    images: Vec<PreviewImage>,
}

#[derive(Debug, Deserialize)]
struct PreviewImage {
    source: PreviewSource,
}

#[derive(Debug, Deserialize)]
struct PreviewSource {
    url: String,
}

impl Post {
    /// Direct image link, else the first preview image
    fn media_url(&self) -> Option<String> {
        let direct = self.url.as_deref().filter(|u| {
            let lower = u.to_lowercase();
            self.post_hint.as_deref() == Some("image")
                || [".jpg", ".jpeg", ".png", ".gif", ".webp"]
                    .iter()
                    .any(|ext| lower.ends_with(ext))
        });

        direct.map(str::to_string).or_else(|| {
            self.preview
                .as_ref()
                .and_then(|p| p.images.first())
                .map(|img| decode_entities(&img.source.url))
        })
    }
}

/// Top posts of a set of subreddits
pub struct RedditCollector {
    name: &'static str,
    client: Client,
    base_url: String,
    subreddits: Vec<Subreddit>,
}

impl RedditCollector {
    /// Link posts from news subreddits
    pub fn news(user_agent: &str) -> Self {
        Self::with_subreddits(
            "reddit-news",
            user_agent,
            vec![
                Subreddit::news("worldnews", NewsCategory::International),
                Subreddit::news("technology", NewsCategory::Tech),
                Subreddit::news("economics", NewsCategory::Economy),
                Subreddit::news("politics", NewsCategory::Politics),
            ],
        )
    }

    /// Image posts from meme and comic subreddits
    pub fn humor(user_agent: &str) -> Self {
        Self::with_subreddits(
            "reddit-humor",
            user_agent,
            vec![
                Subreddit::humor("memes", HumorKind::Meme),
                Subreddit::humor("ProgrammerHumor", HumorKind::Meme),
                Subreddit::humor("comics", HumorKind::Comic),
            ],
        )
    }

    pub fn with_subreddits(
        name: &'static str,
        user_agent: &str,
        subreddits: Vec<Subreddit>,
    ) -> Self {
        Self {
            name,
            client: build_client(user_agent),
            base_url: REDDIT_BASE.to_string(),
            subreddits,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch_subreddit(&self, subreddit: &Subreddit) -> Result<Vec<RawRecord>, CollectError> {
        let url = format!("{}/r/{}/top.json", self.base_url, subreddit.name);
        let listing: Listing = fetch_json(self.client.get(url).query(&[
            ("t", "day".to_string()),
            ("limit", PER_SUBREDDIT_LIMIT.to_string()),
            ("raw_json", "1".to_string()),
        ]))
        .await?;
        let collected_at = Utc::now();

        let records = listing
            .data
            .children
            .into_iter()
            .map(|child| child.data)
            .filter(|post| !post.over_18 && !post.stickied)
            .map(|post| {
                let media_url = post.media_url();
                let permalink = post
                    .permalink
                    .as_deref()
                    .map(|p| format!("https://www.reddit.com{p}"));
                // Self posts link to the discussion itself
                let url = if post.is_self { permalink } else { post.url.clone().or(permalink) };

                RawRecord::Link(LinkPost {
                    profile: subreddit.profile.clone(),
                    external_id: post.id,
                    title: post.title,
                    url,
                    media_url,
                    score: post.score,
                    created: post
                        .created_utc
                        .map(|secs| RawTime::Unix(secs as i64))
                        .unwrap_or(RawTime::Missing),
                    collected_at,
                })
            })
            .collect();

        Ok(records)
    }
}

#[async_trait]
impl Collector for RedditCollector {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn collect(&self) -> Result<Vec<RawRecord>, CollectError> {
        let results = join_all(self.subreddits.iter().map(|s| self.fetch_subreddit(s))).await;

        let mut records = Vec::new();
        let mut last_error = None;
        for (subreddit, result) in self.subreddits.iter().zip(results) {
            match result {
                Ok(posts) => {
                    debug!("[REDDIT] r/{}: {} posts", subreddit.name, posts.len());
                    records.extend(posts);
                }
                Err(e) => {
                    warn!("[REDDIT] r/{} failed: {}", subreddit.name, e);
                    last_error = Some(e);
                }
            }
        }

        if records.is_empty() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        info!("[REDDIT:{}] Fetched {} posts", self.name, records.len());
        Ok(records)
    }
}
