//! Engagement Service
//!
//! Prediction polls, votes and bookmarks. Writes persist only when a store is
//! configured; without one they are accepted, echoed back and reported as not
//! persisted.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument};

use pulse_core::{week_start_of, Prediction, PulseError, PulseResult, VoteChoice};

use crate::fallback;
use crate::store::Store;

/// Longest accepted news id in a bookmark request
const MAX_NEWS_ID_LEN: usize = 64;

/// Outcome of a vote
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteReceipt {
    pub prediction_id: String,
    pub choice: VoteChoice,
    pub votes_a: u64,
    pub votes_b: u64,
    pub persisted: bool,
}

/// Outcome of a bookmark toggle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkReceipt {
    pub news_id: String,
    pub bookmarked: bool,
    pub persisted: bool,
}

pub struct EngagementService {
    store: Option<Arc<dyn Store>>,
}

impl EngagementService {
    pub fn new(store: Option<Arc<dyn Store>>) -> Self {
        info!("Initializing EngagementService (store: {})", store.is_some());
        Self { store }
    }

    /// Whether writes are persisted and therefore need a caller identity
    pub fn requires_identity(&self) -> bool {
        self.store.is_some()
    }

    fn identity<'a>(&self, user_id: Option<&'a str>) -> PulseResult<&'a str> {
        user_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| PulseError::unauthorized("sign in required"))
    }

    /// Open polls. With a store, this week's polls are seeded on first use.
    #[instrument(skip(self))]
    pub async fn predictions(&self, now: DateTime<Utc>) -> PulseResult<Vec<Prediction>> {
        let Some(store) = &self.store else {
            return Ok(fallback::predictions());
        };

        let seeded = store
            .seed_predictions(&fallback::weekly_predictions(week_start_of(now.date_naive())))
            .await?;
        if seeded > 0 {
            info!("[PREDICT] Seeded {} polls for this week", seeded);
        }

        Ok(store.open_predictions(now).await?)
    }

    #[instrument(skip(self))]
    pub async fn vote(
        &self,
        prediction_id: &str,
        user_id: Option<&str>,
        choice: VoteChoice,
        now: DateTime<Utc>,
    ) -> PulseResult<VoteReceipt> {
        let Some(store) = &self.store else {
            let poll = fallback::predictions()
                .into_iter()
                .find(|p| p.id == prediction_id)
                .ok_or_else(|| PulseError::not_found(format!("prediction {prediction_id}")))?;

            let (votes_a, votes_b) = match choice {
                VoteChoice::A => (poll.votes_a + 1, poll.votes_b),
                VoteChoice::B => (poll.votes_a, poll.votes_b + 1),
            };
            return Ok(VoteReceipt {
                prediction_id: poll.id,
                choice,
                votes_a,
                votes_b,
                persisted: false,
            });
        };

        let user_id = self.identity(user_id)?;

        let open = store.open_predictions(now).await?;
        if !open.iter().any(|p| p.id == prediction_id) {
            return Err(PulseError::not_found(format!("prediction {prediction_id}")));
        }

        let tally = store.cast_vote(prediction_id, user_id, choice).await?;
        debug!("[PREDICT] {} voted {} on {}", user_id, choice.as_str(), prediction_id);

        Ok(VoteReceipt {
            prediction_id: prediction_id.to_string(),
            choice,
            votes_a: tally.votes_a,
            votes_b: tally.votes_b,
            persisted: true,
        })
    }

    #[instrument(skip(self))]
    pub async fn toggle_bookmark(
        &self,
        user_id: Option<&str>,
        news_id: &str,
    ) -> PulseResult<BookmarkReceipt> {
        let news_id = news_id.trim();
        if news_id.is_empty() || news_id.len() > MAX_NEWS_ID_LEN {
            return Err(PulseError::validation("invalid news id"));
        }

        let Some(store) = &self.store else {
            return Ok(BookmarkReceipt {
                news_id: news_id.to_string(),
                bookmarked: true,
                persisted: false,
            });
        };

        let user_id = self.identity(user_id)?;
        let bookmarked = store.toggle_bookmark(user_id, news_id).await?;

        Ok(BookmarkReceipt {
            news_id: news_id.to_string(),
            bookmarked,
            persisted: true,
        })
    }
}
