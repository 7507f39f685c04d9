//! Persistent store
//!
//! The [`Store`] trait is the boundary to durable storage; [`SqliteStore`] is
//! the bundled SQLite implementation. Items are stored as JSON documents next
//! to the columns the queries need.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use pulse_core::{
    DailyBrief, HumorItem, Industry, IndustryReport, NewsItem, Prediction, PulseError, VoteChoice,
    VoteTally,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<StoreError> for PulseError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => PulseError::not_found(what),
            other => PulseError::store(other.to_string()),
        }
    }
}

/// Durable storage used when the store capability is present
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert or refresh news items. Existing translations are kept.
    async fn upsert_news(&self, items: &[NewsItem]) -> Result<usize, StoreError>;

    /// Most recent news items, newest first
    async fn recent_news(&self, limit: usize) -> Result<Vec<NewsItem>, StoreError>;

    async fn get_news(&self, id: &str) -> Result<Option<NewsItem>, StoreError>;

    /// Persist translated headlines by news id
    async fn save_translations(&self, translations: &[(String, String)]) -> Result<usize, StoreError>;

    async fn upsert_humor(&self, items: &[HumorItem]) -> Result<usize, StoreError>;

    async fn recent_humor(&self, limit: usize) -> Result<Vec<HumorItem>, StoreError>;

    async fn save_brief(&self, brief: &DailyBrief) -> Result<(), StoreError>;

    async fn get_brief(&self, date: NaiveDate) -> Result<Option<DailyBrief>, StoreError>;

    async fn save_report(&self, report: &IndustryReport) -> Result<(), StoreError>;

    async fn get_report(
        &self,
        industry: Industry,
        week_start: NaiveDate,
    ) -> Result<Option<IndustryReport>, StoreError>;

    /// Insert predictions that do not exist yet
    async fn seed_predictions(&self, predictions: &[Prediction]) -> Result<usize, StoreError>;

    /// Predictions still open at `now`, with their vote counts
    async fn open_predictions(&self, now: DateTime<Utc>) -> Result<Vec<Prediction>, StoreError>;

    /// Record a user's vote. Voting again switches the user's choice.
    async fn cast_vote(
        &self,
        prediction_id: &str,
        user_id: &str,
        choice: VoteChoice,
    ) -> Result<VoteTally, StoreError>;

    /// Add the bookmark if absent, remove it if present. Returns whether the
    /// news item is bookmarked afterwards.
    async fn toggle_bookmark(&self, user_id: &str, news_id: &str) -> Result<bool, StoreError>;
}

/// SQLite-backed store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (or create) the database at `db_path`; `:memory:` opens a private
    /// in-memory database
    pub fn open(db_path: &str) -> Result<Self, StoreError> {
        let conn = if db_path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            // Ensure parent directory exists
            if let Some(parent) = Path::new(db_path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        StoreError::Io(format!("Failed to create database directory: {}", e))
                    })?;
                }
            }
            Connection::open(db_path)?
        };

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;

        info!("[STORE] Opened SQLite store at {}", db_path);
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::open(":memory:")
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS news_items (
                id TEXT PRIMARY KEY,
                source TEXT NOT NULL,
                country TEXT NOT NULL,
                category TEXT NOT NULL,
                published_at INTEGER NOT NULL,
                score INTEGER NOT NULL,
                data JSON NOT NULL,
                stored_at INTEGER DEFAULT (strftime('%s', 'now'))
            );

            CREATE INDEX IF NOT EXISTS idx_news_published
            ON news_items(published_at DESC);

            CREATE TABLE IF NOT EXISTS humor_items (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                published_at INTEGER NOT NULL,
                data JSON NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_humor_published
            ON humor_items(published_at DESC);

            CREATE TABLE IF NOT EXISTS briefs (
                date TEXT PRIMARY KEY,
                data JSON NOT NULL
            );

            CREATE TABLE IF NOT EXISTS reports (
                industry TEXT NOT NULL,
                week_start TEXT NOT NULL,
                data JSON NOT NULL,
                PRIMARY KEY (industry, week_start)
            );

            CREATE TABLE IF NOT EXISTS predictions (
                id TEXT PRIMARY KEY,
                question TEXT NOT NULL,
                option_a TEXT NOT NULL,
                option_b TEXT NOT NULL,
                closes_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS votes (
                prediction_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                choice TEXT NOT NULL,
                voted_at INTEGER DEFAULT (strftime('%s', 'now')),
                PRIMARY KEY (prediction_id, user_id)
            );

            CREATE TABLE IF NOT EXISTS bookmarks (
                user_id TEXT NOT NULL,
                news_id TEXT NOT NULL,
                created_at INTEGER DEFAULT (strftime('%s', 'now')),
                PRIMARY KEY (user_id, news_id)
            );
            "#,
        )?;

        Ok(())
    }
}

fn tally(conn: &Connection, prediction_id: &str) -> Result<VoteTally, StoreError> {
    let (votes_a, votes_b): (i64, i64) = conn.query_row(
        "SELECT
            COALESCE(SUM(CASE WHEN choice = 'a' THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN choice = 'b' THEN 1 ELSE 0 END), 0)
         FROM votes WHERE prediction_id = ?1",
        params![prediction_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    Ok(VoteTally {
        votes_a: votes_a.max(0) as u64,
        votes_b: votes_b.max(0) as u64,
    })
}

fn decode_rows<T: serde::de::DeserializeOwned>(rows: Vec<String>) -> Result<Vec<T>, StoreError> {
    rows.iter()
        .map(|data| serde_json::from_str(data).map_err(StoreError::from))
        .collect()
}

#[async_trait]
impl Store for SqliteStore {
    async fn upsert_news(&self, items: &[NewsItem]) -> Result<usize, StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let mut stored = 0;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO news_items (id, source, country, category, published_at, score, data)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET
                    score = excluded.score,
                    data = json_set(
                        excluded.data,
                        '$.titleTranslated',
                        COALESCE(
                            json_extract(news_items.data, '$.titleTranslated'),
                            json_extract(excluded.data, '$.titleTranslated')
                        )
                    )",
            )?;

            for item in items {
                let data = serde_json::to_string(item)?;
                stored += stmt.execute(params![
                    item.id,
                    item.source,
                    item.country,
                    item.category.as_str(),
                    item.published_at.timestamp(),
                    item.score as i64,
                    data,
                ])?;
            }
        }

        tx.commit()?;
        debug!("[STORE] Upserted {} news items", stored);
        Ok(stored)
    }

    async fn recent_news(&self, limit: usize) -> Result<Vec<NewsItem>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT data FROM news_items ORDER BY published_at DESC, id ASC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        decode_rows(rows)
    }

    async fn get_news(&self, id: &str) -> Result<Option<NewsItem>, StoreError> {
        let conn = self.conn.lock();
        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM news_items WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        data.map(|d| serde_json::from_str(&d).map_err(StoreError::from))
            .transpose()
    }

    async fn save_translations(&self, translations: &[(String, String)]) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "UPDATE news_items SET data = json_set(data, '$.titleTranslated', ?2) WHERE id = ?1",
        )?;

        let mut updated = 0;
        for (id, translated) in translations {
            updated += stmt.execute(params![id, translated])?;
        }
        Ok(updated)
    }

    async fn upsert_humor(&self, items: &[HumorItem]) -> Result<usize, StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let mut stored = 0;

        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO humor_items (id, kind, published_at, data)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for item in items {
                let data = serde_json::to_string(item)?;
                stored += stmt.execute(params![
                    item.id,
                    item.kind.as_str(),
                    item.published_at.timestamp(),
                    data,
                ])?;
            }
        }

        tx.commit()?;
        debug!("[STORE] Upserted {} humor items", stored);
        Ok(stored)
    }

    async fn recent_humor(&self, limit: usize) -> Result<Vec<HumorItem>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT data FROM humor_items ORDER BY published_at DESC, id ASC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        decode_rows(rows)
    }

    async fn save_brief(&self, brief: &DailyBrief) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO briefs (date, data) VALUES (?1, ?2)",
            params![brief.date.to_string(), serde_json::to_string(brief)?],
        )?;
        Ok(())
    }

    async fn get_brief(&self, date: NaiveDate) -> Result<Option<DailyBrief>, StoreError> {
        let conn = self.conn.lock();
        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM briefs WHERE date = ?1",
                params![date.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        data.map(|d| serde_json::from_str(&d).map_err(StoreError::from))
            .transpose()
    }

    async fn save_report(&self, report: &IndustryReport) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO reports (industry, week_start, data) VALUES (?1, ?2, ?3)",
            params![
                report.industry.as_str(),
                report.week_start.to_string(),
                serde_json::to_string(report)?
            ],
        )?;
        Ok(())
    }

    async fn get_report(
        &self,
        industry: Industry,
        week_start: NaiveDate,
    ) -> Result<Option<IndustryReport>, StoreError> {
        let conn = self.conn.lock();
        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM reports WHERE industry = ?1 AND week_start = ?2",
                params![industry.as_str(), week_start.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        data.map(|d| serde_json::from_str(&d).map_err(StoreError::from))
            .transpose()
    }

    async fn seed_predictions(&self, predictions: &[Prediction]) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "INSERT OR IGNORE INTO predictions (id, question, option_a, option_b, closes_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;

        let mut inserted = 0;
        for p in predictions {
            inserted += stmt.execute(params![
                p.id,
                p.question,
                p.option_a,
                p.option_b,
                p.closes_at.timestamp()
            ])?;
        }
        Ok(inserted)
    }

    async fn open_predictions(&self, now: DateTime<Utc>) -> Result<Vec<Prediction>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT p.id, p.question, p.option_a, p.option_b, p.closes_at,
                COALESCE(SUM(CASE WHEN v.choice = 'a' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN v.choice = 'b' THEN 1 ELSE 0 END), 0)
             FROM predictions p
             LEFT JOIN votes v ON v.prediction_id = p.id
             WHERE p.closes_at > ?1
             GROUP BY p.id
             ORDER BY p.closes_at ASC, p.id ASC",
        )?;

        let predictions = stmt
            .query_map(params![now.timestamp()], |row| {
                let closes_at: i64 = row.get(4)?;
                let votes_a: i64 = row.get(5)?;
                let votes_b: i64 = row.get(6)?;
                Ok(Prediction {
                    id: row.get(0)?,
                    question: row.get(1)?,
                    option_a: row.get(2)?,
                    option_b: row.get(3)?,
                    votes_a: votes_a.max(0) as u64,
                    votes_b: votes_b.max(0) as u64,
                    closes_at: DateTime::from_timestamp(closes_at, 0).unwrap_or_default(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(predictions)
    }

    async fn cast_vote(
        &self,
        prediction_id: &str,
        user_id: &str,
        choice: VoteChoice,
    ) -> Result<VoteTally, StoreError> {
        let conn = self.conn.lock();

        let exists: Option<String> = conn
            .query_row(
                "SELECT id FROM predictions WHERE id = ?1",
                params![prediction_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(StoreError::NotFound(format!("prediction {prediction_id}")));
        }

        conn.execute(
            "INSERT INTO votes (prediction_id, user_id, choice) VALUES (?1, ?2, ?3)
             ON CONFLICT(prediction_id, user_id) DO UPDATE SET
                choice = excluded.choice,
                voted_at = strftime('%s', 'now')",
            params![prediction_id, user_id, choice.as_str()],
        )?;

        tally(&conn, prediction_id)
    }

    async fn toggle_bookmark(&self, user_id: &str, news_id: &str) -> Result<bool, StoreError> {
        let conn = self.conn.lock();

        let removed = conn.execute(
            "DELETE FROM bookmarks WHERE user_id = ?1 AND news_id = ?2",
            params![user_id, news_id],
        )?;
        if removed > 0 {
            return Ok(false);
        }

        conn.execute(
            "INSERT INTO bookmarks (user_id, news_id) VALUES (?1, ?2)",
            params![user_id, news_id],
        )?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pulse_core::NewsCategory;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap()
    }

    fn news(id: &str, hours_ago: i64) -> NewsItem {
        NewsItem {
            id: id.to_string(),
            title: format!("Headline {id}"),
            title_translated: None,
            source: "Example".to_string(),
            country: "KR".to_string(),
            category: NewsCategory::Tech,
            published_at: now() - Duration::hours(hours_ago),
            score: 1,
            url: format!("https://example.com/{id}"),
            summary: None,
            tickers: Vec::new(),
        }
    }

    fn prediction(id: &str, closes_in_days: i64) -> Prediction {
        Prediction {
            id: id.to_string(),
            question: "Will it rain?".to_string(),
            option_a: "Yes".to_string(),
            option_b: "No".to_string(),
            votes_a: 0,
            votes_b: 0,
            closes_at: now() + Duration::days(closes_in_days),
        }
    }

    #[tokio::test]
    async fn test_news_round_trip_keeps_translation() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.upsert_news(&[news("a", 2), news("b", 1)]).await.unwrap();
        store
            .save_translations(&[("a".to_string(), "헤드라인 a".to_string())])
            .await
            .unwrap();

        // A later collection cycle must not wipe the translation
        let mut refreshed = news("a", 2);
        refreshed.score = 42;
        store.upsert_news(&[refreshed]).await.unwrap();

        let stored = store.get_news("a").await.unwrap().unwrap();
        assert_eq!(stored.score, 42);
        assert_eq!(stored.title_translated.as_deref(), Some("헤드라인 a"));

        let recent = store.recent_news(10).await.unwrap();
        assert_eq!(recent.iter().map(|n| n.id.as_str()).collect::<Vec<_>>(), vec!["b", "a"]);
        assert!(store.get_news("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_revote_switches_choice() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.seed_predictions(&[prediction("p1", 3)]).await.unwrap();

        let tally = store.cast_vote("p1", "u1", VoteChoice::A).await.unwrap();
        assert_eq!(tally, VoteTally { votes_a: 1, votes_b: 0 });

        store.cast_vote("p1", "u2", VoteChoice::A).await.unwrap();
        let tally = store.cast_vote("p1", "u1", VoteChoice::B).await.unwrap();
        assert_eq!(tally, VoteTally { votes_a: 1, votes_b: 1 });
    }

    #[tokio::test]
    async fn test_vote_on_unknown_prediction() {
        let store = SqliteStore::open_in_memory().unwrap();
        let err = store.cast_vote("nope", "u1", VoteChoice::A).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_open_predictions_excludes_closed() {
        let store = SqliteStore::open_in_memory().unwrap();
        let seeded = store
            .seed_predictions(&[prediction("open", 3), prediction("closed", -1)])
            .await
            .unwrap();
        assert_eq!(seeded, 2);
        assert_eq!(store.seed_predictions(&[prediction("open", 3)]).await.unwrap(), 0);

        store.cast_vote("open", "u1", VoteChoice::B).await.unwrap();
        let open = store.open_predictions(now()).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].votes_b, 1);
    }

    #[tokio::test]
    async fn test_bookmark_toggles() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.toggle_bookmark("u1", "n1").await.unwrap());
        assert!(!store.toggle_bookmark("u1", "n1").await.unwrap());
        assert!(store.toggle_bookmark("u1", "n1").await.unwrap());
    }
}
