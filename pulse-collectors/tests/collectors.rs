use std::time::Duration;

use httpmock::Method::GET;
use httpmock::MockServer;
use rust_decimal::Decimal;

use pulse_collectors::{
    normalize_all, CollectError, Collector, CollectorSet, CryptoCollector, FearGreedCollector,
    ForexCollector, GiphyCollector, HackerNewsCollector, RedditCollector, RssCollector, RssFeed,
    XkcdCollector,
};
use pulse_core::{HumorKind, NewsCategory};

const UA: &str = "PulseTest/1.0";

#[tokio::test]
async fn test_rss_feed_is_normalized_into_news() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/world.xml");
            then.status(200)
                .header("content-type", "application/rss+xml")
                .body(include_str!("fixtures/world_feed.xml"));
        })
        .await;

    let collector = RssCollector::with_feeds(
        "rss",
        UA,
        vec![RssFeed::news(
            "Example World",
            &server.url("/world.xml"),
            "gb",
            NewsCategory::International,
        )],
    );

    let records = collector.collect().await.unwrap();
    mock.assert_async().await;
    assert_eq!(records.len(), 3);

    let batch = normalize_all(records);
    assert_eq!(batch.news.len(), 2);
    assert_eq!(batch.rejected, 1);

    let summit = &batch.news[0];
    assert_eq!(summit.title, "Leaders meet for climate summit");
    assert_eq!(summit.country, "GB");
    assert_eq!(summit.category, NewsCategory::International);
    assert_eq!(
        summit.summary.as_deref(),
        Some("Delegates from 40 countries & observers.")
    );

    // No pubDate: the date comes from the URL
    assert_eq!(batch.news[1].published_at.to_rfc3339(), "2026-01-04T12:00:00+00:00");
}

#[tokio::test]
async fn test_atom_satire_feed_drops_items_without_media() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/satire.xml");
            then.status(200).body(include_str!("fixtures/satire_feed.xml"));
        })
        .await;

    let collector = RssCollector::with_feeds(
        "satire",
        UA,
        vec![RssFeed::humor("Example Satire", &server.url("/satire.xml"), HumorKind::Satire)],
    );

    let batch = normalize_all(collector.collect().await.unwrap());
    assert_eq!(batch.humor.len(), 1);
    assert_eq!(batch.humor[0].media_url, "https://img.satire.example.com/tos.jpg");
    assert_eq!(batch.humor[0].kind, HumorKind::Satire);
}

#[tokio::test]
async fn test_rss_reports_error_only_when_every_feed_fails() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/ok.xml");
            then.status(200).body(include_str!("fixtures/world_feed.xml"));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/down.xml");
            then.status(503);
        })
        .await;

    let partial = RssCollector::with_feeds(
        "rss",
        UA,
        vec![
            RssFeed::news("Up", &server.url("/ok.xml"), "US", NewsCategory::Tech),
            RssFeed::news("Down", &server.url("/down.xml"), "US", NewsCategory::Tech),
        ],
    );
    assert_eq!(partial.collect().await.unwrap().len(), 3);

    let dead = RssCollector::with_feeds(
        "rss",
        UA,
        vec![RssFeed::news("Down", &server.url("/down.xml"), "US", NewsCategory::Tech)],
    );
    assert!(matches!(
        dead.collect().await,
        Err(CollectError::ApiError { status: 503, .. })
    ));
}

#[tokio::test]
async fn test_hacker_news_uses_permalink_for_text_posts() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/topstories.json");
            then.status(200).body("[101, 102, 103]");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/item/101.json");
            then.status(200).body(
                r#"{"id":101,"type":"story","title":"Show HN: A tiny database","url":"https://db.example.com","score":250,"time":1767596400}"#,
            );
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/item/102.json");
            then.status(200)
                .body(r#"{"id":102,"type":"story","title":"Ask HN: Favourite editor?","score":80,"time":1767592800}"#);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/item/103.json");
            then.status(200).body("null");
        })
        .await;

    let collector = HackerNewsCollector::new(UA).with_base_url(server.base_url());
    let batch = normalize_all(collector.collect().await.unwrap());

    assert_eq!(batch.news.len(), 2);
    assert_eq!(batch.news[0].score, 250);
    assert_eq!(batch.news[0].category, NewsCategory::Tech);
    assert_eq!(batch.news[1].url, "https://news.ycombinator.com/item?id=102");
}

#[tokio::test]
async fn test_reddit_humor_skips_nsfw_and_text_posts() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/r/memes/top.json").query_param("t", "day");
            then.status(200).body(
                r#"{"data":{"children":[
                    {"data":{"id":"a1","title":"Monday again","url":"https://i.redd.it/a1.png","permalink":"/r/memes/comments/a1/","score":1200,"created_utc":1767596400.0,"post_hint":"image"}},
                    {"data":{"id":"a2","title":"Not for work","url":"https://i.redd.it/a2.png","score":900,"created_utc":1767596400.0,"over_18":true}},
                    {"data":{"id":"a3","title":"Discussion thread","url":"https://www.reddit.com/r/memes/comments/a3/","permalink":"/r/memes/comments/a3/","is_self":true,"score":10,"created_utc":1767596400.0}}
                ]}}"#,
            );
        })
        .await;

    let collector = RedditCollector::with_subreddits(
        "reddit-humor",
        UA,
        vec![pulse_collectors::Subreddit::humor("memes", HumorKind::Meme)],
    )
    .with_base_url(server.base_url());

    let records = collector.collect().await.unwrap();
    assert_eq!(records.len(), 2);

    let batch = normalize_all(records);
    assert_eq!(batch.humor.len(), 1);
    assert_eq!(batch.humor[0].upvotes, 1200);
    assert_eq!(batch.humor[0].source, "r/memes");
}

#[tokio::test]
async fn test_crypto_quotes_keep_sign_consistency() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/coins/markets")
                .query_param("vs_currency", "usd");
            then.status(200).body(
                r#"[
                    {"id":"bitcoin","symbol":"btc","name":"Bitcoin","current_price":97000.5,"price_change_24h":-1250.25,"price_change_percentage_24h":-1.27,"last_updated":"2026-01-05T08:59:00.000Z"},
                    {"id":"ethereum","symbol":"eth","name":"Ethereum","current_price":null,"price_change_24h":null,"price_change_percentage_24h":null,"last_updated":null}
                ]"#,
            );
        })
        .await;

    let collector = CryptoCollector::new(UA).with_base_url(server.base_url());
    let batch = normalize_all(collector.collect().await.unwrap());
    mock.assert_async().await;

    assert_eq!(batch.quotes.len(), 2);
    let btc = &batch.quotes[0];
    assert_eq!(btc.symbol, "BTC");
    assert_eq!(btc.name_localized.as_deref(), Some("비트코인"));
    assert!(btc.change < Decimal::ZERO);
    assert!(btc.change_percent < Decimal::ZERO);

    let eth = &batch.quotes[1];
    assert_eq!(eth.price, Decimal::ZERO);
    assert!(eth.is_sign_consistent());
}

#[tokio::test]
async fn test_forex_derives_change_from_last_two_fixings() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).query_param("from", "USD");
            then.status(200).body(
                r#"{"amount":1.0,"base":"USD","start_date":"2025-12-29","end_date":"2026-01-02","rates":{
                    "2025-12-31":{"KRW":1440.0,"JPY":156.0,"EUR":0.95,"CNY":7.3},
                    "2026-01-02":{"KRW":1450.5,"JPY":155.0,"EUR":0.95,"CNY":7.3}
                }}"#,
            );
        })
        .await;

    let collector = ForexCollector::new(UA).with_base_url(server.base_url());
    let batch = normalize_all(collector.collect().await.unwrap());

    let krw = batch.quotes.iter().find(|q| q.symbol == "USD/KRW").unwrap();
    assert_eq!(krw.change, Decimal::new(105, 1));
    assert!(krw.change_percent > Decimal::ZERO);

    let jpy = batch.quotes.iter().find(|q| q.symbol == "USD/JPY").unwrap();
    assert!(jpy.change < Decimal::ZERO);

    let eur = batch.quotes.iter().find(|q| q.symbol == "USD/EUR").unwrap();
    assert_eq!(eur.change, Decimal::ZERO);
    assert_eq!(eur.change_percent, Decimal::ZERO);
}

#[tokio::test]
async fn test_fear_greed_reading() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/fng/");
            then.status(200).body(
                r#"{"name":"Fear and Greed Index","data":[{"value":"72","value_classification":"Greed","timestamp":"1767571200"}]}"#,
            );
        })
        .await;

    let collector = FearGreedCollector::new(UA).with_base_url(server.base_url());
    let batch = normalize_all(collector.collect().await.unwrap());
    let reading = batch.sentiment.unwrap();
    assert_eq!(reading.value, 72);
    assert_eq!(reading.classification, "Greed");
}

#[tokio::test]
async fn test_xkcd_fetches_latest_and_back_issues() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/info.0.json");
            then.status(200).body(
                r#"{"num":3,"safe_title":"Three","img":"https://imgs.xkcd.com/comics/three.png","year":"2026","month":"1","day":"5"}"#,
            );
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/2/info.0.json");
            then.status(200).body(
                r#"{"num":2,"safe_title":"Two","img":"https://imgs.xkcd.com/comics/two.png","year":"2026","month":"1","day":"2"}"#,
            );
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/1/info.0.json");
            then.status(404);
        })
        .await;

    let collector = XkcdCollector::new(UA).with_base_url(server.base_url());
    let batch = normalize_all(collector.collect().await.unwrap());

    assert_eq!(batch.humor.len(), 2);
    assert!(batch.humor.iter().all(|h| h.kind == HumorKind::Comic));
    assert_eq!(batch.humor[0].title, "Three");
}

#[tokio::test]
async fn test_giphy_without_key_reports_missing_credentials() {
    let collector = GiphyCollector::new(UA, None);
    assert!(matches!(
        collector.collect().await,
        Err(CollectError::MissingCredentials("GIPHY_API_KEY"))
    ));
}

#[tokio::test]
async fn test_giphy_trending() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/gifs/trending")
                .query_param("api_key", "test-key");
            then.status(200).body(
                r#"{"data":[
                    {"id":"g1","title":"Happy Dance GIF","trending_datetime":"2026-01-05 06:00:00","import_datetime":"2020-01-01 00:00:00","images":{"downsized":{"url":"https://media.giphy.com/g1.gif"}}},
                    {"id":"g2","title":"Old but gold","trending_datetime":"0000-00-00 00:00:00","import_datetime":"2019-05-01 10:00:00","images":{"original":{"url":"https://media.giphy.com/g2.gif"}}},
                    {"id":"g3","title":"","trending_datetime":"2026-01-05 06:00:00","images":{"original":{"url":"https://media.giphy.com/g3.gif"}}}
                ]}"#,
            );
        })
        .await;

    let collector =
        GiphyCollector::new(UA, Some("test-key".to_string())).with_base_url(server.base_url());
    let batch = normalize_all(collector.collect().await.unwrap());

    assert_eq!(batch.humor.len(), 2);
    assert_eq!(batch.humor[1].published_at.to_rfc3339(), "2019-05-01T10:00:00+00:00");
}

#[tokio::test]
async fn test_collector_set_survives_provider_outage() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/coins/markets");
            then.status(429);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/fng/");
            then.status(200).body(
                r#"{"data":[{"value":"40","value_classification":"Fear","timestamp":"1767571200"}]}"#,
            );
        })
        .await;

    let set = CollectorSet::new(Duration::from_secs(5))
        .with(CryptoCollector::new(UA).with_base_url(server.base_url()))
        .with(FearGreedCollector::new(UA).with_base_url(server.base_url()));

    let records = set.collect_all().await;
    assert_eq!(records.len(), 1);

    let direct = CryptoCollector::new(UA).with_base_url(server.base_url());
    assert!(matches!(direct.collect().await, Err(CollectError::RateLimited)));
}
