//! Periodic feed-fetch loop.
//!
//! One feed per tick: the least-recently-fetched feed is claimed by stamping
//! `last_fetched_at` first, then fetched, parsed, and ingested. The interval
//! is the only backpressure; a cycle that outruns it delays the next tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::interval;
use tracing::{error, info};

use crate::app::{AppContext, EstuaryError, Result};
use crate::domain::Feed;
use crate::ingest::IngestReport;
use crate::store::Store;

pub struct Scheduler {
    ctx: Arc<AppContext>,
    tick: Duration,
    running: Arc<AtomicBool>,
}

/// What one fetch cycle did, for logging and tests.
#[derive(Debug)]
pub struct CycleOutcome {
    pub feed: Feed,
    pub report: IngestReport,
}

impl Scheduler {
    pub fn new(ctx: Arc<AppContext>, tick: Duration) -> Self {
        Self {
            ctx,
            tick,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Parse an interval like `30s`, `2m`, `1h`, `1d`, `90` (seconds), or a
    /// compound form like `1m30s`. Zero or unparseable input is a
    /// configuration error.
    pub fn parse_interval(s: &str) -> Result<Duration> {
        let s = s.trim().to_lowercase();
        if s.is_empty() {
            return Err(EstuaryError::InvalidInterval("empty interval".into()));
        }

        // Bare number means seconds.
        if let Ok(secs) = s.parse::<u64>() {
            return if secs == 0 {
                Err(EstuaryError::InvalidInterval(format!(
                    "{s}: interval must be positive"
                )))
            } else {
                Ok(Duration::from_secs(secs))
            };
        }

        let mut total_secs: u64 = 0;
        let mut digits = String::new();
        for c in s.chars() {
            if c.is_ascii_digit() {
                digits.push(c);
                continue;
            }
            let unit_secs = match c {
                's' => 1,
                'm' => 60,
                'h' => 3600,
                'd' => 86400,
                _ => {
                    return Err(EstuaryError::InvalidInterval(format!(
                        "{s}: unknown unit '{c}'. Use forms like '30s', '2m', '1m30s'"
                    )))
                }
            };
            let value: u64 = digits
                .parse()
                .map_err(|_| EstuaryError::InvalidInterval(format!("{s}: missing number before '{c}'")))?;
            total_secs += value * unit_secs;
            digits.clear();
        }

        if !digits.is_empty() {
            return Err(EstuaryError::InvalidInterval(format!(
                "{s}: trailing number without a unit"
            )));
        }
        if total_secs == 0 {
            return Err(EstuaryError::InvalidInterval(format!(
                "{s}: interval must be positive"
            )));
        }
        Ok(Duration::from_secs(total_secs))
    }

    /// Format an interval for display, e.g. 90s -> "1m30s".
    pub fn format_interval(tick: Duration) -> String {
        let mut secs = tick.as_secs();
        let mut out = String::new();
        for (unit_secs, unit) in [(86400, 'd'), (3600, 'h'), (60, 'm'), (1, 's')] {
            if secs >= unit_secs {
                out.push_str(&format!("{}{}", secs / unit_secs, unit));
                secs %= unit_secs;
            }
        }
        if out.is_empty() {
            out.push_str("0s");
        }
        out
    }

    /// Run one cycle immediately, then one per tick, until [`stop`](Self::stop).
    /// Cycle errors are logged and never break the loop.
    pub async fn run(&self) -> Result<()> {
        info!(
            "Collecting feeds every {}",
            Self::format_interval(self.tick)
        );

        let mut timer = interval(self.tick);
        timer.tick().await; // consume the immediate tick

        self.run_cycle_logged().await;

        while self.running.load(Ordering::SeqCst) {
            timer.tick().await;

            if !self.running.load(Ordering::SeqCst) {
                break;
            }
            self.run_cycle_logged().await;
        }

        Ok(())
    }

    /// Signal the loop to exit after the current cycle.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    async fn run_cycle_logged(&self) {
        match self.run_cycle().await {
            Ok(outcome) => {
                info!(
                    feed = %outcome.feed.name,
                    written = outcome.report.written,
                    duplicates = outcome.report.duplicates,
                    failed = outcome.report.failed,
                    "fetch cycle complete"
                );
            }
            Err(e) => error!("fetch cycle failed: {e}"),
        }
    }

    /// One fetch cycle: select the least-recently-fetched feed, claim it by
    /// stamping `last_fetched_at` before any network I/O, then fetch, parse,
    /// and ingest.
    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        let store = self.ctx.store.as_ref();

        let feed = store.next_feed_to_fetch()?.ok_or(EstuaryError::NoFeeds)?;
        store.mark_feed_fetched(feed.id, Utc::now())?;

        let body = self.ctx.fetcher.fetch(&feed.url).await?;
        let channel = crate::parser::parse(&body)?;
        let report = self.ctx.ingestor.ingest(store, feed.id, &channel.items);

        Ok(CycleOutcome { feed, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Feed, User};
    use crate::fetcher::Fetcher;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::AtomicUsize;

    const FEED_XML: &str = r#"<rss version="2.0"><channel>
        <title>Feed</title>
        <item>
          <title>One</title>
          <link>https://example.com/one</link>
          <description>first</description>
          <pubDate>Mon, 02 Jan 2006 15:04:05 MST</pubDate>
        </item>
        <item>
          <title>Two</title>
          <link>https://example.com/two</link>
          <description>second</description>
          <pubDate>not-a-date</pubDate>
        </item>
    </channel></rss>"#;

    /// Serves a canned body for every URL and records the URLs requested.
    struct StubFetcher {
        body: Vec<u8>,
        requests: std::sync::Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl StubFetcher {
        fn new(body: &str) -> Self {
            Self {
                body: body.as_bytes().to_vec(),
                requests: std::sync::Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Fetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(url.to_string());
            Ok(self.body.clone())
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl Fetcher for FailingFetcher {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
            Err(EstuaryError::FeedParse("connection refused".into()))
        }
    }

    fn context_with_feeds(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        urls: &[&str],
    ) -> Arc<AppContext> {
        let ctx = Arc::new(AppContext::in_memory(fetcher).unwrap());
        let user_id = ctx.store.create_user(&User::new("alice".into())).unwrap();
        for (i, url) in urls.iter().enumerate() {
            ctx.store
                .create_feed(&Feed::new(format!("feed-{i}"), url.to_string(), user_id))
                .unwrap();
        }
        ctx
    }

    #[test]
    fn test_parse_interval() {
        assert_eq!(
            Scheduler::parse_interval("30s").unwrap(),
            Duration::from_secs(30)
        );
        assert_eq!(
            Scheduler::parse_interval("2m").unwrap(),
            Duration::from_secs(120)
        );
        assert_eq!(
            Scheduler::parse_interval("1h").unwrap(),
            Duration::from_secs(3600)
        );
        assert_eq!(
            Scheduler::parse_interval("1d").unwrap(),
            Duration::from_secs(86400)
        );
        assert_eq!(
            Scheduler::parse_interval("1m30s").unwrap(),
            Duration::from_secs(90)
        );
        assert_eq!(
            Scheduler::parse_interval("90").unwrap(),
            Duration::from_secs(90)
        );
        assert!(Scheduler::parse_interval("0s").is_err());
        assert!(Scheduler::parse_interval("").is_err());
        assert!(Scheduler::parse_interval("soon").is_err());
        assert!(Scheduler::parse_interval("1x").is_err());
        assert!(Scheduler::parse_interval("30s5").is_err());
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(Scheduler::format_interval(Duration::from_secs(90)), "1m30s");
        assert_eq!(Scheduler::format_interval(Duration::from_secs(3600)), "1h");
        assert_eq!(
            Scheduler::format_interval(Duration::from_secs(86400 + 60)),
            "1d1m"
        );
        assert_eq!(Scheduler::format_interval(Duration::from_secs(5)), "5s");
    }

    #[tokio::test]
    async fn test_cycle_without_feeds_is_selection_error() {
        let ctx = Arc::new(AppContext::in_memory(Arc::new(StubFetcher::new(FEED_XML))).unwrap());
        let scheduler = Scheduler::new(ctx, Duration::from_secs(30));

        assert!(matches!(
            scheduler.run_cycle().await,
            Err(EstuaryError::NoFeeds)
        ));
    }

    #[tokio::test]
    async fn test_cycle_fetches_and_ingests() {
        let ctx = context_with_feeds(Arc::new(StubFetcher::new(FEED_XML)), &["https://a.example/rss"]);
        let scheduler = Scheduler::new(ctx.clone(), Duration::from_secs(30));

        let outcome = scheduler.run_cycle().await.unwrap();
        assert_eq!(outcome.feed.url, "https://a.example/rss");
        assert_eq!(outcome.report.written, 1);
        assert_eq!(outcome.report.failed, 1);

        let posts = ctx.store.list_posts(10).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].url, "https://example.com/one");
    }

    #[tokio::test]
    async fn test_every_feed_selected_within_f_cycles() {
        let fetcher = Arc::new(StubFetcher::new(FEED_XML));
        let urls = [
            "https://a.example/rss",
            "https://b.example/rss",
            "https://c.example/rss",
        ];
        let ctx = context_with_feeds(fetcher.clone(), &urls);
        let scheduler = Scheduler::new(ctx, Duration::from_secs(30));

        for _ in 0..urls.len() {
            scheduler.run_cycle().await.unwrap();
        }

        let requested: HashSet<String> = fetcher.requests.lock().unwrap().iter().cloned().collect();
        assert_eq!(requested.len(), urls.len());
    }

    #[tokio::test]
    async fn test_failed_fetch_still_claims_feed() {
        let ctx = context_with_feeds(Arc::new(FailingFetcher), &["https://a.example/rss"]);
        let scheduler = Scheduler::new(ctx.clone(), Duration::from_secs(30));

        assert!(scheduler.run_cycle().await.is_err());

        let feed = ctx
            .store
            .get_feed_by_url("https://a.example/rss")
            .unwrap()
            .unwrap();
        assert!(feed.last_fetched_at.is_some());
    }

    #[tokio::test]
    async fn test_claim_timestamps_are_non_decreasing() {
        let ctx = context_with_feeds(Arc::new(StubFetcher::new(FEED_XML)), &["https://a.example/rss"]);
        let scheduler = Scheduler::new(ctx.clone(), Duration::from_secs(30));

        scheduler.run_cycle().await.unwrap();
        let first = ctx
            .store
            .get_feed_by_url("https://a.example/rss")
            .unwrap()
            .unwrap()
            .last_fetched_at
            .unwrap();

        scheduler.run_cycle().await.unwrap();
        let second = ctx
            .store
            .get_feed_by_url("https://a.example/rss")
            .unwrap()
            .unwrap()
            .last_fetched_at
            .unwrap();

        assert!(second >= first);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_cycles_on_the_tick() {
        let fetcher = Arc::new(StubFetcher::new(FEED_XML));
        let ctx = context_with_feeds(fetcher.clone(), &["https://a.example/rss"]);
        let scheduler = Arc::new(Scheduler::new(ctx, Duration::from_secs(30)));

        let handle = tokio::spawn({
            let scheduler = scheduler.clone();
            async move { scheduler.run().await }
        });

        // Immediate cycle at t=0.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

        // Next cycle on the 30s tick.
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);

        scheduler.stop();
        handle.abort();
    }
}
