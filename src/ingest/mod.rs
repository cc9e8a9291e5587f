use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::app::EstuaryError;
use crate::domain::Post;
use crate::parser::RawItem;
use crate::store::Store;

/// Outcome of one best-effort ingestion batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Posts written to the store.
    pub written: usize,
    /// Items whose URL was already stored.
    pub duplicates: usize,
    /// Items dropped: unparseable pub date or a store write failure.
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Ingestor;

impl Ingestor {
    pub fn new() -> Self {
        Self
    }

    /// Converts `items` into posts for `feed_id`. Each item is handled
    /// independently; a bad date or rejected write drops that item only.
    pub fn ingest(&self, store: &dyn Store, feed_id: i64, items: &[RawItem]) -> IngestReport {
        let mut report = IngestReport::default();

        for item in items {
            let published_at = match parse_pub_date(&item.pub_date) {
                Ok(at) => at,
                Err(e) => {
                    warn!(title = %item.title, pub_date = %item.pub_date, "skipping item: {e}");
                    report.failed += 1;
                    continue;
                }
            };

            let description = if item.description.is_empty() {
                None
            } else {
                Some(item.description.clone())
            };
            let post = Post::new(
                feed_id,
                item.title.clone(),
                item.link.clone(),
                description,
                published_at,
            );

            match store.create_post(&post) {
                Ok(_) => report.written += 1,
                Err(e) if is_unique_violation(&e) => {
                    debug!(url = %post.url, "post already stored");
                    report.duplicates += 1;
                }
                Err(e) => {
                    warn!(url = %post.url, "failed to store post: {e}");
                    report.failed += 1;
                }
            }
        }

        report
    }
}

/// Feeds publish `pubDate` in the RFC 1123 format, e.g.
/// `Mon, 02 Jan 2006 15:04:05 MST`; RFC 2822 parsing covers it, obsolete
/// zone names included.
fn parse_pub_date(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc2822(raw).map(|dt| dt.with_timezone(&Utc))
}

fn is_unique_violation(err: &EstuaryError) -> bool {
    matches!(
        err,
        EstuaryError::Database(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
