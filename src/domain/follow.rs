use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Join row linking a user to a feed. At most one per (user, feed) pair,
/// enforced by the schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedFollow {
    pub id: i64,
    pub user_id: i64,
    pub feed_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A follow joined with the names it connects, for listing.
#[derive(Debug, Clone)]
pub struct FollowSummary {
    pub feed_name: String,
    pub feed_url: String,
    pub user_name: String,
}
