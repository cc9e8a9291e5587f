use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feed {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub user_id: i64,
    /// Stamped by the scheduler when the feed is claimed for a fetch,
    /// before any network I/O. NULL until the first claim.
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Feed {
    pub fn new(name: String, url: String, user_id: i64) -> Self {
        Self {
            id: 0,
            name,
            url,
            user_id,
            last_fetched_at: None,
            created_at: Utc::now(),
        }
    }
}
