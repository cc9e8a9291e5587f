pub mod sqlite;

use chrono::{DateTime, Utc};

use crate::app::Result;
use crate::domain::{Feed, FeedFollow, FollowSummary, Post, User};

pub use sqlite::SqliteStore;

pub trait Store {
    // User operations
    fn create_user(&self, user: &User) -> Result<i64>;
    fn get_user_by_name(&self, name: &str) -> Result<Option<User>>;
    fn list_users(&self) -> Result<Vec<User>>;
    fn reset_users(&self) -> Result<()>;

    // Feed operations
    fn create_feed(&self, feed: &Feed) -> Result<i64>;
    fn get_feed_by_url(&self, url: &str) -> Result<Option<Feed>>;
    fn list_feeds(&self) -> Result<Vec<Feed>>;
    /// The single feed with the earliest `last_fetched_at`; never-fetched
    /// feeds sort first.
    fn next_feed_to_fetch(&self) -> Result<Option<Feed>>;
    fn mark_feed_fetched(&self, feed_id: i64, fetched_at: DateTime<Utc>) -> Result<()>;

    // Follow operations
    fn create_feed_follow(&self, user_id: i64, feed_id: i64) -> Result<FeedFollow>;
    fn list_follows_for_user(&self, user_id: i64) -> Result<Vec<FollowSummary>>;
    /// Removes the given user's follow of the feed at `url`. Returns the
    /// number of rows deleted.
    fn delete_follow_by_url(&self, user_id: i64, url: &str) -> Result<usize>;

    // Post operations
    fn create_post(&self, post: &Post) -> Result<i64>;
    fn list_posts(&self, limit: u32) -> Result<Vec<Post>>;
}
