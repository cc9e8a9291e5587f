use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};

use crate::app::{EstuaryError, Result};
use crate::domain::{Feed, FeedFollow, FollowSummary, Post, User};
use crate::store::Store;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        migrations.to_latest(&mut conn)?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| EstuaryError::Store(e.to_string()))
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<DateTime<Utc>>().ok())
    }

    fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            name: row.get(1)?,
            created_at: row
                .get::<_, String>(2)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
        })
    }

    fn map_feed(row: &Row<'_>) -> rusqlite::Result<Feed> {
        Ok(Feed {
            id: row.get(0)?,
            name: row.get(1)?,
            url: row.get(2)?,
            user_id: row.get(3)?,
            last_fetched_at: row
                .get::<_, Option<String>>(4)?
                .and_then(|s| Self::parse_datetime(&s)),
            created_at: row
                .get::<_, String>(5)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
        })
    }

    fn map_post(row: &Row<'_>) -> rusqlite::Result<Post> {
        Ok(Post {
            id: row.get(0)?,
            feed_id: row.get(1)?,
            title: row.get(2)?,
            url: row.get(3)?,
            description: row.get(4)?,
            published_at: row
                .get::<_, String>(5)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
            created_at: row
                .get::<_, String>(6)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
            updated_at: row
                .get::<_, String>(7)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
        })
    }
}

const FEED_COLUMNS: &str = "id, name, url, user_id, last_fetched_at, created_at";
const POST_COLUMNS: &str = "id, feed_id, title, url, description, published_at, created_at, updated_at";

impl Store for SqliteStore {
    fn create_user(&self, user: &User) -> Result<i64> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO users (name, created_at) VALUES (?1, ?2)",
            params![user.name, user.created_at.to_rfc3339()],
        )?;

        Ok(conn.last_insert_rowid())
    }

    fn get_user_by_name(&self, name: &str) -> Result<Option<User>> {
        let conn = self.conn()?;

        let result = conn
            .query_row(
                "SELECT id, name, created_at FROM users WHERE name = ?1",
                params![name],
                Self::map_user,
            )
            .optional()?;

        Ok(result)
    }

    fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare("SELECT id, name, created_at FROM users ORDER BY name")?;
        let users = stmt
            .query_map([], Self::map_user)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(users)
    }

    fn reset_users(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM users", [])?;
        Ok(())
    }

    fn create_feed(&self, feed: &Feed) -> Result<i64> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO feeds (name, url, user_id, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                feed.name,
                feed.url,
                feed.user_id,
                feed.created_at.to_rfc3339()
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    fn get_feed_by_url(&self, url: &str) -> Result<Option<Feed>> {
        let conn = self.conn()?;

        let result = conn
            .query_row(
                &format!("SELECT {FEED_COLUMNS} FROM feeds WHERE url = ?1"),
                params![url],
                Self::map_feed,
            )
            .optional()?;

        Ok(result)
    }

    fn list_feeds(&self) -> Result<Vec<Feed>> {
        let conn = self.conn()?;

        let mut stmt =
            conn.prepare(&format!("SELECT {FEED_COLUMNS} FROM feeds ORDER BY name, url"))?;
        let feeds = stmt
            .query_map([], Self::map_feed)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(feeds)
    }

    fn next_feed_to_fetch(&self) -> Result<Option<Feed>> {
        let conn = self.conn()?;

        // RFC 3339 UTC text compares chronologically; NULL (never fetched)
        // sorts ahead of every timestamp.
        let result = conn
            .query_row(
                &format!(
                    "SELECT {FEED_COLUMNS} FROM feeds
                     ORDER BY last_fetched_at IS NOT NULL, last_fetched_at, id
                     LIMIT 1"
                ),
                [],
                Self::map_feed,
            )
            .optional()?;

        Ok(result)
    }

    fn mark_feed_fetched(&self, feed_id: i64, fetched_at: DateTime<Utc>) -> Result<()> {
        let conn = self.conn()?;

        let updated = conn.execute(
            "UPDATE feeds SET last_fetched_at = ?1 WHERE id = ?2",
            params![fetched_at.to_rfc3339(), feed_id],
        )?;

        if updated == 0 {
            return Err(EstuaryError::FeedNotFound(format!("id {feed_id}")));
        }
        Ok(())
    }

    fn create_feed_follow(&self, user_id: i64, feed_id: i64) -> Result<FeedFollow> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO feed_follows (user_id, feed_id, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id, feed_id) DO NOTHING",
            params![user_id, feed_id, Utc::now().to_rfc3339()],
        )?;

        let follow = conn.query_row(
            "SELECT id, user_id, feed_id, created_at FROM feed_follows
             WHERE user_id = ?1 AND feed_id = ?2",
            params![user_id, feed_id],
            |row| {
                Ok(FeedFollow {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    feed_id: row.get(2)?,
                    created_at: row
                        .get::<_, String>(3)
                        .ok()
                        .and_then(|s| Self::parse_datetime(&s))
                        .unwrap_or_else(Utc::now),
                })
            },
        )?;

        Ok(follow)
    }

    fn list_follows_for_user(&self, user_id: i64) -> Result<Vec<FollowSummary>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT feeds.name, feeds.url, users.name
             FROM feed_follows
             INNER JOIN feeds ON feeds.id = feed_follows.feed_id
             INNER JOIN users ON users.id = feed_follows.user_id
             WHERE feed_follows.user_id = ?1
             ORDER BY feeds.name",
        )?;

        let follows = stmt
            .query_map(params![user_id], |row| {
                Ok(FollowSummary {
                    feed_name: row.get(0)?,
                    feed_url: row.get(1)?,
                    user_name: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(follows)
    }

    fn delete_follow_by_url(&self, user_id: i64, url: &str) -> Result<usize> {
        let conn = self.conn()?;

        let deleted = conn.execute(
            "DELETE FROM feed_follows
             WHERE user_id = ?1
               AND feed_id IN (SELECT id FROM feeds WHERE url = ?2)",
            params![user_id, url],
        )?;

        Ok(deleted)
    }

    fn create_post(&self, post: &Post) -> Result<i64> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO posts (feed_id, title, url, description, published_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                post.feed_id,
                post.title,
                post.url,
                post.description,
                post.published_at.to_rfc3339(),
                post.created_at.to_rfc3339(),
                post.updated_at.to_rfc3339()
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    fn list_posts(&self, limit: u32) -> Result<Vec<Post>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY published_at DESC LIMIT ?1"
        ))?;
        let posts = stmt
            .query_map(params![limit], Self::map_post)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(posts)
    }
}
