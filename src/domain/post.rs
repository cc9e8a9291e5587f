use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub feed_id: i64,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub published_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(
        feed_id: i64,
        title: String,
        url: String,
        description: Option<String>,
        published_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            feed_id,
            title,
            url,
            description,
            published_at,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_title_with_title() {
        let post = Post::new(1, "My Article".into(), "https://example.com/1".into(), None, Utc::now());
        assert_eq!(post.display_title(), "My Article");
    }

    #[test]
    fn test_display_title_without_title() {
        let post = Post::new(1, String::new(), "https://example.com/1".into(), None, Utc::now());
        assert_eq!(post.display_title(), "(Untitled)");
    }
}
