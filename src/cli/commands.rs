use std::sync::Arc;

use url::Url;

use crate::app::{AppContext, EstuaryError, Result};
use crate::domain::{Feed, User};
use crate::scheduler::Scheduler;
use crate::store::Store;

/// Resolve the configured current user to a store row. Commands that act on
/// behalf of a user call this first.
fn require_user(ctx: &AppContext) -> Result<User> {
    let name = ctx.current_user_name()?.ok_or(EstuaryError::NotLoggedIn)?;
    ctx.store
        .get_user_by_name(&name)?
        .ok_or(EstuaryError::UserNotFound(name))
}

pub fn register(ctx: &AppContext, name: &str) -> Result<()> {
    let user = User::new(name.to_string());
    ctx.store.create_user(&user)?;
    ctx.set_current_user(name)?;
    println!("Registered and logged in as {name}");
    Ok(())
}

pub fn login(ctx: &AppContext, name: &str) -> Result<()> {
    ctx.store
        .get_user_by_name(name)?
        .ok_or_else(|| EstuaryError::UserNotFound(name.to_string()))?;
    ctx.set_current_user(name)?;
    println!("Logged in as {name}");
    Ok(())
}

pub fn users(ctx: &AppContext) -> Result<()> {
    let users = ctx.store.list_users()?;
    if users.is_empty() {
        println!("No users");
        return Ok(());
    }

    let current = ctx.current_user_name()?;
    for user in users {
        if current.as_deref() == Some(user.name.as_str()) {
            println!("* {} (current)", user.name);
        } else {
            println!("* {}", user.name);
        }
    }
    Ok(())
}

pub fn reset(ctx: &AppContext) -> Result<()> {
    ctx.store.reset_users()?;
    println!("Database reset");
    Ok(())
}

/// Register a feed for the current user. One fetch-and-parse round trip
/// validates the feed is reachable before anything is stored; its result is
/// discarded. The owner follows the feed implicitly.
pub async fn add_feed(ctx: &AppContext, name: &str, url: &str) -> Result<()> {
    let user = require_user(ctx)?;
    Url::parse(url)?;

    let body = ctx.fetcher.fetch(url).await?;
    crate::parser::parse(&body)?;

    let feed = Feed::new(name.to_string(), url.to_string(), user.id);
    let feed_id = ctx.store.create_feed(&feed)?;
    ctx.store.create_feed_follow(user.id, feed_id)?;

    println!("Added feed: {name} ({url})");
    Ok(())
}

pub fn feeds(ctx: &AppContext) -> Result<()> {
    let feeds = ctx.store.list_feeds()?;
    if feeds.is_empty() {
        println!("No feeds");
        return Ok(());
    }

    for feed in feeds {
        println!("* {}\n  {}", feed.name, feed.url);
    }
    Ok(())
}

pub fn follow(ctx: &AppContext, url: &str) -> Result<()> {
    let user = require_user(ctx)?;
    let feed = ctx
        .store
        .get_feed_by_url(url)?
        .ok_or_else(|| EstuaryError::FeedNotFound(url.to_string()))?;

    ctx.store.create_feed_follow(user.id, feed.id)?;
    println!("{} is now following {}", user.name, feed.name);
    Ok(())
}

pub fn following(ctx: &AppContext) -> Result<()> {
    let user = require_user(ctx)?;
    let follows = ctx.store.list_follows_for_user(user.id)?;

    if follows.is_empty() {
        println!("Not following any feeds");
        return Ok(());
    }
    for follow in follows {
        println!("* {}\n  {}", follow.feed_name, follow.feed_url);
    }
    Ok(())
}

pub fn unfollow(ctx: &AppContext, url: &str) -> Result<()> {
    let user = require_user(ctx)?;
    let deleted = ctx.store.delete_follow_by_url(user.id, url)?;

    if deleted == 0 {
        println!("Not following {url}");
    } else {
        println!("Unfollowed {url}");
    }
    Ok(())
}

pub fn browse(ctx: &AppContext, limit: u32) -> Result<()> {
    require_user(ctx)?;
    let posts = ctx.store.list_posts(limit)?;

    if posts.is_empty() {
        println!("No posts");
        return Ok(());
    }
    for post in posts {
        println!(
            "{} — {}\n  {}",
            post.published_at.format("%Y-%m-%d %H:%M"),
            post.display_title(),
            post.url
        );
        if let Some(description) = &post.description {
            println!("  {description}");
        }
    }
    Ok(())
}

/// `agg <interval>`: run the fetch loop forever. A bad interval is a startup
/// error, reported before the first cycle.
pub async fn agg(ctx: Arc<AppContext>, interval: &str) -> Result<()> {
    let tick = Scheduler::parse_interval(interval)?;
    Scheduler::new(ctx, tick).run().await
}
