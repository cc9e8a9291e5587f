pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "estuary")]
#[command(about = "A multi-user RSS feed aggregator", long_about = None)]
pub struct Cli {
    /// Path to the SQLite database (defaults to the data directory)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new user and log in as them
    Register {
        /// Name of the user to create
        name: String,
    },
    /// Log in as an existing user
    Login {
        /// Name of the user
        name: String,
    },
    /// List registered users
    Users,
    /// Delete all users, and with them every feed, follow, and post
    Reset,
    /// Run the periodic feed-fetch loop
    Agg {
        /// Tick interval, e.g. "30s", "2m", "1m30s"
        interval: String,
    },
    /// Register a feed and follow it
    Addfeed {
        /// Display name for the feed
        name: String,
        /// URL of the RSS document
        url: String,
    },
    /// List all registered feeds
    Feeds,
    /// Follow an already-registered feed
    Follow {
        /// URL of the feed to follow
        url: String,
    },
    /// List the feeds you follow
    Following,
    /// Stop following a feed
    Unfollow {
        /// URL of the feed to unfollow
        url: String,
    },
    /// Show the most recent posts
    Browse {
        /// Maximum number of posts to show
        #[arg(default_value_t = 2)]
        limit: u32,
    },
}
