use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use estuary::app::AppContext;
use estuary::cli::{commands, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let ctx = Arc::new(AppContext::new(cli.db.clone())?);

    match cli.command {
        Commands::Register { name } => {
            commands::register(&ctx, &name)?;
        }
        Commands::Login { name } => {
            commands::login(&ctx, &name)?;
        }
        Commands::Users => {
            commands::users(&ctx)?;
        }
        Commands::Reset => {
            commands::reset(&ctx)?;
        }
        Commands::Agg { interval } => {
            commands::agg(ctx.clone(), &interval).await?;
        }
        Commands::Addfeed { name, url } => {
            commands::add_feed(&ctx, &name, &url).await?;
        }
        Commands::Feeds => {
            commands::feeds(&ctx)?;
        }
        Commands::Follow { url } => {
            commands::follow(&ctx, &url)?;
        }
        Commands::Following => {
            commands::following(&ctx)?;
        }
        Commands::Unfollow { url } => {
            commands::unfollow(&ctx, &url)?;
        }
        Commands::Browse { limit } => {
            commands::browse(&ctx, limit)?;
        }
    }

    Ok(())
}
