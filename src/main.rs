use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use folio::app::AppContext;
use folio::cli::{commands, Cli, Commands};
use folio::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let ctx = AppContext::new(cli.db, config)?;

    match cli.command {
        Commands::Trending { category, pages } => {
            commands::trending(&ctx, category, pages, cli.json).await?;
        }
        Commands::Search { query, pages } => {
            commands::search(&ctx, &query, pages, cli.json).await?;
        }
        Commands::Show { id } => {
            commands::show(&ctx, &id, cli.json).await?;
        }
        Commands::Favorite { id } => {
            commands::toggle_favorite(&ctx, &id).await?;
        }
        Commands::Favorites => {
            commands::list_favorites(&ctx, cli.json).await?;
        }
        Commands::Open { id } => {
            commands::open_book(&ctx, &id).await?;
        }
        Commands::Categories => {
            commands::list_categories(cli.json)?;
        }
    }

    Ok(())
}
