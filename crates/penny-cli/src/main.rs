//! Penny CLI - Budget advice from your own records
//!
//! Usage:
//!   penny init                      Initialize database
//!   penny seed --user alice         Load a demo month of data
//!   penny advise --user alice       Get spending advice for the current month
//!   penny config                    Show the resolved advisor configuration

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Seed { user, month, year } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_seed(&db, &user, month, year)
        }
        Commands::Advise {
            user,
            month,
            year,
            question,
            privacy,
            json,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let config = commands::load_config(cli.config.as_deref())?;
            let request = commands::build_request(month, year, question.as_deref(), privacy);
            commands::cmd_advise(db, &config, &user, request, json).await
        }
        Commands::Config => commands::cmd_config(cli.config.as_deref()),
    }
}
