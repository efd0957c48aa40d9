//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use penny_core::PrivacyMode;

/// Penny - Budget advice from your own records
#[derive(Parser)]
#[command(name = "penny")]
#[command(about = "Monthly budget advisor for the Penny finance dashboard", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "penny.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set PENNY_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    /// Advisor config file (defaults to ~/.local/share/penny/config/advisor.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Load a demo month of categories, budgets, transactions, bills and goals
    Seed {
        /// User to seed data for
        #[arg(short, long)]
        user: String,

        /// Month to seed (1-12, defaults to the current month)
        #[arg(short, long)]
        month: Option<u32>,

        /// Year to seed (defaults to the current year)
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Get spending advice for a month
    ///
    /// Uses the hosted model when PENNY_MODEL_TOKEN is set, otherwise the
    /// built-in heuristic advisor.
    Advise {
        /// User to advise
        #[arg(short, long)]
        user: String,

        /// Month (1-12, defaults to the current month)
        #[arg(short, long)]
        month: Option<u32>,

        /// Year (defaults to the current year)
        #[arg(short, long)]
        year: Option<i32>,

        /// Question to ask the advisor
        #[arg(short, long)]
        question: Option<String>,

        /// Privacy mode: standard or strict
        #[arg(long, default_value = "standard")]
        privacy: PrivacyMode,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Show the resolved advisor configuration
    Config,
}
