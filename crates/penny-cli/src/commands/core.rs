//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `load_config` - Shared utility to resolve the advisor configuration
//! - `cmd_init` - Initialize the database
//! - `cmd_config` - Show the resolved configuration

use std::path::Path;

use anyhow::{Context, Result};
use penny_core::config::{default_config_path, MODEL_HOST_ENV, MODEL_ID_ENV, MODEL_TOKEN_ENV};
use penny_core::db::DB_KEY_ENV;
use penny_core::{AdvisorConfig, Database};

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path is not valid UTF-8")?;
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

/// Resolve defaults, the config file, and environment overrides
pub fn load_config(config_path: Option<&Path>) -> Result<AdvisorConfig> {
    AdvisorConfig::resolve(config_path).context("Failed to load advisor configuration")
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    open_db(db_path, no_encrypt)?;

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Load demo data: penny seed --user alice");
    println!("  2. Get advice: penny advise --user alice");

    Ok(())
}

pub fn cmd_config(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;

    println!();
    println!("⚙️  Advisor Configuration");
    println!("   ─────────────────────────────────────────────────────────────");

    match config_path
        .map(Path::to_path_buf)
        .or_else(default_config_path)
    {
        Some(path) if path.exists() => println!("   Config file: {}", path.display()),
        Some(path) => println!("   Config file: {} (not present, using defaults)", path.display()),
        None => println!("   Config file: (no data directory)"),
    }

    println!("   Model: {}", config.model);
    println!("   Endpoint: {}", config.endpoint());
    println!("   Timeout: {}s", config.timeout.as_secs());
    println!(
        "   Generation: max_new_tokens={} temperature={} top_p={}",
        config.params.max_new_tokens, config.params.temperature, config.params.top_p
    );

    if config.has_credential() {
        println!("   🤖 Generative advice: ENABLED ({}=***)", MODEL_TOKEN_ENV);
    } else {
        println!("   📐 Generative advice: DISABLED (heuristic only)");
        println!("   💡 Tip: Set {} to enable the hosted model", MODEL_TOKEN_ENV);
    }

    println!();
    println!("   Overrides: {}, {}, {}", MODEL_ID_ENV, MODEL_HOST_ENV, DB_KEY_ENV);

    Ok(())
}
