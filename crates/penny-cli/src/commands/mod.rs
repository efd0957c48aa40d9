//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Core commands (init, config) and shared utilities (open_db, load_config)
//! - `seed` - Demo data seeding
//! - `advise` - Advisory requests

pub mod advise;
pub mod core;
pub mod seed;

// Re-export command functions for main.rs
pub use advise::*;
pub use core::*;
pub use seed::*;
