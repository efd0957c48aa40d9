//! Penny Core Library
//!
//! Financial advisory engine for the Penny finance dashboard:
//! - Monthly context aggregation over a read-only record store
//! - Deterministic heuristic budget advice
//! - Generative advice from a hosted text-generation model, validated and
//!   normalized, with heuristic fallback
//! - SQLite record store (optionally SQLCipher-encrypted) and an in-memory store
//! - Layered advisor configuration

pub mod advice;
pub mod ai;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod models;
pub mod store;

/// Test utilities including mock inference server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use advice::{
    AdviceRequest, AdviceResult, AdvisoryOutcome, AdvisoryResponse, BudgetAdvisor,
    BudgetChangeSuggestion, ContextHints, HeuristicAdvisor, PrivacyMode,
};
pub use ai::{AIBackend, AIClient, GenerationOutcome, GenerativeAdvisor, MockBackend};
pub use config::AdvisorConfig;
pub use context::ContextAggregator;
pub use db::Database;
pub use error::{Error, Result};
pub use models::{CategorySpendEntry, GoalSummary, MonthlyContext, Totals};
pub use store::{InMemoryStore, RecordStore, StoreOperation};
