//! Spending advice
//!
//! - `types`: request/response contract shared by both generator tiers
//! - `heuristic`: deterministic rule-based advice, the guaranteed fallback
//! - `orchestrator`: `BudgetAdvisor`, which picks a tier and owns fallback

mod heuristic;
mod orchestrator;
pub mod types;

pub use heuristic::{HeuristicAdvisor, HEURISTIC_CONFIDENCE};
pub use orchestrator::{resolve_period, BudgetAdvisor};
pub use types::*;
