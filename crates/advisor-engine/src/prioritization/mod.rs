//! Insight prioritization
//!
//! Filtering, multi-criteria scoring, diversity and contextual boosts,
//! redundancy filtering and category/type balancing, split into focused
//! modules.

mod balancing;
pub mod engine;
mod redundancy;
pub mod types;

pub use engine::InsightPrioritizationEngine;
pub use types::{
    InsightScore, PrioritizationResult, RejectedInsight, ScoreDistribution,
    BELOW_SELECTION_THRESHOLD,
};
