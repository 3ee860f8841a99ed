//! Type definitions for insight prioritization
//!
//! Everything here lives for a single `prioritize_insights` call.

use advisor_core::scoring::ScoreComponents;
use advisor_core::types::{Insight, InsightCategory, InsightType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default reason attached to scored insights that missed the final cut
pub const BELOW_SELECTION_THRESHOLD: &str = "Below selection threshold";

/// Per-insight scoring record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightScore {
    pub insight_id: String,
    pub total_score: f64,
    pub components: ScoreComponents,
    pub weighted_scores: ScoreComponents,
    pub diversity_score: Option<f64>,
    pub contextual_score: Option<f64>,
    /// 1-based, assigned after sorting
    pub rank: usize,
    pub selected: bool,
    pub rejection_reason: Option<String>,
}

/// An insight that did not make the selection, with the reason why
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedInsight {
    pub insight_id: String,
    pub reason: String,
    /// Absent for insights dropped before scoring
    pub total_score: Option<f64>,
}

/// Five 0.2-wide buckets over [0, 1]; scores above 1 land in the last one
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreDistribution {
    pub buckets: [usize; 5],
}

impl ScoreDistribution {
    pub const LABELS: [&'static str; 5] = ["0.0-0.2", "0.2-0.4", "0.4-0.6", "0.6-0.8", "0.8-1.0"];

    pub fn from_scores<I: IntoIterator<Item = f64>>(scores: I) -> Self {
        let mut buckets = [0usize; 5];
        for score in scores {
            let index = if score.is_finite() && score > 0.0 {
                ((score / 0.2).floor() as usize).min(4)
            } else {
                0
            };
            buckets[index] += 1;
        }
        Self { buckets }
    }

    pub fn labelled(&self) -> Vec<(&'static str, usize)> {
        Self::LABELS.iter().copied().zip(self.buckets).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrioritizationResult {
    pub selected_insights: Vec<Insight>,
    pub all_scores: Vec<InsightScore>,
    pub rejected: Vec<RejectedInsight>,
    pub category_distribution: BTreeMap<InsightCategory, usize>,
    pub type_distribution: BTreeMap<InsightType, usize>,
    pub score_distribution: ScoreDistribution,
    /// Shannon entropy over the selected category distribution
    pub diversity_index: f64,
    pub average_confidence: f64,
    pub average_importance: f64,
    pub average_actionability: f64,
    pub warnings: Vec<String>,
    pub processing_time_ms: u64,
}

impl PrioritizationResult {
    pub fn score_for(&self, insight_id: &str) -> Option<&InsightScore> {
        self.all_scores.iter().find(|s| s.insight_id == insight_id)
    }

    pub fn is_selected(&self, insight_id: &str) -> bool {
        self.selected_insights.iter().any(|i| i.id == insight_id)
    }
}

/// Working record pairing an insight with its evolving score
#[derive(Debug, Clone)]
pub(crate) struct ScoredInsight<'a> {
    pub insight: &'a Insight,
    pub score: InsightScore,
}

impl ScoredInsight<'_> {
    pub fn is_active(&self) -> bool {
        self.score.rejection_reason.is_none()
    }

    pub fn reject(&mut self, reason: impl Into<String>) {
        self.score.selected = false;
        self.score.rejection_reason = Some(reason.into());
    }
}
