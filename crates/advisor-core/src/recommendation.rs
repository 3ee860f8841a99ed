//! Recommendation data model shared by the generation pipeline and its callers.
//!
//! Every enumeration here is closed: adding a variant forces every exhaustive
//! `match` in scoring, template selection and prioritization to be revisited.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::types::{EvidenceItem, InsightCategory};

/// Kind of recommendation, also used as the opportunity type mined from insights
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum RecommendationType {
    Action,
    Habit,
    Decision,
    Learning,
    Optimization,
    Health,
    Career,
    Productivity,
    Reflection,
    Goal,
}

impl RecommendationType {
    /// Fixed opportunity-type to timeframe table
    pub fn default_timeframe(&self) -> RecommendationTimeframe {
        match self {
            RecommendationType::Action => RecommendationTimeframe::ShortTerm,
            RecommendationType::Habit => RecommendationTimeframe::MediumTerm,
            RecommendationType::Learning => RecommendationTimeframe::LongTerm,
            RecommendationType::Decision
            | RecommendationType::Optimization
            | RecommendationType::Health
            | RecommendationType::Career
            | RecommendationType::Productivity
            | RecommendationType::Reflection
            | RecommendationType::Goal => RecommendationTimeframe::MediumTerm,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Urgency {
    Low,
    Medium,
    High,
    Urgent,
}

impl Urgency {
    /// Urgency implied by a confidence value: >0.8 high, >0.6 medium, else low.
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > 0.8 {
            Urgency::High
        } else if confidence > 0.6 {
            Urgency::Medium
        } else {
            Urgency::Low
        }
    }

    /// Additive bonus used by the final priority score
    pub fn priority_bonus(&self) -> f64 {
        match self {
            Urgency::Urgent => 0.2,
            Urgency::High => 0.1,
            Urgency::Medium => 0.0,
            Urgency::Low => -0.1,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Difficulty {
    Easy,
    Moderate,
    Challenging,
    Complex,
}

impl Difficulty {
    /// Difficulty implied by the number of action steps
    pub fn from_step_count(steps: usize) -> Self {
        match steps {
            0..=2 => Difficulty::Easy,
            3..=4 => Difficulty::Moderate,
            5..=6 => Difficulty::Challenging,
            _ => Difficulty::Complex,
        }
    }

    pub fn base_feasibility(&self) -> f64 {
        match self {
            Difficulty::Easy => 0.9,
            Difficulty::Moderate => 0.75,
            Difficulty::Challenging => 0.55,
            Difficulty::Complex => 0.35,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum RecommendationTimeframe {
    Immediate,
    ShortTerm,
    MediumTerm,
    LongTerm,
}

impl RecommendationTimeframe {
    pub fn review_timeframe(&self) -> &'static str {
        match self {
            RecommendationTimeframe::Immediate => "2 days",
            RecommendationTimeframe::ShortTerm => "1 week",
            RecommendationTimeframe::MediumTerm => "1 month",
            RecommendationTimeframe::LongTerm => "3 months",
        }
    }
}

/// How assertively a recommendation is phrased
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Directness {
    Suggestion,
    Recommendation,
    StrongRecommendation,
}

impl Directness {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > 0.8 {
            Directness::StrongRecommendation
        } else if confidence > 0.6 {
            Directness::Recommendation
        } else {
            Directness::Suggestion
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GenerationMethod {
    Template,
    Ai,
}

/// One ordered step of a recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionStep {
    pub id: String,
    pub description: String,
    pub order: usize,
    pub dependencies: Vec<String>,
}

impl ActionStep {
    /// Build strictly ordered steps where each depends on its predecessor.
    pub fn sequence(recommendation_id: &str, descriptions: &[String]) -> Vec<ActionStep> {
        let mut steps: Vec<ActionStep> = Vec::with_capacity(descriptions.len());
        for (index, description) in descriptions.iter().enumerate() {
            let dependencies = steps.last().map(|prev| vec![prev.id.clone()]).unwrap_or_default();
            steps.push(ActionStep {
                id: format!("{}-step-{}", recommendation_id, index + 1),
                description: description.clone(),
                order: index + 1,
                dependencies,
            });
        }
        steps
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedRecommendation {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub recommendation_type: RecommendationType,
    pub category: InsightCategory,
    pub urgency: Urgency,
    pub difficulty: Difficulty,
    pub timeframe: RecommendationTimeframe,
    pub directness: Directness,
    pub confidence: f64,
    pub relevance_score: f64,
    pub impact_potential: f64,
    pub feasibility_score: f64,
    /// Never empty
    pub source_insights: Vec<String>,
    pub evidence: Vec<EvidenceItem>,
    pub action_steps: Vec<ActionStep>,
    pub risks: Vec<String>,
    pub prerequisites: Vec<String>,
    pub alternatives: Vec<String>,
    pub success_metrics: Vec<String>,
    pub tracking_methods: Vec<String>,
    pub review_timeframe: String,
    pub generated_at: DateTime<Utc>,
    pub generation_method: GenerationMethod,
    /// Id of the template used, when generated from one
    #[serde(default)]
    pub template_id: Option<String>,
    pub tags: Vec<String>,
}

impl GeneratedRecommendation {
    pub fn is_quick_win(&self) -> bool {
        self.difficulty == Difficulty::Easy
            && self.timeframe == RecommendationTimeframe::ShortTerm
            && self.impact_potential > 0.6
    }

    pub fn is_long_term_goal(&self) -> bool {
        self.timeframe == RecommendationTimeframe::LongTerm
    }

    pub fn shares_source_with(&self, other: &GeneratedRecommendation) -> bool {
        self.source_insights
            .iter()
            .any(|id| other.source_insights.contains(id))
    }
}

/// Thematic group of related recommendations from the same run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationCluster {
    pub id: String,
    pub theme: String,
    pub recommendations: Vec<GeneratedRecommendation>,
    pub combined_impact: f64,
    pub synergies: Vec<String>,
    pub conflicts: Vec<String>,
    pub priority_order: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_from_step_count() {
        assert_eq!(Difficulty::from_step_count(0), Difficulty::Easy);
        assert_eq!(Difficulty::from_step_count(2), Difficulty::Easy);
        assert_eq!(Difficulty::from_step_count(3), Difficulty::Moderate);
        assert_eq!(Difficulty::from_step_count(4), Difficulty::Moderate);
        assert_eq!(Difficulty::from_step_count(6), Difficulty::Challenging);
        assert_eq!(Difficulty::from_step_count(7), Difficulty::Complex);
    }

    #[test]
    fn test_urgency_thresholds_are_exclusive() {
        assert_eq!(Urgency::from_confidence(0.81), Urgency::High);
        assert_eq!(Urgency::from_confidence(0.8), Urgency::Medium);
        assert_eq!(Urgency::from_confidence(0.61), Urgency::Medium);
        assert_eq!(Urgency::from_confidence(0.6), Urgency::Low);
    }

    #[test]
    fn test_default_timeframes() {
        assert_eq!(
            RecommendationType::Action.default_timeframe(),
            RecommendationTimeframe::ShortTerm
        );
        assert_eq!(
            RecommendationType::Habit.default_timeframe(),
            RecommendationTimeframe::MediumTerm
        );
        assert_eq!(
            RecommendationType::Learning.default_timeframe(),
            RecommendationTimeframe::LongTerm
        );
        assert_eq!(
            RecommendationType::Reflection.default_timeframe(),
            RecommendationTimeframe::MediumTerm
        );
    }

    #[test]
    fn test_action_steps_are_chained() {
        let steps = ActionStep::sequence(
            "rec-1",
            &["first".to_string(), "second".to_string(), "third".to_string()],
        );
        assert_eq!(steps.len(), 3);
        assert!(steps[0].dependencies.is_empty());
        assert_eq!(steps[1].dependencies, vec!["rec-1-step-1".to_string()]);
        assert_eq!(steps[2].order, 3);
    }
}
