use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{AdvisorError, AdvisorResult};
use crate::traits::CompletionOptions;
use crate::types::{Audience, InsightCategory, InsightType, Purpose};

/// Neutral alignment used when a purpose/category or audience/type pair is unknown
pub const DEFAULT_RELEVANCE: f64 = 0.5;

fn check_unit(field: &str, value: f64) -> AdvisorResult<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(AdvisorError::configuration(
            field,
            format!("must be within [0, 1], got {}", value),
        ))
    }
}

/// Weights of the six component scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub confidence: f64,
    pub importance: f64,
    pub recency: f64,
    pub frequency: f64,
    pub novelty: f64,
    pub actionability: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            confidence: 0.25,
            importance: 0.25,
            recency: 0.15,
            frequency: 0.15,
            novelty: 0.10,
            actionability: 0.10,
        }
    }
}

impl ScoringWeights {
    pub fn total(&self) -> f64 {
        self.confidence
            + self.importance
            + self.recency
            + self.frequency
            + self.novelty
            + self.actionability
    }

    pub fn validate(&self) -> AdvisorResult<()> {
        let named = [
            ("weights.confidence", self.confidence),
            ("weights.importance", self.importance),
            ("weights.recency", self.recency),
            ("weights.frequency", self.frequency),
            ("weights.novelty", self.novelty),
            ("weights.actionability", self.actionability),
        ];
        for (field, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(AdvisorError::configuration(
                    field,
                    format!("must be a non-negative number, got {}", value),
                ));
            }
        }
        if self.total() <= 0.0 {
            return Err(AdvisorError::configuration(
                "weights",
                "sum of weights must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Lookup tables for contextual relevance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelevanceTables {
    pub purpose_alignment: BTreeMap<Purpose, BTreeMap<InsightCategory, f64>>,
    pub audience_relevance: BTreeMap<Audience, BTreeMap<InsightType, f64>>,
}

impl RelevanceTables {
    pub fn purpose_alignment(&self, purpose: Purpose, category: InsightCategory) -> f64 {
        self.purpose_alignment
            .get(&purpose)
            .and_then(|row| row.get(&category))
            .copied()
            .unwrap_or(DEFAULT_RELEVANCE)
    }

    pub fn audience_relevance(&self, audience: Audience, insight_type: InsightType) -> f64 {
        self.audience_relevance
            .get(&audience)
            .and_then(|row| row.get(&insight_type))
            .copied()
            .unwrap_or(DEFAULT_RELEVANCE)
    }

    pub fn validate(&self) -> AdvisorResult<()> {
        for (purpose, row) in &self.purpose_alignment {
            for (category, score) in row {
                check_unit(&format!("purpose_alignment.{}.{}", purpose, category), *score)?;
            }
        }
        for (audience, row) in &self.audience_relevance {
            for (insight_type, score) in row {
                check_unit(&format!("audience_relevance.{}.{}", audience, insight_type), *score)?;
            }
        }
        Ok(())
    }
}

impl Default for RelevanceTables {
    fn default() -> Self {
        use InsightCategory as C;
        use InsightType as T;

        let purpose_alignment = BTreeMap::from([
            (
                Purpose::DailyReview,
                BTreeMap::from([
                    (C::Productivity, 0.9),
                    (C::Wellbeing, 0.8),
                    (C::Habits, 0.8),
                    (C::Health, 0.7),
                    (C::Goals, 0.6),
                    (C::Finance, 0.3),
                ]),
            ),
            (
                Purpose::WeeklySummary,
                BTreeMap::from([
                    (C::Productivity, 0.8),
                    (C::Goals, 0.8),
                    (C::Learning, 0.7),
                    (C::Relationships, 0.7),
                    (C::Wellbeing, 0.7),
                ]),
            ),
            (
                Purpose::MonthlyReport,
                BTreeMap::from([
                    (C::Goals, 0.9),
                    (C::Career, 0.8),
                    (C::PersonalGrowth, 0.8),
                    (C::Finance, 0.7),
                    (C::Learning, 0.7),
                ]),
            ),
            (
                Purpose::ProjectReview,
                BTreeMap::from([
                    (C::Productivity, 0.9),
                    (C::Career, 0.8),
                    (C::Learning, 0.7),
                    (C::Creativity, 0.7),
                    (C::Relationships, 0.3),
                ]),
            ),
        ]);

        let audience_relevance = BTreeMap::from([
            (
                Audience::Personal,
                BTreeMap::from([
                    (T::Pattern, 0.8),
                    (T::Recommendation, 0.8),
                    (T::Warning, 0.8),
                    (T::Opportunity, 0.8),
                    (T::Achievement, 0.7),
                    (T::Correlation, 0.7),
                    (T::Causation, 0.7),
                ]),
            ),
            (
                Audience::Team,
                BTreeMap::from([
                    (T::Recommendation, 0.8),
                    (T::Opportunity, 0.8),
                    (T::Warning, 0.7),
                    (T::Achievement, 0.7),
                    (T::Pattern, 0.6),
                    (T::Anomaly, 0.4),
                ]),
            ),
            (
                Audience::Manager,
                BTreeMap::from([
                    (T::Achievement, 0.9),
                    (T::Warning, 0.8),
                    (T::Recommendation, 0.8),
                    (T::Prediction, 0.7),
                    (T::Opportunity, 0.7),
                    (T::Observation, 0.3),
                ]),
            ),
        ]);

        Self {
            purpose_alignment,
            audience_relevance,
        }
    }
}

/// Knobs for a single prioritization run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrioritizationOptions {
    pub max_insights: usize,
    pub min_confidence_threshold: f64,
    pub min_importance: f64,
    pub min_actionability: f64,
    pub min_novelty: f64,
    pub require_evidence: bool,
    pub min_evidence_count: usize,
    pub weights: ScoringWeights,

    pub enable_temporal_scoring: bool,
    pub recency_window_days: f64,
    pub recency_decay_factor: f64,

    pub enable_diversity_boost: bool,
    pub diversity_weight: f64,

    pub enable_contextual_relevance: bool,
    pub context_weight: f64,
    pub relevance_tables: RelevanceTables,

    pub enable_redundancy_filtering: bool,
    pub similarity_threshold: f64,
    /// How many mutually similar insights may survive together (1 = none)
    pub max_similar_insights: usize,

    pub enable_category_balancing: bool,
    pub category_limits: BTreeMap<InsightCategory, usize>,
    pub default_category_limit: Option<usize>,
    pub min_per_category: usize,

    pub enable_type_balancing: bool,
    pub type_limits: BTreeMap<InsightType, usize>,
    pub default_type_limit: Option<usize>,
    pub min_per_type: usize,
}

impl Default for PrioritizationOptions {
    fn default() -> Self {
        Self {
            max_insights: 20,
            min_confidence_threshold: 0.3,
            min_importance: 0.0,
            min_actionability: 0.0,
            min_novelty: 0.0,
            require_evidence: false,
            min_evidence_count: 1,
            weights: ScoringWeights::default(),
            enable_temporal_scoring: true,
            recency_window_days: 30.0,
            recency_decay_factor: 1.0,
            enable_diversity_boost: true,
            diversity_weight: 0.1,
            enable_contextual_relevance: true,
            context_weight: 0.1,
            relevance_tables: RelevanceTables::default(),
            enable_redundancy_filtering: true,
            similarity_threshold: 0.7,
            max_similar_insights: 1,
            enable_category_balancing: true,
            category_limits: BTreeMap::new(),
            default_category_limit: Some(5),
            min_per_category: 1,
            enable_type_balancing: false,
            type_limits: BTreeMap::new(),
            default_type_limit: None,
            min_per_type: 0,
        }
    }
}

impl PrioritizationOptions {
    pub fn category_limit(&self, category: InsightCategory) -> Option<usize> {
        self.category_limits
            .get(&category)
            .copied()
            .or(self.default_category_limit)
    }

    pub fn type_limit(&self, insight_type: InsightType) -> Option<usize> {
        self.type_limits
            .get(&insight_type)
            .copied()
            .or(self.default_type_limit)
    }

    pub fn validate(&self) -> AdvisorResult<()> {
        if self.max_insights == 0 {
            return Err(AdvisorError::configuration(
                "max_insights",
                "must be at least 1",
            ));
        }
        check_unit("min_confidence_threshold", self.min_confidence_threshold)?;
        check_unit("min_importance", self.min_importance)?;
        check_unit("min_actionability", self.min_actionability)?;
        check_unit("min_novelty", self.min_novelty)?;
        check_unit("diversity_weight", self.diversity_weight)?;
        check_unit("context_weight", self.context_weight)?;
        check_unit("similarity_threshold", self.similarity_threshold)?;
        self.weights.validate()?;
        self.relevance_tables.validate()?;

        if !(self.recency_window_days.is_finite() && self.recency_window_days > 0.0) {
            return Err(AdvisorError::configuration(
                "recency_window_days",
                "must be greater than zero",
            ));
        }
        if !(self.recency_decay_factor.is_finite() && self.recency_decay_factor >= 0.0) {
            return Err(AdvisorError::configuration(
                "recency_decay_factor",
                "must be non-negative",
            ));
        }
        if self.max_similar_insights == 0 {
            return Err(AdvisorError::configuration(
                "max_similar_insights",
                "must be at least 1",
            ));
        }

        let category_limits = self
            .category_limits
            .iter()
            .map(|(c, l)| (c.to_string(), *l))
            .chain(self.default_category_limit.map(|l| ("default".to_string(), l)));
        for (name, limit) in category_limits {
            if limit < self.min_per_category {
                return Err(AdvisorError::configuration(
                    format!("category_limits.{}", name),
                    format!(
                        "limit {} is below min_per_category {}",
                        limit, self.min_per_category
                    ),
                ));
            }
        }
        let type_limits = self
            .type_limits
            .iter()
            .map(|(t, l)| (t.to_string(), *l))
            .chain(self.default_type_limit.map(|l| ("default".to_string(), l)));
        for (name, limit) in type_limits {
            if limit < self.min_per_type {
                return Err(AdvisorError::configuration(
                    format!("type_limits.{}", name),
                    format!("limit {} is below min_per_type {}", limit, self.min_per_type),
                ));
            }
        }
        Ok(())
    }
}

/// Knobs for recommendation generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub max_recommendations: usize,
    /// Opportunities below this confidence are discarded
    pub min_confidence_threshold: f64,
    pub max_opportunities: usize,
    pub enable_prioritization: bool,
    pub enable_ai_generation: bool,
    pub fallback_to_templates: bool,
    pub max_concurrent_completions: usize,
    /// Overall run deadline for AI completions
    pub deadline_ms: Option<u64>,
    pub completion: CompletionOptions,
    pub enable_clustering: bool,
    pub enable_recommendation_dedup: bool,
    pub recommendation_similarity_threshold: f64,
    pub priority_recommendation_count: usize,
    /// Stop the run at the first opportunity that cannot be generated
    pub abort_on_generation_failure: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_recommendations: 10,
            min_confidence_threshold: 0.4,
            max_opportunities: 30,
            enable_prioritization: true,
            enable_ai_generation: false,
            fallback_to_templates: true,
            max_concurrent_completions: 3,
            deadline_ms: Some(60_000),
            completion: CompletionOptions::default(),
            enable_clustering: true,
            enable_recommendation_dedup: true,
            recommendation_similarity_threshold: 0.8,
            priority_recommendation_count: 3,
            abort_on_generation_failure: false,
        }
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> AdvisorResult<()> {
        if self.max_recommendations == 0 {
            return Err(AdvisorError::configuration(
                "max_recommendations",
                "must be at least 1",
            ));
        }
        if self.max_opportunities == 0 {
            return Err(AdvisorError::configuration(
                "max_opportunities",
                "must be at least 1",
            ));
        }
        if self.max_concurrent_completions == 0 {
            return Err(AdvisorError::configuration(
                "max_concurrent_completions",
                "must be at least 1",
            ));
        }
        if self.deadline_ms == Some(0) {
            return Err(AdvisorError::configuration(
                "deadline_ms",
                "must be greater than zero when set",
            ));
        }
        check_unit("min_confidence_threshold", self.min_confidence_threshold)?;
        check_unit(
            "recommendation_similarity_threshold",
            self.recommendation_similarity_threshold,
        )?;
        if let Some(temperature) = self.completion.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(AdvisorError::configuration(
                    "completion.temperature",
                    format!("must be within [0, 2], got {}", temperature),
                ));
            }
        }
        Ok(())
    }
}

/// Complete advisor configuration as loaded from disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    pub prioritization: PrioritizationOptions,
    pub generation: GenerationConfig,
}

impl AdvisorConfig {
    pub fn validate(&self) -> AdvisorResult<()> {
        self.prioritization.validate()?;
        self.generation.validate()
    }

    pub fn from_yaml_str(content: &str) -> AdvisorResult<Self> {
        let config: AdvisorConfig = serde_yaml::from_str(content)
            .map_err(|e| AdvisorError::configuration("yaml", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> AdvisorResult<Self> {
        let config: AdvisorConfig = serde_json::from_str(content)
            .map_err(|e| AdvisorError::configuration("json", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json` file, or YAML for any other extension
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> AdvisorResult<Self> {
        let path = path.as_ref();
        debug!("Loading advisor config from {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| {
            AdvisorError::configuration(path.display().to_string(), e.to_string())
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validation() {
        assert!(AdvisorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_weights_rejected() {
        let weights = ScoringWeights {
            confidence: 0.0,
            importance: 0.0,
            recency: 0.0,
            frequency: 0.0,
            novelty: 0.0,
            actionability: 0.0,
        };
        assert!(matches!(
            weights.validate(),
            Err(AdvisorError::Configuration { .. })
        ));
    }

    #[test]
    fn test_limit_below_minimum_rejected() {
        let mut options = PrioritizationOptions::default();
        options.min_per_category = 3;
        options
            .category_limits
            .insert(InsightCategory::Productivity, 2);
        let err = options.validate().unwrap_err();
        assert!(err.to_string().contains("category_limits.productivity"));
    }

    #[test]
    fn test_relevance_lookup_defaults_to_neutral() {
        let tables = RelevanceTables::default();
        assert_eq!(
            tables.purpose_alignment(Purpose::DailyReview, InsightCategory::Productivity),
            0.9
        );
        assert_eq!(
            tables.purpose_alignment(Purpose::DailyReview, InsightCategory::Creativity),
            DEFAULT_RELEVANCE
        );
        assert_eq!(
            tables.audience_relevance(Audience::Manager, InsightType::Anomaly),
            DEFAULT_RELEVANCE
        );
    }
}
