//! Domain-specialised pipelines, each with an independent template registry

use advisor_core::config::{AdvisorConfig, ScoringWeights};
use advisor_core::error::AdvisorResult;
use advisor_core::recommendation::{Directness, RecommendationType};
use advisor_core::types::{AvailableTime, InsightCategory, InsightType, StressLevel};
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::{Display, EnumIter, EnumString};

use super::pipeline::RecommendationPipeline;
use super::templates::{
    RecommendationTemplate, TemplateRegistry, TemplateVariation, UsageFrequency,
    VariationCondition,
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Domain {
    #[default]
    General,
    Career,
    Wellness,
    Productivity,
}

impl Domain {
    /// Configuration tuned for the domain
    pub fn config(&self) -> AdvisorConfig {
        let mut config = AdvisorConfig::default();
        match self {
            Domain::General => {}
            Domain::Career => {
                config.prioritization.weights = ScoringWeights {
                    importance: 0.3,
                    novelty: 0.15,
                    recency: 0.1,
                    ..ScoringWeights::default()
                };
                for category in [
                    InsightCategory::Career,
                    InsightCategory::Goals,
                    InsightCategory::Learning,
                ] {
                    config.prioritization.category_limits.insert(category, 8);
                }
                config.generation.priority_recommendation_count = 5;
            }
            Domain::Wellness => {
                for category in [InsightCategory::Wellbeing, InsightCategory::Health] {
                    config.prioritization.category_limits.insert(category, 8);
                }
                config.prioritization.context_weight = 0.2;
                config.generation.min_confidence_threshold = 0.35;
            }
            Domain::Productivity => {
                config.prioritization.weights = ScoringWeights {
                    actionability: 0.2,
                    novelty: 0.05,
                    ..ScoringWeights::default()
                };
                config
                    .prioritization
                    .category_limits
                    .insert(InsightCategory::Productivity, 10);
                config.generation.max_recommendations = 12;
            }
        }
        config
    }

    /// Templates registered on top of the defaults
    pub fn templates(&self) -> Vec<RecommendationTemplate> {
        match self {
            Domain::General => Vec::new(),
            Domain::Career => vec![
                RecommendationTemplate::new(
                    "career-skill-roadmap",
                    RecommendationType::Career,
                    "Turn {{insight_topic}} into a career milestone",
                    "Your notes keep returning to this: {{insight_description}}. Making it part of your career plan could bring {{suggested_outcome}}.",
                    vec![
                        "Describe where {{insight_topic}} fits in your next role".to_string(),
                        "Pick one skill to demonstrate this quarter".to_string(),
                        "Ask a mentor for feedback".to_string(),
                    ],
                    0.8,
                )
                .with_applicable_types(vec![
                    InsightType::Pattern,
                    InsightType::Opportunity,
                    InsightType::Achievement,
                ]),
                RecommendationTemplate::new(
                    "career-learning-plan",
                    RecommendationType::Learning,
                    "Build a learning plan for {{insight_topic}}",
                    "You noted: {{insight_description}}. A deliberate plan turns it into {{suggested_outcome}}.",
                    vec![
                        "List the skills {{insight_topic}} requires".to_string(),
                        "Schedule two learning sessions a week".to_string(),
                        "Ship a small project using them".to_string(),
                    ],
                    0.75,
                )
                .with_category(InsightCategory::Career),
            ],
            Domain::Wellness => vec![RecommendationTemplate::new(
                "wellness-gentle-reset",
                RecommendationType::Health,
                "Give yourself a reset around {{insight_topic}}",
                "Your notes show a strain: {{insight_description}}. Small restorative habits support {{suggested_outcome}}.",
                vec![
                    "Take a ten-minute walk after lunch".to_string(),
                    "Stop screens thirty minutes before bed".to_string(),
                ],
                0.8,
            )
            .with_usage_frequency(UsageFrequency::Daily)
            .with_variation(TemplateVariation {
                condition: VariationCondition::StressLevel(StressLevel::High),
                title_template: Some("Ease the pressure around {{insight_topic}}".to_string()),
                description_template: None,
                directness: Some(Directness::StrongRecommendation),
            })],
            Domain::Productivity => vec![RecommendationTemplate::new(
                "productivity-time-block",
                RecommendationType::Productivity,
                "Time-block {{insight_topic}}",
                "Your notes show: {{insight_description}}. Fixed focus blocks support {{suggested_outcome}}.",
                vec![
                    "Choose two 90-minute focus blocks this week".to_string(),
                    "Silence notifications during them".to_string(),
                    "Review what got done on Friday".to_string(),
                ],
                0.8,
            )
            .with_variation(TemplateVariation {
                condition: VariationCondition::AvailableTime(AvailableTime::Minimal),
                title_template: Some("Protect one focus block for {{insight_topic}}".to_string()),
                description_template: None,
                directness: Some(Directness::Suggestion),
            })],
        }
    }

    /// Registry with the default templates plus this domain's templates
    pub fn registry(&self) -> AdvisorResult<TemplateRegistry> {
        let registry = TemplateRegistry::with_default_templates()?;
        for template in self.templates() {
            registry.add_template(template)?;
        }
        Ok(registry)
    }
}

/// Create a pipeline specialised for `domain`
pub fn create_pipeline(domain: Domain) -> AdvisorResult<RecommendationPipeline> {
    create_pipeline_with_config(domain, domain.config())
}

/// Domain templates with a caller-supplied configuration
pub fn create_pipeline_with_config(
    domain: Domain,
    config: AdvisorConfig,
) -> AdvisorResult<RecommendationPipeline> {
    let registry = Arc::new(domain.registry()?);
    debug!("Creating {} pipeline with {} templates", domain, registry.len());
    RecommendationPipeline::new(config, registry)
}
