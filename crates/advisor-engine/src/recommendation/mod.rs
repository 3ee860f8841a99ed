//! Recommendation generation
//!
//! Opportunity mining, template registry and rendering, template/AI
//! generation, validation, clustering and final ranking.

pub mod clusterer;
pub mod factory;
pub mod generator;
pub mod opportunity;
pub mod pipeline;
pub mod prioritizer;
pub mod prompt;
pub mod renderer;
pub mod templates;
pub mod validator;

#[cfg(test)]
mod fixtures;

pub use clusterer::{detect_conflicts, RecommendationClusterer};
pub use factory::{create_pipeline, create_pipeline_with_config, Domain};
pub use generator::{parse_ai_response, GenerationOutcome, RecommendationGenerator};
pub use opportunity::{OpportunityIdentifier, RecommendationOpportunity};
pub use pipeline::{RecommendationGenerationResult, RecommendationPipeline};
pub use prioritizer::{priority_score, RecommendationPrioritizer};
pub use templates::{
    RecommendationTemplate, TemplateRegistry, TemplateVariation, UsageFrequency,
    VariationCondition,
};
pub use validator::{RecommendationValidator, ValidationReport};
