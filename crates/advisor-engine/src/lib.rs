pub mod prioritization;
pub mod recommendation;

pub use prioritization::{InsightPrioritizationEngine, PrioritizationResult};
pub use recommendation::{
    create_pipeline, Domain, RecommendationGenerationResult, RecommendationPipeline,
    TemplateRegistry,
};
