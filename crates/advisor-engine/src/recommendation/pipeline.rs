//! End-to-end recommendation generation
//!
//! insights -> prioritization -> opportunities -> generation (template | AI)
//! -> validation -> de-duplication -> ranking -> clustering

use advisor_core::config::{AdvisorConfig, GenerationConfig};
use advisor_core::error::{AdvisorError, AdvisorResult};
use advisor_core::recommendation::{GeneratedRecommendation, RecommendationCluster};
use advisor_core::scoring::{jaccard, normalized_shannon};
use advisor_core::traits::CompletionEngine;
use advisor_core::types::{AnalysisContext, Insight};
use advisor_core::utils::text::word_set;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use super::clusterer::RecommendationClusterer;
use super::generator::RecommendationGenerator;
use super::opportunity::OpportunityIdentifier;
use super::prioritizer::RecommendationPrioritizer;
use super::templates::{RecommendationTemplate, TemplateRegistry};
use super::validator::RecommendationValidator;
use crate::prioritization::InsightPrioritizationEngine;

/// Output of one `generate_recommendations` run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationGenerationResult {
    pub recommendations: Vec<GeneratedRecommendation>,
    pub clusters: Vec<RecommendationCluster>,
    pub total_opportunities: usize,
    pub opportunities_processed: usize,
    pub recommendations_generated: usize,
    pub average_confidence: f64,
    /// Normalised Shannon entropy over recommendation types
    pub diversity_score: f64,
    pub feasibility_score: f64,
    pub impact_score: f64,
    pub generation_time_ms: u64,
    pub templates_used: Vec<String>,
    pub warnings: Vec<String>,
    pub priority_recommendations: Vec<String>,
    pub quick_wins: Vec<String>,
    pub long_term_goals: Vec<String>,
}

impl RecommendationGenerationResult {
    /// Zero-valued result carrying a single explanatory warning
    pub fn failed(warning: impl Into<String>, generation_time_ms: u64) -> Self {
        Self {
            warnings: vec![warning.into()],
            generation_time_ms,
            ..Self::default()
        }
    }
}

/// Title/description similarity used to collapse near-duplicate recommendations
pub fn recommendation_similarity(a: &GeneratedRecommendation, b: &GeneratedRecommendation) -> f64 {
    0.6 * jaccard(&word_set(&a.title), &word_set(&b.title))
        + 0.4 * jaccard(&word_set(&a.description), &word_set(&b.description))
}

pub struct RecommendationPipeline {
    config: AdvisorConfig,
    insight_engine: InsightPrioritizationEngine,
    generator: RecommendationGenerator,
    validator: RecommendationValidator,
    clusterer: RecommendationClusterer,
    prioritizer: RecommendationPrioritizer,
}

impl RecommendationPipeline {
    /// Build a pipeline over an explicit registry. Invalid configuration fails here.
    pub fn new(config: AdvisorConfig, registry: Arc<TemplateRegistry>) -> AdvisorResult<Self> {
        config.validate()?;
        Ok(Self {
            insight_engine: InsightPrioritizationEngine::new(config.prioritization.clone())?,
            config,
            generator: RecommendationGenerator::new(registry),
            validator: RecommendationValidator::new(),
            clusterer: RecommendationClusterer::new(),
            prioritizer: RecommendationPrioritizer::new(),
        })
    }

    /// Pipeline with its own registry seeded with the default templates
    pub fn with_default_templates(config: AdvisorConfig) -> AdvisorResult<Self> {
        Self::new(config, Arc::new(TemplateRegistry::with_default_templates()?))
    }

    pub fn with_completion_engine(mut self, engine: Arc<dyn CompletionEngine>) -> Self {
        self.generator = self.generator.with_completion_engine(engine);
        self
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    /// Validate and swap the configuration; the old one stays on error
    pub fn update_config(&mut self, config: AdvisorConfig) -> AdvisorResult<()> {
        config.validate()?;
        self.insight_engine = InsightPrioritizationEngine::new(config.prioritization.clone())?;
        self.config = config;
        info!("Pipeline configuration updated");
        Ok(())
    }

    pub fn registry(&self) -> &Arc<TemplateRegistry> {
        self.generator.registry()
    }

    pub fn add_template(&self, template: RecommendationTemplate) -> AdvisorResult<()> {
        self.registry().add_template(template)
    }

    pub fn remove_template(&self, id: &str) -> Option<RecommendationTemplate> {
        self.registry().remove_template(id)
    }

    pub fn list_templates(&self) -> Vec<RecommendationTemplate> {
        self.registry().list_templates()
    }

    pub fn insight_engine(&self) -> &InsightPrioritizationEngine {
        &self.insight_engine
    }

    /// Generate recommendations; `config` overrides the pipeline's generation
    /// settings for this run only. Never fails: problems end up in `warnings`.
    pub async fn generate_recommendations(
        &self,
        insights: &[Insight],
        context: &AnalysisContext,
        config: Option<&GenerationConfig>,
    ) -> RecommendationGenerationResult {
        self.generate_recommendations_at(insights, context, config, Utc::now())
            .await
    }

    pub async fn generate_recommendations_at(
        &self,
        insights: &[Insight],
        context: &AnalysisContext,
        config: Option<&GenerationConfig>,
        now: DateTime<Utc>,
    ) -> RecommendationGenerationResult {
        let started = Instant::now();
        let config = config.unwrap_or(&self.config.generation);
        match self.run(insights, context, config, now, started).await {
            Ok(result) => result,
            Err(e) => {
                error!("Recommendation generation failed: {}", e);
                RecommendationGenerationResult::failed(
                    format!("Recommendation generation failed: {}", e),
                    started.elapsed().as_millis() as u64,
                )
            }
        }
    }

    async fn run(
        &self,
        insights: &[Insight],
        context: &AnalysisContext,
        config: &GenerationConfig,
        now: DateTime<Utc>,
        started: Instant,
    ) -> AdvisorResult<RecommendationGenerationResult> {
        config.validate()?;
        let mut warnings = Vec::new();

        let selected: Vec<Insight> = if config.enable_prioritization {
            let prioritized = self
                .insight_engine
                .prioritize_insights_at(insights, context, now)?;
            warnings.extend(prioritized.warnings);
            prioritized.selected_insights
        } else {
            insights.to_vec()
        };

        let mut opportunities =
            OpportunityIdentifier::new(config.min_confidence_threshold).identify_at(&selected, now);
        let total_opportunities = opportunities.len();
        opportunities.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        if opportunities.len() > config.max_opportunities {
            let message = format!(
                "Only the {} most confident of {} opportunities were processed",
                config.max_opportunities,
                opportunities.len()
            );
            warn!("{}", message);
            warnings.push(message);
            opportunities.truncate(config.max_opportunities);
        }
        debug!(
            "{} opportunities from {} selected insights",
            opportunities.len(),
            selected.len()
        );

        let deadline = config
            .deadline_ms
            .map(|ms| Instant::now() + Duration::from_millis(ms));
        let generator = &self.generator;
        let mut outcomes: Vec<_> = stream::iter(opportunities.iter().enumerate())
            .map(|(index, opportunity)| async move {
                let outcome = generator
                    .generate(opportunity, context, config, deadline)
                    .await;
                (index, outcome)
            })
            .buffer_unordered(config.max_concurrent_completions)
            .collect()
            .await;
        outcomes.sort_by_key(|(index, _)| *index);

        let mut recommendations = Vec::new();
        for (index, outcome) in outcomes {
            let opportunity = &opportunities[index];
            let label = format!(
                "{} opportunity for insight {}",
                opportunity.opportunity_type, opportunity.insight_id
            );
            match outcome {
                Ok(outcome) => {
                    if let Some(reason) = outcome.fallback_reason {
                        warnings.push(format!("Used template for {} after AI failure: {}", label, reason));
                    }
                    match outcome.recommendation {
                        Some(recommendation) => {
                            let report = self.validator.validate(&recommendation);
                            match report.to_error() {
                                Some(e) => {
                                    warn!("Discarding recommendation {}: {}", recommendation.id, e);
                                    warnings.push(format!("Discarded {}: {}", label, e));
                                }
                                None => recommendations.push(recommendation),
                            }
                        }
                        None => {
                            let message = format!(
                                "No {} template matched and AI generation was unavailable; skipped {}",
                                opportunity.opportunity_type, label
                            );
                            warn!("{}", message);
                            warnings.push(message);
                        }
                    }
                }
                Err(e) if config.abort_on_generation_failure => {
                    return Err(AdvisorError::internal(
                        format!("generation of {}", label),
                        e.to_string(),
                    ));
                }
                Err(e) => {
                    warn!("Skipping {}: {}", label, e);
                    warnings.push(format!("Skipped {}: {}", label, e));
                }
            }
        }

        if config.enable_recommendation_dedup {
            recommendations = self.deduplicate(
                recommendations,
                config.recommendation_similarity_threshold,
                &mut warnings,
            );
        }

        let mut recommendations = self.prioritizer.prioritize(recommendations);
        if recommendations.len() > config.max_recommendations {
            warnings.push(format!(
                "{} recommendations trimmed to the top {}",
                recommendations.len(),
                config.max_recommendations
            ));
            recommendations.truncate(config.max_recommendations);
        }

        let clusters = if config.enable_clustering {
            self.clusterer.cluster(&recommendations)
        } else {
            Vec::new()
        };

        let mean = |f: fn(&GeneratedRecommendation) -> f64| -> f64 {
            if recommendations.is_empty() {
                0.0
            } else {
                recommendations.iter().map(f).sum::<f64>() / recommendations.len() as f64
            }
        };
        let mut type_counts: BTreeMap<_, usize> = BTreeMap::new();
        for recommendation in &recommendations {
            *type_counts.entry(recommendation.recommendation_type).or_default() += 1;
        }
        let templates_used: BTreeSet<String> = recommendations
            .iter()
            .filter_map(|r| r.template_id.clone())
            .collect();

        let result = RecommendationGenerationResult {
            total_opportunities,
            opportunities_processed: opportunities.len(),
            recommendations_generated: recommendations.len(),
            average_confidence: mean(|r| r.confidence),
            diversity_score: normalized_shannon(type_counts.into_values()),
            feasibility_score: mean(|r| r.feasibility_score),
            impact_score: mean(|r| r.impact_potential),
            generation_time_ms: started.elapsed().as_millis() as u64,
            templates_used: templates_used.into_iter().collect(),
            priority_recommendations: self
                .prioritizer
                .top_ids(&recommendations, config.priority_recommendation_count),
            quick_wins: self.prioritizer.quick_wins(&recommendations),
            long_term_goals: self.prioritizer.long_term_goals(&recommendations),
            warnings,
            clusters,
            recommendations,
        };
        info!(
            "Generated {} recommendations from {} opportunities in {}ms",
            result.recommendations_generated,
            result.opportunities_processed,
            result.generation_time_ms
        );
        Ok(result)
    }

    /// Collapse near-duplicates, keeping the more confident recommendation
    fn deduplicate(
        &self,
        mut recommendations: Vec<GeneratedRecommendation>,
        threshold: f64,
        warnings: &mut Vec<String>,
    ) -> Vec<GeneratedRecommendation> {
        recommendations.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        let mut kept: Vec<GeneratedRecommendation> = Vec::with_capacity(recommendations.len());
        for candidate in recommendations {
            match kept
                .iter()
                .find(|k| recommendation_similarity(k, &candidate) > threshold)
            {
                Some(existing) => {
                    debug!("Recommendation {} duplicates {}", candidate.id, existing.id);
                    warnings.push(format!(
                        "Dropped duplicate recommendation \"{}\" (similar to \"{}\")",
                        candidate.title, existing.title
                    ));
                }
                None => kept.push(candidate),
            }
        }
        kept
    }
}

impl std::fmt::Debug for RecommendationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecommendationPipeline")
            .field("config", &self.config)
            .field("generator", &self.generator)
            .finish()
    }
}
