//! Turns opportunities into concrete recommendations via templates or an AI
//! completion, with template fallback.

use advisor_core::config::GenerationConfig;
use advisor_core::error::{AdvisorError, AdvisorResult};
use advisor_core::recommendation::{
    ActionStep, Difficulty, Directness, GeneratedRecommendation, GenerationMethod,
    RecommendationType, Urgency,
};
use advisor_core::scoring::{clamp01, evidence_quality};
use advisor_core::traits::{CompletionEngine, CompletionOptions};
use advisor_core::types::{AnalysisContext, AvailableTime, InsightType, StressLevel};
use advisor_core::utils::text::first_words;
use chrono::Utc;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::time::{timeout_at, Instant};
use uuid::Uuid;

use super::opportunity::RecommendationOpportunity;
use super::prompt::{build_recommendation_prompt, default_system_prompt};
use super::renderer::{missing_variables, TemplateRenderer};
use super::templates::{
    RecommendationTemplate, TemplateRegistry, CATEGORY, INSIGHT_DESCRIPTION, INSIGHT_TOPIC,
    SUGGESTED_OUTCOME,
};

static RE_CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*```(?:json)?\s*([\s\S]*?)\s*```\s*$").expect("valid regex")
});

const TOPIC_WORDS: usize = 3;

/// Structured reply expected from the completion engine
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiRecommendationDraft {
    pub title: String,
    pub description: String,
    pub action_steps: Vec<String>,
    pub risks: Vec<String>,
    pub success_metrics: Vec<String>,
}

/// Parse and validate an AI response. Anything but a single well-formed
/// object (optionally inside a code fence) is a parsing error.
pub fn parse_ai_response(response: &str, context: &str) -> AdvisorResult<AiRecommendationDraft> {
    let body = match RE_CODE_FENCE.captures(response).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str(),
        None => response.trim(),
    };
    let draft: AiRecommendationDraft =
        serde_json::from_str(body).map_err(|e| AdvisorError::parsing(context, e.to_string()))?;

    if draft.title.trim().is_empty() {
        return Err(AdvisorError::parsing(context, "title is empty"));
    }
    if draft.description.trim().is_empty() {
        return Err(AdvisorError::parsing(context, "description is empty"));
    }
    if draft.action_steps.iter().any(|s| s.trim().is_empty()) {
        return Err(AdvisorError::parsing(context, "action step is empty"));
    }
    Ok(draft)
}

/// Variables extracted from an opportunity for template filling
pub fn extract_variables(opportunity: &RecommendationOpportunity) -> BTreeMap<String, String> {
    let insight = &opportunity.insight;
    BTreeMap::from([
        (
            INSIGHT_TOPIC.to_string(),
            first_words(&insight.description, TOPIC_WORDS),
        ),
        (
            INSIGHT_DESCRIPTION.to_string(),
            insight.description.trim().trim_end_matches('.').to_string(),
        ),
        (
            SUGGESTED_OUTCOME.to_string(),
            opportunity.potential_impact.to_lowercase(),
        ),
        (CATEGORY.to_string(), insight.category.to_string()),
    ])
}

/// Result of generating one opportunity
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    /// `None` when no strategy could produce a recommendation
    pub recommendation: Option<GeneratedRecommendation>,
    /// Recoverable AI failure that was answered with a template instead
    pub fallback_reason: Option<AdvisorError>,
}

struct RecommendationContent {
    title: String,
    description: String,
    action_steps: Vec<String>,
    risks: Vec<String>,
    success_metrics: Vec<String>,
}

pub struct RecommendationGenerator {
    registry: Arc<TemplateRegistry>,
    renderer: TemplateRenderer,
    completion: Option<Arc<dyn CompletionEngine>>,
}

impl RecommendationGenerator {
    pub fn new(registry: Arc<TemplateRegistry>) -> Self {
        Self {
            registry,
            renderer: TemplateRenderer::new(),
            completion: None,
        }
    }

    pub fn with_completion_engine(mut self, engine: Arc<dyn CompletionEngine>) -> Self {
        self.completion = Some(engine);
        self
    }

    pub fn registry(&self) -> &Arc<TemplateRegistry> {
        &self.registry
    }

    pub fn has_completion_engine(&self) -> bool {
        self.completion.is_some()
    }

    /// Generate one recommendation according to `config`.
    ///
    /// `Ok` with no recommendation means no template matched and AI was not
    /// used. An AI failure is returned as `Err` when it cannot be answered
    /// by a template.
    pub async fn generate(
        &self,
        opportunity: &RecommendationOpportunity,
        context: &AnalysisContext,
        config: &GenerationConfig,
        deadline: Option<Instant>,
    ) -> AdvisorResult<GenerationOutcome> {
        if config.enable_ai_generation {
            match self
                .generate_with_ai(opportunity, context, &config.completion, deadline)
                .await
            {
                Ok(recommendation) => {
                    return Ok(GenerationOutcome {
                        recommendation: Some(recommendation),
                        fallback_reason: None,
                    })
                }
                Err(e) if e.is_recoverable() && config.fallback_to_templates => {
                    warn!("AI generation failed, trying templates: {}", e);
                    return match self.generate_from_template(opportunity, context) {
                        Ok(Some(recommendation)) => Ok(GenerationOutcome {
                            recommendation: Some(recommendation),
                            fallback_reason: Some(e),
                        }),
                        Ok(None) => Err(e),
                        Err(fallback_err) => {
                            warn!("Template fallback also failed: {}", fallback_err);
                            Err(e.with_secondary("template fallback", &fallback_err))
                        }
                    };
                }
                Err(e) => return Err(e),
            }
        }

        Ok(GenerationOutcome {
            recommendation: self.generate_from_template(opportunity, context)?,
            fallback_reason: None,
        })
    }

    /// Template strategy; `None` when no template of the opportunity's type exists
    pub fn generate_from_template(
        &self,
        opportunity: &RecommendationOpportunity,
        context: &AnalysisContext,
    ) -> AdvisorResult<Option<GeneratedRecommendation>> {
        match self.registry.find_best_template(opportunity) {
            Some(template) => self.fill_template(&template, opportunity, context).map(Some),
            None => {
                debug!(
                    "No {} template registered for insight {}",
                    opportunity.opportunity_type, opportunity.insight_id
                );
                Ok(None)
            }
        }
    }

    /// Fill a specific template for an opportunity
    pub fn fill_template(
        &self,
        template: &RecommendationTemplate,
        opportunity: &RecommendationOpportunity,
        context: &AnalysisContext,
    ) -> AdvisorResult<GeneratedRecommendation> {
        let variables = extract_variables(opportunity);
        let variation = template.select_variation(opportunity.confidence, context);

        let title_template = variation
            .and_then(|v| v.title_template.as_ref())
            .unwrap_or(&template.title_template);
        let description_template = variation
            .and_then(|v| v.description_template.as_ref())
            .unwrap_or(&template.description_template);

        // Checked on the templates, not the output: insight text may itself contain `{{...}}`
        let sources = [title_template, description_template]
            .into_iter()
            .chain(template.action_steps_template.iter());
        for source in sources {
            if let Some(name) = missing_variables(source, &variables).into_iter().next() {
                return Err(AdvisorError::configuration(
                    format!("templates.{}.variables", template.id),
                    format!("no value for placeholder '{}'", name),
                ));
            }
        }

        let title = self.renderer.render(title_template, &variables)?;
        let description = self.renderer.render(description_template, &variables)?;
        let mut action_steps = self
            .renderer
            .render_all(&template.action_steps_template, &variables)?;
        if action_steps.is_empty() {
            action_steps = opportunity.suggested_actions.clone();
        }

        let topic = &variables[INSIGHT_TOPIC];
        let timeframe = opportunity.opportunity_type.default_timeframe();
        let content = RecommendationContent {
            title,
            description,
            action_steps,
            risks: Vec::new(),
            success_metrics: vec![format!(
                "Progress on {} reviewed after {}",
                topic,
                timeframe.review_timeframe()
            )],
        };

        Ok(self.assemble(
            opportunity,
            context,
            content,
            GenerationMethod::Template,
            Some(template.id.clone()),
            variation.and_then(|v| v.directness),
        ))
    }

    /// AI strategy, bounded by `deadline` when given
    pub async fn generate_with_ai(
        &self,
        opportunity: &RecommendationOpportunity,
        context: &AnalysisContext,
        options: &CompletionOptions,
        deadline: Option<Instant>,
    ) -> AdvisorResult<GeneratedRecommendation> {
        let label = format!(
            "{} opportunity for insight {}",
            opportunity.opportunity_type, opportunity.insight_id
        );
        let engine = self
            .completion
            .as_ref()
            .ok_or_else(|| AdvisorError::generation(&label, "no completion engine configured"))?;

        let prompt = build_recommendation_prompt(opportunity, context);
        let mut options = options.clone();
        if options.system_prompt.is_none() {
            options.system_prompt = Some(default_system_prompt().to_string());
        }

        debug!("Requesting completion from {} for {}", engine.name(), label);
        let call = engine.generate_completion(&prompt, &options);
        let response = match deadline {
            Some(deadline) => timeout_at(deadline, call)
                .await
                .map_err(|_| AdvisorError::timeout(&label))?,
            None => call.await,
        }
        .map_err(|e| AdvisorError::generation(&label, e.to_string()))?;

        let draft = parse_ai_response(&response, &label)?;
        let content = RecommendationContent {
            title: draft.title.trim().to_string(),
            description: draft.description.trim().to_string(),
            action_steps: draft
                .action_steps
                .into_iter()
                .map(|s| s.trim().to_string())
                .collect(),
            risks: draft.risks,
            success_metrics: draft.success_metrics,
        };

        Ok(self.assemble(
            opportunity,
            context,
            content,
            GenerationMethod::Ai,
            None,
            None,
        ))
    }

    fn assemble(
        &self,
        opportunity: &RecommendationOpportunity,
        context: &AnalysisContext,
        content: RecommendationContent,
        method: GenerationMethod,
        template_id: Option<String>,
        directness: Option<Directness>,
    ) -> GeneratedRecommendation {
        let insight = &opportunity.insight;
        let id = format!("rec-{}", Uuid::new_v4());
        let confidence = clamp01(opportunity.confidence);
        let difficulty = Difficulty::from_step_count(content.action_steps.len());
        let timeframe = opportunity.opportunity_type.default_timeframe();
        let urgency = if insight.insight_type == InsightType::Warning && confidence > 0.8 {
            Urgency::Urgent
        } else {
            Urgency::from_confidence(confidence)
        };

        GeneratedRecommendation {
            action_steps: ActionStep::sequence(&id, &content.action_steps),
            id,
            title: content.title,
            description: content.description,
            recommendation_type: opportunity.opportunity_type,
            category: insight.category,
            urgency,
            difficulty,
            timeframe,
            directness: directness.unwrap_or_else(|| Directness::from_confidence(confidence)),
            confidence,
            relevance_score: clamp01(
                0.5 * insight.importance
                    + 0.3 * insight.actionability
                    + 0.2 * evidence_quality(&insight.evidence),
            ),
            impact_potential: clamp01(0.6 * insight.importance + 0.4 * insight.actionability),
            feasibility_score: feasibility(difficulty, context),
            source_insights: vec![opportunity.insight_id.clone()],
            evidence: insight.evidence.clone(),
            risks: content.risks,
            prerequisites: Vec::new(),
            alternatives: Vec::new(),
            success_metrics: content.success_metrics,
            tracking_methods: tracking_methods(opportunity.opportunity_type),
            review_timeframe: timeframe.review_timeframe().to_string(),
            generated_at: Utc::now(),
            generation_method: method,
            template_id,
            tags: vec![
                opportunity.opportunity_type.to_string(),
                insight.category.to_string(),
                method.to_string(),
            ],
        }
    }
}

impl std::fmt::Debug for RecommendationGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecommendationGenerator")
            .field("templates", &self.registry.len())
            .field(
                "completion",
                &self.completion.as_ref().map(|engine| engine.name().to_string()),
            )
            .finish()
    }
}

/// Base feasibility of the difficulty, adjusted for time and stress
fn feasibility(difficulty: Difficulty, context: &AnalysisContext) -> f64 {
    let time = match context.factors.available_time {
        Some(AvailableTime::Minimal) => -0.2,
        Some(AvailableTime::Limited) => -0.1,
        Some(AvailableTime::Moderate) | None => 0.0,
        Some(AvailableTime::Abundant) => 0.05,
    };
    let stress = match context.factors.stress_level {
        Some(StressLevel::High) => -0.1,
        Some(StressLevel::Moderate) | Some(StressLevel::Low) | None => 0.0,
    };
    clamp01(difficulty.base_feasibility() + time + stress)
}

fn tracking_methods(recommendation_type: RecommendationType) -> Vec<String> {
    let method = match recommendation_type {
        RecommendationType::Habit => "Daily habit tracker",
        RecommendationType::Health => "Energy and mood log",
        RecommendationType::Learning | RecommendationType::Reflection => "Weekly learning journal",
        RecommendationType::Action
        | RecommendationType::Decision
        | RecommendationType::Optimization
        | RecommendationType::Career
        | RecommendationType::Productivity
        | RecommendationType::Goal => "Weekly review check-in",
    };
    vec![method.to_string()]
}
