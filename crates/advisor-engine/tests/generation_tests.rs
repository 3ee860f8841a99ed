use advisor_core::config::{AdvisorConfig, GenerationConfig};
use advisor_core::recommendation::{GenerationMethod, RecommendationType};
use advisor_core::traits::{CompletionEngine, CompletionOptions};
use advisor_core::types::{AnalysisContext, EvidenceItem, Insight, InsightCategory, InsightType};
use advisor_engine::recommendation::templates::default_templates;
use advisor_engine::recommendation::{
    OpportunityIdentifier, RecommendationClusterer, RecommendationGenerator,
    RecommendationOpportunity, RecommendationPipeline, RecommendationTemplate, TemplateRegistry,
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Integration tests for the recommendation generation pipeline

struct FailingEngine;

#[async_trait]
impl CompletionEngine for FailingEngine {
    async fn generate_completion(&self, _prompt: &str, _options: &CompletionOptions) -> Result<String> {
        Err(anyhow!("rate limited"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Sleeps longer than any test deadline
struct SlowEngine;

#[async_trait]
impl CompletionEngine for SlowEngine {
    async fn generate_completion(&self, _prompt: &str, _options: &CompletionOptions) -> Result<String> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Err(anyhow!("unreachable"))
    }
}

/// Counts calls and the peak number in flight
#[derive(Default)]
struct CountingEngine {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

#[async_trait]
impl CompletionEngine for CountingEngine {
    async fn generate_completion(&self, prompt: &str, _options: &CompletionOptions) -> Result<String> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let kind = prompt
            .lines()
            .find_map(|l| l.strip_prefix("Recommendation type: "))
            .unwrap_or("general")
            .to_string();
        Ok(serde_json::json!({
            "title": format!("Plan a {} change", kind),
            "description": format!("A tailored {} recommendation.", kind),
            "actionSteps": ["Start", "Review"],
            "risks": [],
            "successMetrics": ["Done within a week"]
        })
        .to_string())
    }
}

fn insight(id: &str, description: &str, category: InsightCategory, confidence: f64) -> Insight {
    Insight::new(id, format!("Insight {}", id), description, category, InsightType::Pattern)
        .with_scores(confidence, 0.8, 0.7, 0.5)
        .with_evidence(vec![EvidenceItem::new("journal excerpt", "journal/today.md")])
}

fn opportunity(insight: Insight, opportunity_type: RecommendationType) -> RecommendationOpportunity {
    RecommendationOpportunity {
        insight_id: insight.id.clone(),
        insight,
        opportunity_type,
        confidence: 0.8,
        reasoning: "test".to_string(),
        suggested_actions: vec!["Start".to_string()],
        potential_impact: "High impact on productivity".to_string(),
        implementation_notes: String::new(),
    }
}

fn ai_config() -> GenerationConfig {
    GenerationConfig {
        enable_ai_generation: true,
        fallback_to_templates: true,
        ..GenerationConfig::default()
    }
}

#[tokio::test]
async fn test_ai_failure_falls_back_to_template() -> Result<()> {
    let pipeline = RecommendationPipeline::with_default_templates(AdvisorConfig::default())?
        .with_completion_engine(Arc::new(FailingEngine));
    let insights = vec![insight(
        "i-1",
        "We need to reply to client email faster",
        InsightCategory::Relationships,
        0.8,
    )];

    let result = pipeline
        .generate_recommendations(&insights, &AnalysisContext::default(), Some(&ai_config()))
        .await;

    assert_eq!(result.recommendations.len(), 1);
    let rec = &result.recommendations[0];
    assert_eq!(rec.recommendation_type, RecommendationType::Action);
    assert_eq!(rec.generation_method, GenerationMethod::Template);
    assert!(result.warnings.iter().any(|w| w.contains("after AI failure")));
    assert_eq!(result.templates_used, vec!["action-next-step".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_scenario_missing_template_without_ai_yields_nothing() -> Result<()> {
    let registry = TemplateRegistry::new();
    let action = default_templates()
        .into_iter()
        .find(|t| t.recommendation_type == RecommendationType::Action)
        .expect("action template");
    registry.add_template(action)?;
    let pipeline = RecommendationPipeline::new(AdvisorConfig::default(), Arc::new(registry))?;
    let insights = vec![insight(
        "i-1",
        "I review my budget every day",
        InsightCategory::Finance,
        0.8,
    )];

    let result = pipeline
        .generate_recommendations(&insights, &AnalysisContext::default(), None)
        .await;

    assert_eq!(result.total_opportunities, 1);
    assert_eq!(result.opportunities_processed, 1);
    assert!(result.recommendations.is_empty());
    assert!(result
        .warnings
        .iter()
        .any(|w| w.contains("No habit template matched")));
    Ok(())
}

#[tokio::test]
async fn test_ai_failure_without_fallback_skips_opportunity() -> Result<()> {
    let pipeline = RecommendationPipeline::with_default_templates(AdvisorConfig::default())?
        .with_completion_engine(Arc::new(FailingEngine));
    let config = GenerationConfig {
        fallback_to_templates: false,
        ..ai_config()
    };
    let insights = vec![insight(
        "i-1",
        "We need to reply to client email faster",
        InsightCategory::Relationships,
        0.8,
    )];

    let result = pipeline
        .generate_recommendations(&insights, &AnalysisContext::default(), Some(&config))
        .await;

    assert!(result.recommendations.is_empty());
    assert!(result.warnings.iter().any(|w| w.starts_with("Skipped")));

    let aborting = GenerationConfig {
        abort_on_generation_failure: true,
        ..config
    };
    let aborted = pipeline
        .generate_recommendations(&insights, &AnalysisContext::default(), Some(&aborting))
        .await;
    assert_eq!(aborted.total_opportunities, 0);
    assert_eq!(aborted.warnings.len(), 1);
    assert!(aborted.warnings[0].starts_with("Recommendation generation failed"));
    Ok(())
}

#[tokio::test]
async fn test_deadline_expiry_falls_back_to_templates() -> Result<()> {
    let pipeline = RecommendationPipeline::with_default_templates(AdvisorConfig::default())?
        .with_completion_engine(Arc::new(SlowEngine));
    let config = GenerationConfig {
        deadline_ms: Some(50),
        ..ai_config()
    };
    let insights = vec![
        insight("i-1", "We need to reply to client email faster", InsightCategory::Relationships, 0.8),
        insight("i-2", "I want to learn statistics properly", InsightCategory::Career, 0.8),
    ];

    let started = std::time::Instant::now();
    let result = pipeline
        .generate_recommendations(&insights, &AnalysisContext::default(), Some(&config))
        .await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(result.recommendations.len(), 2);
    assert!(result
        .recommendations
        .iter()
        .all(|r| r.generation_method == GenerationMethod::Template));
    assert!(result.warnings.iter().any(|w| w.contains("deadline exceeded")));
    Ok(())
}

#[tokio::test]
async fn test_ai_calls_respect_concurrency_limit() -> Result<()> {
    let engine = Arc::new(CountingEngine::default());
    let pipeline = RecommendationPipeline::with_default_templates(AdvisorConfig::default())?
        .with_completion_engine(engine.clone());
    let config = GenerationConfig {
        max_concurrent_completions: 2,
        enable_recommendation_dedup: false,
        ..ai_config()
    };
    let insights = vec![
        insight("i-1", "We need to reply to client email faster", InsightCategory::Relationships, 0.8),
        insight("i-2", "I want to learn statistics properly", InsightCategory::Career, 0.8),
        insight("i-3", "Automate the weekly report", InsightCategory::Finance, 0.8),
        insight("i-4", "Decide between two job offers", InsightCategory::Creativity, 0.8),
    ];

    let result = pipeline
        .generate_recommendations(&insights, &AnalysisContext::default(), Some(&config))
        .await;

    assert_eq!(engine.calls.load(Ordering::SeqCst), 4);
    assert!(engine.peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(result.recommendations.len(), 4);
    assert!(result
        .recommendations
        .iter()
        .all(|r| r.generation_method == GenerationMethod::Ai));
    Ok(())
}

#[tokio::test]
async fn test_recommendation_bound_and_summary() -> Result<()> {
    let pipeline = RecommendationPipeline::with_default_templates(AdvisorConfig::default())?;
    let config = GenerationConfig {
        max_recommendations: 3,
        priority_recommendation_count: 2,
        ..GenerationConfig::default()
    };
    let insights = vec![
        insight("i-1", "I need to improve my daily planning routine", InsightCategory::Productivity, 0.9),
        insight("i-2", "I want to learn to decide faster", InsightCategory::Learning, 0.85),
        insight("i-3", "Sleep improves after evening walks", InsightCategory::Wellbeing, 0.8),
    ];

    let result = pipeline
        .generate_recommendations(&insights, &AnalysisContext::default(), Some(&config))
        .await;

    assert!(result.total_opportunities > 3);
    assert_eq!(result.recommendations.len(), 3);
    assert_eq!(result.recommendations_generated, 3);
    assert_eq!(result.priority_recommendations.len(), 2);
    assert_eq!(result.priority_recommendations[0], result.recommendations[0].id);
    assert!(result.average_confidence > 0.0 && result.average_confidence <= 1.0);
    assert!((0.0..=1.0).contains(&result.diversity_score));
    assert!(result.warnings.iter().any(|w| w.contains("trimmed to the top 3")));
    Ok(())
}

#[tokio::test]
async fn test_invalid_override_returns_zero_result() -> Result<()> {
    let pipeline = RecommendationPipeline::with_default_templates(AdvisorConfig::default())?;
    let config = GenerationConfig {
        max_recommendations: 0,
        ..GenerationConfig::default()
    };
    let insights = vec![insight("i-1", "Automate invoices", InsightCategory::Finance, 0.9)];

    let result = pipeline
        .generate_recommendations(&insights, &AnalysisContext::default(), Some(&config))
        .await;

    assert!(result.recommendations.is_empty());
    assert_eq!(result.total_opportunities, 0);
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].contains("max_recommendations"));
    Ok(())
}

#[test]
fn test_update_config_validates() -> Result<()> {
    let mut pipeline = RecommendationPipeline::with_default_templates(AdvisorConfig::default())?;
    let mut bad = AdvisorConfig::default();
    bad.prioritization.similarity_threshold = 2.0;
    assert!(pipeline.update_config(bad).is_err());
    assert_eq!(pipeline.config().prioritization.similarity_threshold, 0.7);

    let mut good = AdvisorConfig::default();
    good.generation.max_recommendations = 4;
    pipeline.update_config(good)?;
    assert_eq!(pipeline.config().generation.max_recommendations, 4);
    Ok(())
}

#[test]
fn test_template_round_trip_leaves_no_placeholders() -> Result<()> {
    let registry = Arc::new(TemplateRegistry::with_default_templates()?);
    let generator = RecommendationGenerator::new(registry.clone());
    let source = insight(
        "i-1",
        "Deep work happens before ten",
        InsightCategory::Productivity,
        0.8,
    );

    for template in registry.list_templates() {
        let opp = opportunity(source.clone(), template.recommendation_type);
        let rec = generator.fill_template(&template, &opp, &AnalysisContext::default())?;
        for text in std::iter::once(&rec.title)
            .chain(std::iter::once(&rec.description))
            .chain(rec.action_steps.iter().map(|s| &s.description))
        {
            assert!(!text.contains("{{"), "{}: {}", template.id, text);
        }
    }
    Ok(())
}

const TEMPLATED_NOTE: &str = "I need to improve how {{date}} headers are filled in daily notes";

#[test]
fn test_template_syntax_in_insight_fills_every_template() -> Result<()> {
    let registry = Arc::new(TemplateRegistry::with_default_templates()?);
    let generator = RecommendationGenerator::new(registry.clone());
    let source = insight("i-1", TEMPLATED_NOTE, InsightCategory::Productivity, 0.8);

    for template in registry.list_templates() {
        let opp = opportunity(source.clone(), template.recommendation_type);
        let rec = generator.fill_template(&template, &opp, &AnalysisContext::default())?;
        assert!(!rec.title.is_empty(), "{}", template.id);
        if template.description_template.contains("{{insight_description}}") {
            assert!(rec.description.contains("{{date}}"), "{}: {}", template.id, rec.description);
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_template_syntax_in_insight_still_yields_recommendations() -> Result<()> {
    let mut config = AdvisorConfig::default();
    config.generation.enable_prioritization = false;
    let pipeline = RecommendationPipeline::with_default_templates(config)?;
    let insights = vec![insight("i-1", TEMPLATED_NOTE, InsightCategory::Productivity, 0.8)];

    let result = pipeline
        .generate_recommendations(&insights, &AnalysisContext::default(), None)
        .await;

    assert!(result.total_opportunities > 0);
    assert!(!result.recommendations.is_empty());
    assert!(
        !result.warnings.iter().any(|w| w.starts_with("Skipped")),
        "{:?}",
        result.warnings
    );
    Ok(())
}

#[test]
fn test_custom_template_variables_are_filled() -> Result<()> {
    let registry = Arc::new(TemplateRegistry::new());
    registry.add_template(RecommendationTemplate::new(
        "custom",
        RecommendationType::Goal,
        "{{category}}: {{insight_topic}}",
        "{{insight_description}} leads to {{suggested_outcome}}",
        vec!["Reflect on {{insight_topic}}".to_string()],
        0.5,
    ))?;
    let generator = RecommendationGenerator::new(registry);
    let opp = opportunity(
        insight("i-1", "Quarterly goals slip in March.", InsightCategory::Goals, 0.8),
        RecommendationType::Goal,
    );

    let rec = generator
        .generate_from_template(&opp, &AnalysisContext::default())?
        .expect("template matched");

    assert_eq!(rec.title, "goals: Quarterly goals slip");
    assert_eq!(
        rec.description,
        "Quarterly goals slip in March leads to high impact on productivity"
    );
    assert_eq!(rec.template_id.as_deref(), Some("custom"));
    Ok(())
}

#[test]
fn test_shared_source_always_clusters() -> Result<()> {
    let generator = RecommendationGenerator::new(Arc::new(TemplateRegistry::with_default_templates()?));
    let context = AnalysisContext::default();
    let shared = insight("i-1", "Deep work happens before ten", InsightCategory::Productivity, 0.8);
    let other = insight("i-2", "Pick a pension provider", InsightCategory::Finance, 0.8);

    let first = generator
        .generate_from_template(&opportunity(shared.clone(), RecommendationType::Action), &context)?
        .expect("action");
    let second = generator
        .generate_from_template(&opportunity(shared, RecommendationType::Learning), &context)?
        .expect("learning");
    let unrelated = generator
        .generate_from_template(&opportunity(other, RecommendationType::Decision), &context)?
        .expect("decision");

    let clusters = RecommendationClusterer::new().cluster(&[first.clone(), unrelated.clone(), second.clone()]);

    assert_eq!(clusters.len(), 1);
    let members: Vec<&str> = clusters[0]
        .recommendations
        .iter()
        .map(|r| r.id.as_str())
        .collect();
    assert!(members.contains(&first.id.as_str()));
    assert!(members.contains(&second.id.as_str()));
    assert!(!members.contains(&unrelated.id.as_str()));
    assert_eq!(clusters[0].theme, "productivity");
    assert!(clusters[0].conflicts.is_empty());
    assert!(clusters[0]
        .synergies
        .iter()
        .any(|s| s.contains("same insight i-1")));
    Ok(())
}

#[test]
fn test_identifier_feeds_generator() -> Result<()> {
    let identifier = OpportunityIdentifier::new(0.4);
    let generator = RecommendationGenerator::new(Arc::new(TemplateRegistry::with_default_templates()?));
    let opportunities = identifier.identify(&[insight(
        "i-1",
        "Sleep improves after evening walks",
        InsightCategory::Wellbeing,
        0.7,
    )]);

    assert_eq!(opportunities.len(), 2);
    for opp in &opportunities {
        let rec = generator
            .generate_from_template(opp, &AnalysisContext::default())?
            .expect("default template");
        assert_eq!(rec.source_insights, vec!["i-1".to_string()]);
        assert!(!rec.action_steps.is_empty());
    }
    Ok(())
}
