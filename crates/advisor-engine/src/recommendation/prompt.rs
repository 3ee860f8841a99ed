use advisor_core::types::AnalysisContext;

use super::opportunity::RecommendationOpportunity;

const SYSTEM_PROMPT: &str = "You are a personal productivity and wellbeing advisor. \
You turn observations from someone's own notes into one specific, realistic recommendation.";

const RESPONSE_SHAPE: &str = r#"Respond with a single JSON object and nothing else:
{
  "title": "short imperative title",
  "description": "two or three sentences explaining the recommendation",
  "actionSteps": ["ordered concrete steps"],
  "risks": ["what could get in the way"],
  "successMetrics": ["how progress will be measured"]
}"#;

/// System prompt used when the caller configures none
pub fn default_system_prompt() -> &'static str {
    SYSTEM_PROMPT
}

/// Prompt asking the completion engine for one structured recommendation
pub fn build_recommendation_prompt(
    opportunity: &RecommendationOpportunity,
    context: &AnalysisContext,
) -> String {
    let insight = &opportunity.insight;
    let factors = &context.factors;
    let describe = |value: Option<String>| value.unwrap_or_else(|| "unspecified".to_string());

    let mut evidence = String::new();
    for item in insight.evidence.iter().take(3) {
        evidence.push_str(&format!("- \"{}\" ({})\n", item.excerpt, item.document_path));
    }
    if evidence.is_empty() {
        evidence.push_str("- none recorded\n");
    }

    format!(
        "Insight: {}\nDescription: {}\nCategory: {}\nInsight type: {}\nConfidence: {:.2}\n\nSupporting evidence:\n{}\nRecommendation type: {}\nWhy this type: {}\nExpected impact: {}\n\nContext:\n- Purpose: {}\n- Audience: {}\n- Life phase: {}\n- Available time: {}\n- Stress level: {}\n- Work context: {}\n\nWrite a {} recommendation that fits this context.\n\n{}",
        insight.title,
        insight.description,
        insight.category,
        insight.insight_type,
        opportunity.confidence,
        evidence,
        opportunity.opportunity_type,
        opportunity.reasoning,
        opportunity.potential_impact,
        context.purpose,
        context.audience,
        describe(factors.life_phase.clone()),
        describe(factors.available_time.map(|t| t.to_string())),
        describe(factors.stress_level.map(|s| s.to_string())),
        describe(factors.work_context.clone()),
        opportunity.opportunity_type,
        RESPONSE_SHAPE
    )
}
