use advisor_core::recommendation::*;
use advisor_core::types::InsightCategory;
use chrono::Utc;

/// Template-generated recommendation with mid-range scores
pub(crate) fn recommendation(
    id: &str,
    recommendation_type: RecommendationType,
    category: InsightCategory,
    source: &str,
) -> GeneratedRecommendation {
    GeneratedRecommendation {
        id: id.to_string(),
        title: format!("Recommendation {}", id),
        description: format!("Details for {}", id),
        recommendation_type,
        category,
        urgency: Urgency::Medium,
        difficulty: Difficulty::Moderate,
        timeframe: RecommendationTimeframe::MediumTerm,
        directness: Directness::Recommendation,
        confidence: 0.6,
        relevance_score: 0.6,
        impact_potential: 0.5,
        feasibility_score: 0.6,
        source_insights: vec![source.to_string()],
        evidence: Vec::new(),
        action_steps: ActionStep::sequence(id, &["Do the thing".to_string()]),
        risks: Vec::new(),
        prerequisites: Vec::new(),
        alternatives: Vec::new(),
        success_metrics: Vec::new(),
        tracking_methods: Vec::new(),
        review_timeframe: "2 weeks".to_string(),
        generated_at: Utc::now(),
        generation_method: GenerationMethod::Template,
        template_id: None,
        tags: Vec::new(),
    }
}
