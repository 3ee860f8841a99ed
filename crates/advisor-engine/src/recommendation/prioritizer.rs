use advisor_core::recommendation::GeneratedRecommendation;
use advisor_core::scoring::clamp01;

/// `0.3*confidence + 0.3*impact + 0.2*feasibility + urgency bonus`, clamped to [0, 1]
pub fn priority_score(recommendation: &GeneratedRecommendation) -> f64 {
    clamp01(
        0.3 * recommendation.confidence
            + 0.3 * recommendation.impact_potential
            + 0.2 * recommendation.feasibility_score
            + recommendation.urgency.priority_bonus(),
    )
}

/// Final ordering of recommendations plus the summary tags
#[derive(Debug, Clone, Default)]
pub struct RecommendationPrioritizer;

impl RecommendationPrioritizer {
    pub fn new() -> Self {
        Self
    }

    /// Sort by descending priority score; equal scores keep their order
    pub fn prioritize(&self, mut recommendations: Vec<GeneratedRecommendation>) -> Vec<GeneratedRecommendation> {
        recommendations.sort_by(|a, b| priority_score(b).total_cmp(&priority_score(a)));
        recommendations
    }

    pub fn top_ids(&self, recommendations: &[GeneratedRecommendation], count: usize) -> Vec<String> {
        recommendations
            .iter()
            .take(count)
            .map(|r| r.id.clone())
            .collect()
    }

    pub fn quick_wins(&self, recommendations: &[GeneratedRecommendation]) -> Vec<String> {
        recommendations
            .iter()
            .filter(|r| r.is_quick_win())
            .map(|r| r.id.clone())
            .collect()
    }

    pub fn long_term_goals(&self, recommendations: &[GeneratedRecommendation]) -> Vec<String> {
        recommendations
            .iter()
            .filter(|r| r.is_long_term_goal())
            .map(|r| r.id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendation::fixtures::recommendation;
    use advisor_core::recommendation::{Difficulty, RecommendationTimeframe, RecommendationType, Urgency};
    use advisor_core::types::InsightCategory;

    #[test]
    fn test_urgency_lifts_priority() {
        let calm = recommendation("calm", RecommendationType::Habit, InsightCategory::Habits, "i-1");
        let mut pressing = calm.clone();
        pressing.id = "pressing".to_string();
        pressing.urgency = Urgency::Urgent;

        assert!((priority_score(&pressing) - priority_score(&calm) - 0.2).abs() < 1e-9);
        let ordered = RecommendationPrioritizer::new().prioritize(vec![calm, pressing]);
        assert_eq!(ordered[0].id, "pressing");
    }

    #[test]
    fn test_equal_scores_keep_input_order() {
        let a = recommendation("a", RecommendationType::Action, InsightCategory::Goals, "i-1");
        let b = recommendation("b", RecommendationType::Action, InsightCategory::Goals, "i-2");
        let ordered = RecommendationPrioritizer::new().prioritize(vec![a, b]);
        let ids: Vec<_> = ordered.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn test_summary_tags() {
        let mut quick = recommendation("quick", RecommendationType::Action, InsightCategory::Health, "i-1");
        quick.difficulty = Difficulty::Easy;
        quick.timeframe = RecommendationTimeframe::ShortTerm;
        quick.impact_potential = 0.7;
        let mut long = recommendation("long", RecommendationType::Learning, InsightCategory::Learning, "i-2");
        long.timeframe = RecommendationTimeframe::LongTerm;
        let recommendations = vec![quick, long];

        let prioritizer = RecommendationPrioritizer::new();
        assert_eq!(prioritizer.quick_wins(&recommendations), vec!["quick".to_string()]);
        assert_eq!(prioritizer.long_term_goals(&recommendations), vec!["long".to_string()]);
        assert_eq!(prioritizer.top_ids(&recommendations, 5).len(), 2);
        assert_eq!(prioritizer.top_ids(&recommendations, 1), vec!["quick".to_string()]);
    }
}
