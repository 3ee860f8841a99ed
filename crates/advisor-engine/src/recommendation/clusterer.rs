use advisor_core::recommendation::{GeneratedRecommendation, RecommendationCluster};
use std::collections::{BTreeSet, VecDeque};

pub const MIXED_THEME: &str = "Related recommendations";

/// Related when they share a type, a category or a source insight
pub fn are_related(a: &GeneratedRecommendation, b: &GeneratedRecommendation) -> bool {
    a.recommendation_type == b.recommendation_type
        || a.category == b.category
        || a.shares_source_with(b)
}

/// Groups related recommendations into thematic clusters
#[derive(Debug, Clone, Default)]
pub struct RecommendationClusterer;

impl RecommendationClusterer {
    pub fn new() -> Self {
        Self
    }

    /// Single pass over the recommendations in order. Each unclustered
    /// recommendation seeds a cluster that absorbs every unclustered
    /// recommendation reachable through the relatedness relation. Singletons
    /// are not emitted.
    pub fn cluster(&self, recommendations: &[GeneratedRecommendation]) -> Vec<RecommendationCluster> {
        let mut processed = vec![false; recommendations.len()];
        let mut clusters = Vec::new();

        for seed in 0..recommendations.len() {
            if processed[seed] {
                continue;
            }
            processed[seed] = true;

            let mut members = vec![seed];
            let mut queue = VecDeque::from([seed]);
            while let Some(current) = queue.pop_front() {
                for candidate in 0..recommendations.len() {
                    if !processed[candidate]
                        && are_related(&recommendations[current], &recommendations[candidate])
                    {
                        processed[candidate] = true;
                        members.push(candidate);
                        queue.push_back(candidate);
                    }
                }
            }

            if members.len() > 1 {
                members.sort_unstable();
                let members: Vec<GeneratedRecommendation> = members
                    .into_iter()
                    .map(|i| recommendations[i].clone())
                    .collect();
                clusters.push(self.build_cluster(clusters.len() + 1, members));
            }
        }

        clusters
    }

    fn build_cluster(&self, index: usize, members: Vec<GeneratedRecommendation>) -> RecommendationCluster {
        let combined_impact =
            members.iter().map(|r| r.impact_potential).sum::<f64>() / members.len() as f64;

        let mut by_confidence: Vec<&GeneratedRecommendation> = members.iter().collect();
        by_confidence.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        let priority_order = by_confidence.iter().map(|r| r.id.clone()).collect();

        RecommendationCluster {
            id: format!("cluster-{}", index),
            theme: theme(&members),
            combined_impact,
            synergies: synergies(&members),
            conflicts: detect_conflicts(&members),
            priority_order,
            recommendations: members,
        }
    }
}

fn theme(members: &[GeneratedRecommendation]) -> String {
    let types: BTreeSet<_> = members.iter().map(|r| r.recommendation_type).collect();
    let categories: BTreeSet<_> = members.iter().map(|r| r.category).collect();
    if types.len() == 1 {
        types.iter().map(|t| t.to_string()).collect()
    } else if categories.len() == 1 {
        categories.iter().map(|c| c.to_string()).collect()
    } else {
        MIXED_THEME.to_string()
    }
}

fn synergies(members: &[GeneratedRecommendation]) -> Vec<String> {
    let mut shared_sources = BTreeSet::new();
    for (i, a) in members.iter().enumerate() {
        for b in &members[i + 1..] {
            shared_sources.extend(
                a.source_insights
                    .iter()
                    .filter(|id| b.source_insights.contains(id))
                    .cloned(),
            );
        }
    }

    let mut synergies: Vec<String> = shared_sources
        .into_iter()
        .map(|id| format!("Builds on the same insight {}", id))
        .collect();
    let categories: BTreeSet<_> = members.iter().map(|r| r.category).collect();
    if categories.len() == 1 {
        synergies.push(format!("All address {}", members[0].category));
    }
    synergies
}

/// Extension point for conflicting advice within a cluster.
///
/// Always empty: no conflict rules exist yet, so an empty list does not mean
/// the members were checked and found compatible.
pub fn detect_conflicts(_members: &[GeneratedRecommendation]) -> Vec<String> {
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendation::fixtures::recommendation;
    use advisor_core::recommendation::RecommendationType;
    use advisor_core::types::InsightCategory;

    #[test]
    fn test_relatedness_is_transitive_within_a_cluster() {
        // a~b share a type, b~c share a category; a and c are unrelated directly
        let a = recommendation("a", RecommendationType::Habit, InsightCategory::Health, "i-1");
        let b = recommendation("b", RecommendationType::Habit, InsightCategory::Finance, "i-2");
        let c = recommendation("c", RecommendationType::Decision, InsightCategory::Finance, "i-3");
        let loner = recommendation("d", RecommendationType::Learning, InsightCategory::Career, "i-4");
        assert!(!are_related(&a, &c));

        let clusters = RecommendationClusterer::new().cluster(&[a, b, c, loner]);

        assert_eq!(clusters.len(), 1);
        let ids: Vec<_> = clusters[0].recommendations.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(clusters[0].id, "cluster-1");
        assert_eq!(clusters[0].theme, MIXED_THEME);
        assert!(clusters[0].conflicts.is_empty());
    }

    #[test]
    fn test_theme_and_synergies() {
        let mut a = recommendation("a", RecommendationType::Health, InsightCategory::Wellbeing, "i-1");
        a.confidence = 0.5;
        let b = recommendation("b", RecommendationType::Habit, InsightCategory::Wellbeing, "i-1");

        let clusters = RecommendationClusterer::new().cluster(&[a, b]);

        assert_eq!(clusters.len(), 1);
        let cluster = &clusters[0];
        assert_eq!(cluster.theme, "wellbeing");
        assert!(cluster
            .synergies
            .contains(&"Builds on the same insight i-1".to_string()));
        assert!(cluster.synergies.contains(&"All address wellbeing".to_string()));
        assert_eq!(cluster.priority_order, vec!["b".to_string(), "a".to_string()]);
        assert!((cluster.combined_impact - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_unrelated_recommendations_form_no_clusters() {
        let a = recommendation("a", RecommendationType::Habit, InsightCategory::Health, "i-1");
        let b = recommendation("b", RecommendationType::Decision, InsightCategory::Finance, "i-2");
        assert!(RecommendationClusterer::new().cluster(&[a, b]).is_empty());
    }
}
