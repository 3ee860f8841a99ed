use advisor_core::config::PrioritizationOptions;
use advisor_core::error::{AdvisorError, AdvisorResult};
use advisor_core::scoring::{self, ScoreComponents, NEUTRAL_RECENCY};
use advisor_core::types::{AnalysisContext, Insight, InsightCategory, InsightType};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use super::balancing::balance_groups;
use super::redundancy::filter_redundant;
use super::types::*;

/// Filters, scores, balances and selects a bounded subset of insights
#[derive(Debug, Clone)]
pub struct InsightPrioritizationEngine {
    options: PrioritizationOptions,
}

impl InsightPrioritizationEngine {
    /// Create an engine, rejecting invalid weights or thresholds up front
    pub fn new(options: PrioritizationOptions) -> AdvisorResult<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &PrioritizationOptions {
        &self.options
    }

    /// Prioritize insights relative to the current time
    pub fn prioritize_insights(
        &self,
        insights: &[Insight],
        context: &AnalysisContext,
    ) -> AdvisorResult<PrioritizationResult> {
        self.prioritize_insights_at(insights, context, Utc::now())
    }

    /// Prioritize insights relative to `now`.
    ///
    /// Data-quality problems never fail the run: they are reported in
    /// `warnings` and `rejected`. Only an internal inconsistency returns an
    /// error.
    pub fn prioritize_insights_at(
        &self,
        insights: &[Insight],
        context: &AnalysisContext,
        now: DateTime<Utc>,
    ) -> AdvisorResult<PrioritizationResult> {
        let started = Instant::now();
        let options = &self.options;
        let mut warnings = Vec::new();
        let mut rejected = Vec::new();

        // Initial filtering
        let candidates = self.filter_insights(insights, &mut rejected);
        let dropped = insights.len() - candidates.len();
        if dropped > 0 {
            let message = format!(
                "{} of {} insights dropped by minimum thresholds",
                dropped,
                insights.len()
            );
            warn!("{}", message);
            warnings.push(message);
        }

        // Scoring
        let mut scored: Vec<ScoredInsight<'_>> = candidates
            .into_iter()
            .map(|insight| ScoredInsight {
                insight,
                score: self.score_insight(insight, now),
            })
            .collect();
        self.ensure_finite(&scored, insights.len())?;
        sort_and_rank(&mut scored);

        if options.enable_diversity_boost {
            apply_diversity_boost(&mut scored, options.diversity_weight);
        }

        if options.enable_contextual_relevance {
            self.apply_contextual_relevance(&mut scored, context);
            sort_and_rank(&mut scored);
        } else if options.enable_diversity_boost {
            sort_and_rank(&mut scored);
        }
        self.ensure_finite(&scored, insights.len())?;

        if options.enable_redundancy_filtering {
            let removed = filter_redundant(
                &mut scored,
                options.similarity_threshold,
                options.max_similar_insights,
            );
            if removed > 0 {
                let message = format!("{} redundant insights removed", removed);
                info!("{}", message);
                warnings.push(message);
            }
        }

        if options.enable_category_balancing {
            warnings.extend(balance_groups(
                &mut scored,
                "Category",
                |entry| entry.insight.category,
                |category: InsightCategory| options.category_limit(category),
                options.min_per_category,
            ));
        }
        if options.enable_type_balancing {
            warnings.extend(balance_groups(
                &mut scored,
                "Type",
                |entry| entry.insight.insight_type,
                |insight_type: InsightType| options.type_limit(insight_type),
                options.min_per_type,
            ));
        }

        // Final selection
        sort_and_rank(&mut scored);
        let mut selected_count = 0;
        for entry in scored.iter_mut() {
            if entry.is_active() && selected_count < options.max_insights {
                entry.score.selected = true;
                selected_count += 1;
            } else {
                entry.score.selected = false;
                if entry.score.rejection_reason.is_none() {
                    entry.score.rejection_reason = Some(BELOW_SELECTION_THRESHOLD.to_string());
                }
            }
        }

        let result = assemble_result(scored, rejected, warnings, started);
        debug!(
            "Prioritized {} insights: {} selected, {} rejected",
            insights.len(),
            result.selected_insights.len(),
            result.rejected.len()
        );
        Ok(result)
    }

    fn filter_insights<'a>(
        &self,
        insights: &'a [Insight],
        rejected: &mut Vec<RejectedInsight>,
    ) -> Vec<&'a Insight> {
        let options = &self.options;
        let mut kept = Vec::with_capacity(insights.len());

        for insight in insights {
            let reason = if !insight.has_valid_scores() {
                Some("Invalid score values (expected finite numbers within [0, 1])".to_string())
            } else if insight.confidence < options.min_confidence_threshold {
                Some(format!(
                    "Confidence {:.2} below minimum {:.2}",
                    insight.confidence, options.min_confidence_threshold
                ))
            } else if insight.importance < options.min_importance {
                Some(format!(
                    "Importance {:.2} below minimum {:.2}",
                    insight.importance, options.min_importance
                ))
            } else if insight.actionability < options.min_actionability {
                Some(format!(
                    "Actionability {:.2} below minimum {:.2}",
                    insight.actionability, options.min_actionability
                ))
            } else if insight.novelty < options.min_novelty {
                Some(format!(
                    "Novelty {:.2} below minimum {:.2}",
                    insight.novelty, options.min_novelty
                ))
            } else if options.require_evidence
                && insight.evidence.len() < options.min_evidence_count
            {
                Some(format!(
                    "Insufficient evidence ({} of {} required items)",
                    insight.evidence.len(),
                    options.min_evidence_count
                ))
            } else {
                None
            };

            match reason {
                Some(reason) => {
                    debug!("Dropping insight {}: {}", insight.id, reason);
                    rejected.push(RejectedInsight {
                        insight_id: insight.id.clone(),
                        reason,
                        total_score: None,
                    });
                }
                None => kept.push(insight),
            }
        }
        kept
    }

    fn score_insight(&self, insight: &Insight, now: DateTime<Utc>) -> InsightScore {
        let options = &self.options;
        let recency = if options.enable_temporal_scoring {
            scoring::recency_score(
                insight.timeframe.end,
                now,
                options.recency_window_days,
                options.recency_decay_factor,
            )
        } else {
            NEUTRAL_RECENCY
        };

        let components = ScoreComponents {
            confidence: insight.confidence,
            importance: insight.importance,
            recency,
            frequency: scoring::frequency_score(
                insight.evidence.len(),
                insight.related_insights.len(),
            ),
            novelty: insight.novelty,
            actionability: insight.actionability,
        };

        InsightScore {
            insight_id: insight.id.clone(),
            total_score: components.weighted_total(&options.weights),
            weighted_scores: components.weighted(&options.weights),
            components,
            diversity_score: None,
            contextual_score: None,
            rank: 0,
            selected: false,
            rejection_reason: None,
        }
    }

    fn apply_contextual_relevance(
        &self,
        scored: &mut [ScoredInsight<'_>],
        context: &AnalysisContext,
    ) {
        let tables = &self.options.relevance_tables;
        for entry in scored.iter_mut() {
            let purpose = tables.purpose_alignment(context.purpose, entry.insight.category);
            let audience = tables.audience_relevance(context.audience, entry.insight.insight_type);
            let relevance = (purpose + audience) / 2.0;
            entry.score.contextual_score = Some(relevance);
            entry.score.total_score += relevance * self.options.context_weight;
        }
    }

    fn ensure_finite(&self, scored: &[ScoredInsight<'_>], input_count: usize) -> AdvisorResult<()> {
        match scored.iter().find(|s| !s.score.total_score.is_finite()) {
            Some(bad) => Err(AdvisorError::internal(
                format!("prioritization of {} insights", input_count),
                format!("non-finite total score for insight {}", bad.insight.id),
            )),
            None => Ok(()),
        }
    }
}

/// Stable descending sort by total score, then 1-based ranks
fn sort_and_rank(scored: &mut [ScoredInsight<'_>]) {
    scored.sort_by(|a, b| b.score.total_score.total_cmp(&a.score.total_score));
    for (index, entry) in scored.iter_mut().enumerate() {
        entry.score.rank = index + 1;
    }
}

/// Boost insights whose category and type are rare in the candidate set.
///
/// The diversity score averages `1 - sameCategory/N` and `1 - sameType/N`,
/// where the counts are other candidates sharing the insight's category/type.
fn apply_diversity_boost(scored: &mut [ScoredInsight<'_>], weight: f64) {
    let n = scored.len();
    if n == 0 {
        return;
    }
    let mut categories: HashMap<InsightCategory, usize> = HashMap::new();
    let mut types: HashMap<InsightType, usize> = HashMap::new();
    for entry in scored.iter() {
        *categories.entry(entry.insight.category).or_default() += 1;
        *types.entry(entry.insight.insight_type).or_default() += 1;
    }

    for entry in scored.iter_mut() {
        let same_category = categories[&entry.insight.category] - 1;
        let same_type = types[&entry.insight.insight_type] - 1;
        let diversity = ((1.0 - same_category as f64 / n as f64)
            + (1.0 - same_type as f64 / n as f64))
            / 2.0;
        entry.score.diversity_score = Some(diversity);
        entry.score.total_score += diversity * weight;
    }
}

fn assemble_result(
    scored: Vec<ScoredInsight<'_>>,
    mut rejected: Vec<RejectedInsight>,
    warnings: Vec<String>,
    started: Instant,
) -> PrioritizationResult {
    let mut selected_insights = Vec::new();
    let mut all_scores = Vec::with_capacity(scored.len());
    let mut category_distribution: BTreeMap<InsightCategory, usize> = BTreeMap::new();
    let mut type_distribution: BTreeMap<InsightType, usize> = BTreeMap::new();

    for entry in scored {
        if entry.score.selected {
            *category_distribution
                .entry(entry.insight.category)
                .or_default() += 1;
            *type_distribution
                .entry(entry.insight.insight_type)
                .or_default() += 1;
            selected_insights.push(entry.insight.clone());
        } else {
            rejected.push(RejectedInsight {
                insight_id: entry.score.insight_id.clone(),
                reason: entry
                    .score
                    .rejection_reason
                    .clone()
                    .unwrap_or_else(|| BELOW_SELECTION_THRESHOLD.to_string()),
                total_score: Some(entry.score.total_score),
            });
        }
        all_scores.push(entry.score);
    }

    let mean = |f: fn(&Insight) -> f64| -> f64 {
        if selected_insights.is_empty() {
            0.0
        } else {
            selected_insights.iter().map(f).sum::<f64>() / selected_insights.len() as f64
        }
    };
    let average_confidence = mean(|i| i.confidence);
    let average_importance = mean(|i| i.importance);
    let average_actionability = mean(|i| i.actionability);

    PrioritizationResult {
        score_distribution: ScoreDistribution::from_scores(
            all_scores.iter().map(|s| s.total_score),
        ),
        diversity_index: scoring::shannon_index(category_distribution.values().copied()),
        selected_insights,
        all_scores,
        rejected,
        category_distribution,
        type_distribution,
        average_confidence,
        average_importance,
        average_actionability,
        warnings,
        processing_time_ms: started.elapsed().as_millis() as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_core::types::{EvidenceItem, InsightType};
    use chrono::Duration;

    fn insight(id: &str, title: &str, category: InsightCategory, confidence: f64) -> Insight {
        Insight::new(
            id,
            title,
            format!("Description for {}", title),
            category,
            InsightType::Pattern,
        )
        .with_scores(confidence, 0.5, 0.5, 0.5)
    }

    fn plain_options() -> PrioritizationOptions {
        PrioritizationOptions {
            enable_diversity_boost: false,
            enable_contextual_relevance: false,
            enable_redundancy_filtering: false,
            enable_category_balancing: false,
            enable_type_balancing: false,
            enable_temporal_scoring: false,
            ..PrioritizationOptions::default()
        }
    }

    #[test]
    fn test_invalid_options_rejected_at_construction() {
        let options = PrioritizationOptions {
            similarity_threshold: 1.5,
            ..PrioritizationOptions::default()
        };
        assert!(matches!(
            InsightPrioritizationEngine::new(options),
            Err(AdvisorError::Configuration { .. })
        ));
    }

    #[test]
    fn test_recency_disabled_is_neutral() {
        let engine = InsightPrioritizationEngine::new(plain_options()).unwrap();
        let now = Utc::now();
        let old = insight("a", "Old", InsightCategory::Goals, 0.9)
            .with_timeframe_end(now - Duration::days(300));
        let score = engine.score_insight(&old, now);
        assert_eq!(score.components.recency, NEUTRAL_RECENCY);
    }

    #[test]
    fn test_evidence_requirement_filters() {
        let options = PrioritizationOptions {
            require_evidence: true,
            min_evidence_count: 2,
            ..plain_options()
        };
        let engine = InsightPrioritizationEngine::new(options).unwrap();
        let with_evidence = insight("a", "Alpha", InsightCategory::Goals, 0.9).with_evidence(vec![
            EvidenceItem::new("one", "a.md"),
            EvidenceItem::new("two", "b.md"),
        ]);
        let without = insight("b", "Beta", InsightCategory::Goals, 0.9);
        let result = engine
            .prioritize_insights(&[with_evidence, without], &AnalysisContext::default())
            .unwrap();
        assert_eq!(result.selected_insights.len(), 1);
        assert_eq!(result.selected_insights[0].id, "a");
        assert!(result.rejected[0].reason.contains("Insufficient evidence"));
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_invalid_scores_are_dropped_not_fatal() {
        let engine = InsightPrioritizationEngine::new(plain_options()).unwrap();
        let bad = insight("bad", "Bad", InsightCategory::Goals, f64::NAN);
        let good = insight("good", "Good", InsightCategory::Goals, 0.8);
        let result = engine
            .prioritize_insights(&[bad, good], &AnalysisContext::default())
            .unwrap();
        assert_eq!(result.selected_insights.len(), 1);
        assert!(result.score_for("bad").is_none());
    }

    #[test]
    fn test_diversity_boost_favours_rare_categories() {
        let options = PrioritizationOptions {
            enable_diversity_boost: true,
            diversity_weight: 0.5,
            ..plain_options()
        };
        let engine = InsightPrioritizationEngine::new(options).unwrap();
        let insights = vec![
            insight("a", "Alpha", InsightCategory::Goals, 0.7),
            insight("b", "Beta", InsightCategory::Goals, 0.7),
            insight("c", "Gamma", InsightCategory::Health, 0.7),
        ];
        let result = engine
            .prioritize_insights(&insights, &AnalysisContext::default())
            .unwrap();
        let rare = result.score_for("c").unwrap();
        let common = result.score_for("a").unwrap();
        assert!(rare.diversity_score.unwrap() > common.diversity_score.unwrap());
        assert_eq!(rare.rank, 1);
    }

    #[test]
    fn test_result_statistics() {
        let engine = InsightPrioritizationEngine::new(plain_options()).unwrap();
        let insights = vec![
            insight("a", "Alpha", InsightCategory::Goals, 0.8),
            insight("b", "Beta", InsightCategory::Health, 0.6),
        ];
        let result = engine
            .prioritize_insights(&insights, &AnalysisContext::default())
            .unwrap();
        assert_eq!(result.category_distribution.len(), 2);
        assert!((result.diversity_index - 2f64.ln()).abs() < 1e-9);
        assert!((result.average_confidence - 0.7).abs() < 1e-9);
        assert_eq!(result.score_distribution.buckets.iter().sum::<usize>(), 2);
    }
}
