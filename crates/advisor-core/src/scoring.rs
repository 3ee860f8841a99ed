//! Pure scoring primitives shared by insight prioritization and recommendation
//! generation. Nothing here allocates state beyond its return value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::ScoringWeights;
use crate::types::{EvidenceItem, Insight};
use crate::utils::text;

/// Recency never drops below this once an insight falls outside the window
pub const RECENCY_FLOOR: f64 = 0.1;
/// Recency reported when temporal scoring is disabled
pub const NEUTRAL_RECENCY: f64 = 0.5;

const SECONDS_PER_DAY: f64 = 86_400.0;

pub fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// The six per-insight component scores, each in [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreComponents {
    pub confidence: f64,
    pub importance: f64,
    pub recency: f64,
    pub frequency: f64,
    pub novelty: f64,
    pub actionability: f64,
}

impl ScoreComponents {
    /// Component scores multiplied by their weights
    pub fn weighted(&self, weights: &ScoringWeights) -> ScoreComponents {
        ScoreComponents {
            confidence: self.confidence * weights.confidence,
            importance: self.importance * weights.importance,
            recency: self.recency * weights.recency,
            frequency: self.frequency * weights.frequency,
            novelty: self.novelty * weights.novelty,
            actionability: self.actionability * weights.actionability,
        }
    }

    /// Weighted sum of the components divided by the sum of weights
    pub fn weighted_total(&self, weights: &ScoringWeights) -> f64 {
        let w = self.weighted(weights);
        let sum = w.confidence + w.importance + w.recency + w.frequency + w.novelty + w.actionability;
        let total_weight = weights.total();
        if total_weight <= 0.0 {
            0.0
        } else {
            sum / total_weight
        }
    }
}

/// Exponential recency decay.
///
/// `exp(-decay * days / window)`, floored at [`RECENCY_FLOOR`] once the
/// timeframe ended more than `window_days` ago. Timeframes ending in the
/// future count as ending now.
pub fn recency_score(
    end: DateTime<Utc>,
    now: DateTime<Utc>,
    window_days: f64,
    decay_factor: f64,
) -> f64 {
    let days = ((now - end).num_seconds() as f64 / SECONDS_PER_DAY).max(0.0);
    let raw = (-decay_factor * days / window_days).exp();
    let score = if days > window_days {
        raw.max(RECENCY_FLOOR)
    } else {
        raw
    };
    clamp01(score)
}

/// `0.7 * min(evidence/10, 1) + 0.3 * min(related/5, 1)`
pub fn frequency_score(evidence_count: usize, related_count: usize) -> f64 {
    let evidence = (evidence_count as f64 / 10.0).min(1.0);
    let related = (related_count as f64 / 5.0).min(1.0);
    0.7 * evidence + 0.3 * related
}

/// Mean evidence relevance, discounted when there is little evidence
pub fn evidence_quality(evidence: &[EvidenceItem]) -> f64 {
    if evidence.is_empty() {
        return 0.0;
    }
    let mean = evidence
        .iter()
        .map(|e| clamp01(e.relevance_score))
        .sum::<f64>()
        / evidence.len() as f64;
    let coverage = (evidence.len() as f64 / 5.0).min(1.0);
    clamp01(mean * (0.5 + 0.5 * coverage))
}

pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// `|A ∩ B| / min(|A|, |B|)`
pub fn overlap_coefficient(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let smaller = a.len().min(b.len());
    if smaller == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / smaller as f64
}

/// Keyword set for an insight: its own keywords when supplied, otherwise
/// extracted from title and description.
pub fn insight_keywords(insight: &Insight) -> HashSet<String> {
    if insight.keywords.is_empty() {
        text::extract_keywords(&format!("{} {}", insight.title, insight.description))
    } else {
        text::normalize_keywords(insight.keywords.iter())
    }
}

/// Composite similarity:
/// `0.4*titleJaccard + 0.3*descriptionJaccard + 0.2*keywordOverlap + 0.1*sameCategory`
pub fn insight_similarity(a: &Insight, b: &Insight) -> f64 {
    let title = jaccard(&text::word_set(&a.title), &text::word_set(&b.title));
    let description = jaccard(
        &text::word_set(&a.description),
        &text::word_set(&b.description),
    );
    let keywords = overlap_coefficient(&insight_keywords(a), &insight_keywords(b));
    let category = if a.category == b.category { 1.0 } else { 0.0 };
    0.4 * title + 0.3 * description + 0.2 * keywords + 0.1 * category
}

/// Shannon entropy (natural log) of a count distribution
pub fn shannon_index<I>(counts: I) -> f64
where
    I: IntoIterator<Item = usize>,
{
    let counts: Vec<usize> = counts.into_iter().filter(|c| *c > 0).collect();
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total as f64;
            -p * p.ln()
        })
        .sum()
}

/// Shannon entropy divided by its maximum over the non-empty buckets, in [0, 1]
pub fn normalized_shannon<I>(counts: I) -> f64
where
    I: IntoIterator<Item = usize>,
{
    let counts: Vec<usize> = counts.into_iter().filter(|c| *c > 0).collect();
    if counts.len() < 2 {
        return 0.0;
    }
    let max = (counts.len() as f64).ln();
    clamp01(shannon_index(counts) / max)
}
