use advisor_core::scoring::insight_similarity;
use log::debug;

use super::types::ScoredInsight;

/// Drop near-duplicate insights, keeping the higher-scored member of each pair.
///
/// `scored` must already be sorted by descending total score; on equal scores
/// the earlier entry is kept. An insight survives while it is similar to fewer
/// than `max_similar` already-kept insights. Returns the number rejected.
pub(crate) fn filter_redundant(
    scored: &mut [ScoredInsight<'_>],
    threshold: f64,
    max_similar: usize,
) -> usize {
    let mut kept: Vec<usize> = Vec::new();
    let mut rejected = 0;

    for index in 0..scored.len() {
        if !scored[index].is_active() {
            continue;
        }

        let mut similar_count = 0;
        let mut closest: Option<(usize, f64)> = None;
        for &kept_index in &kept {
            let similarity = insight_similarity(scored[kept_index].insight, scored[index].insight);
            if similarity > threshold {
                similar_count += 1;
                if closest.map_or(true, |(_, best)| similarity > best) {
                    closest = Some((kept_index, similarity));
                }
            }
        }

        match closest {
            Some((kept_index, similarity)) if similar_count >= max_similar => {
                let kept_id = scored[kept_index].insight.id.clone();
                debug!(
                    "Insight {} redundant with {} (similarity {:.2})",
                    scored[index].insight.id, kept_id, similarity
                );
                scored[index].reject(format!(
                    "Too similar to insight {} (similarity {:.2})",
                    kept_id, similarity
                ));
                rejected += 1;
            }
            _ => kept.push(index),
        }
    }

    rejected
}
