use log::warn;
use std::collections::BTreeMap;
use std::fmt::Display;

use super::types::ScoredInsight;

/// Truncate each group of active insights to its limit.
///
/// Within a group, insights are ranked by descending score and
/// `max(minimum, min(limit, group_size))` of them are kept. Groups without a
/// limit are left untouched. Returns one warning per truncated group.
pub(crate) fn balance_groups<K, FK, FL>(
    scored: &mut [ScoredInsight<'_>],
    label: &str,
    key_of: FK,
    limit_of: FL,
    minimum: usize,
) -> Vec<String>
where
    K: Ord + Copy + Display,
    FK: Fn(&ScoredInsight<'_>) -> K,
    FL: Fn(K) -> Option<usize>,
{
    let mut groups: BTreeMap<K, Vec<usize>> = BTreeMap::new();
    for (index, entry) in scored.iter().enumerate() {
        if entry.is_active() {
            groups.entry(key_of(entry)).or_default().push(index);
        }
    }

    let mut warnings = Vec::new();
    for (key, mut members) in groups {
        let Some(limit) = limit_of(key) else {
            continue;
        };
        let size = members.len();
        let keep = minimum.max(limit.min(size)).min(size);
        if keep >= size {
            continue;
        }

        members.sort_by(|&a, &b| {
            scored[b]
                .score
                .total_score
                .total_cmp(&scored[a].score.total_score)
        });
        for &index in &members[keep..] {
            scored[index].reject(format!("{} '{}' limit of {} reached", label, key, limit));
        }

        let message = format!(
            "{} '{}' truncated from {} to {} insights",
            label, key, size, keep
        );
        warn!("{}", message);
        warnings.push(message);
    }
    warnings
}
