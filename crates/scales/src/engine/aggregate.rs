use crate::evidence::EvidenceRow;
use std::collections::{BTreeMap, HashMap};

/// Scores keyed by component, pillar or index code. A missing key means
/// "no evidence", which is not the same thing as a zero score.
pub type ScoreMap = HashMap<String, f64>;

/// Arithmetic mean of every observation sharing a key.
///
/// Keys without rows never appear in the result.
pub fn average_by_key(rows: &[EvidenceRow]) -> ScoreMap {
    let mut grouped: HashMap<&str, Vec<f64>> = HashMap::new();
    for row in rows {
        grouped.entry(row.key.as_str()).or_default().push(row.value);
    }

    grouped
        .into_iter()
        .map(|(key, mut values)| {
            // Summing in a fixed order keeps the mean independent of row order.
            values.sort_by(f64::total_cmp);
            let total: f64 = values.iter().sum();
            (key.to_string(), total / values.len() as f64)
        })
        .collect()
}

/// Weighted average over the children that actually have a score.
///
/// Weights are renormalised over the present children only: a child without
/// evidence drops out of both numerator and denominator. Returns `None` when
/// no weighted child is present or the present weights sum to zero.
pub fn weighted_rollup(children: &ScoreMap, weights: &BTreeMap<String, f64>) -> Option<f64> {
    let present: Vec<(f64, f64)> = weights
        .iter()
        .filter_map(|(key, weight)| children.get(key).map(|score| (*score, *weight)))
        .collect();

    if present.is_empty() {
        return None;
    }

    let total_weight: f64 = present.iter().map(|(_, weight)| weight).sum();
    if total_weight <= 0.0 {
        return None;
    }

    Some(
        present
            .iter()
            .map(|(score, weight)| score * (weight / total_weight))
            .sum(),
    )
}

/// Plain weighted sum over the present children, `None` when none are present.
pub fn weighted_sum(children: &ScoreMap, weights: &BTreeMap<String, f64>) -> Option<f64> {
    let mut total: Option<f64> = None;
    for (key, weight) in weights {
        if let Some(score) = children.get(key) {
            *total.get_or_insert(0.0) += score * weight;
        }
    }
    total
}

/// Project `raw` from `[0, raw_max]` onto `[0, out_max]`.
pub fn normalize(raw: f64, raw_max: f64, out_max: f64) -> Option<f64> {
    if raw_max > 0.0 && raw_max.is_finite() {
        Some((raw / raw_max) * out_max)
    } else {
        None
    }
}

/// Presentation rounding to one decimal place.
///
/// Rounds the exact binary value half-to-even, so a stored 24.9499.. stays
/// at 24.9 instead of crossing the 25 boundary.
pub fn round_one(value: f64) -> f64 {
    format!("{value:.1}").parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(key: &str, value: f64) -> EvidenceRow {
        EvidenceRow {
            key: key.to_string(),
            group: None,
            value,
        }
    }

    fn weights(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, w)| (k.to_string(), *w)).collect()
    }

    fn scores(pairs: &[(&str, f64)]) -> ScoreMap {
        pairs.iter().map(|(k, s)| (k.to_string(), *s)).collect()
    }

    #[test]
    fn average_by_key_means_duplicates_and_omits_missing_keys() {
        let rows = vec![row("A", 2.0), row("B", 1.0), row("A", 4.0)];

        let averaged = average_by_key(&rows);

        assert_eq!(averaged.len(), 2);
        assert_eq!(averaged["A"], 3.0);
        assert_eq!(averaged["B"], 1.0);
        assert!(!averaged.contains_key("C"));
    }

    #[test]
    fn rollup_drops_missing_children_from_both_sides() {
        let children = scores(&[("P1", 2.0)]);
        let result = weighted_rollup(&children, &weights(&[("P1", 1.0), ("P2", 1.0)]));
        assert_eq!(result, Some(2.0));
    }

    #[test]
    fn rollup_renormalises_uneven_weights() {
        let children = scores(&[("A", 4.0), ("B", 1.0)]);
        let result = weighted_rollup(&children, &weights(&[("A", 3.0), ("B", 1.0)]))
            .expect("score present");
        assert!((result - 3.25).abs() < 1e-12);
    }

    #[test]
    fn rollup_without_present_children_is_none() {
        let children = scores(&[("X", 3.0)]);
        assert_eq!(weighted_rollup(&children, &weights(&[("A", 1.0)])), None);
        assert_eq!(weighted_rollup(&children, &BTreeMap::new()), None);
    }

    #[test]
    fn rollup_with_zero_total_weight_is_none() {
        let children = scores(&[("A", 3.0)]);
        assert_eq!(weighted_rollup(&children, &weights(&[("A", 0.0)])), None);
    }

    #[test]
    fn weighted_sum_ignores_absent_children() {
        let children = scores(&[("A", 3.0)]);
        let w = weights(&[("A", 1.0), ("B", 1.0)]);
        assert_eq!(weighted_sum(&children, &w), Some(3.0));
        assert_eq!(weighted_sum(&ScoreMap::new(), &w), None);
    }

    #[test]
    fn normalize_guards_non_positive_max() {
        assert_eq!(normalize(10.0, 20.0, 100.0), Some(50.0));
        assert_eq!(normalize(0.0, 0.0, 100.0), None);
        assert_eq!(normalize(2.0, -4.0, 100.0), None);
    }

    #[test]
    fn round_one_keeps_single_decimal() {
        assert_eq!(round_one(37.5), 37.5);
        assert_eq!(round_one(41.66666), 41.7);
        assert_eq!(round_one(24.94), 24.9);
    }

    #[test]
    fn round_one_rounds_exact_ties_to_even() {
        assert_eq!(round_one(0.25), 0.2);
        assert_eq!(round_one(2.25), 2.2);
        assert_eq!(round_one(56.25), 56.2);
    }

    #[test]
    fn round_one_never_lifts_values_just_below_a_tie() {
        // 24.95 is stored as 24.9499.., which must stay below 25.
        assert_eq!(round_one(24.95), 24.9);
        assert_eq!(round_one(normalize(11.25, 20.0, 100.0).expect("positive max")), 56.2);
    }
}
