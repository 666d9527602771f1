//! The four-level index tree: indicator -> pillar -> index -> global.

use crate::config::ScalesConfig;
use crate::engine::{average_by_key, Combine, Hierarchy, Level, Node, ScoreMap};
use crate::evidence::EvidenceRow;
use crate::state::IndexScores;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Key of the single node on the top level.
pub const GLOBAL_KEY: &str = "global";

/// Pillar scores are 0–4 weighted averages, so index projection is always
/// over 4.
const PILLAR_RAW_MAX: f64 = 4.0;

pub fn index_hierarchy(config: &ScalesConfig) -> Hierarchy {
    let mut pillar_weights: BTreeMap<&str, BTreeMap<String, f64>> = BTreeMap::new();
    for (indicator, (pillar, weight)) in config.indicator_pillars() {
        pillar_weights
            .entry(pillar)
            .or_default()
            .insert(indicator.to_string(), weight);
    }
    let pillars = pillar_weights
        .into_iter()
        .map(|(pillar, weights)| Node::new(pillar, weights))
        .collect();

    let indices = config
        .indices
        .iter()
        .map(|(key, def)| Node::new(key.clone(), def.pillar_weights.clone()))
        .collect();

    let global = vec![Node::new(
        GLOBAL_KEY,
        config.global_score.index_weights.clone(),
    )];

    Hierarchy::new()
        .level(Level::new(pillars, Combine::WeightedMean))
        .level(Level::new(indices, Combine::WeightedMean).projected(PILLAR_RAW_MAX))
        .level(Level::new(global, Combine::WeightedMean))
}

pub fn compute_index_scores(config: &ScalesConfig, rows: &[EvidenceRow]) -> IndexScores {
    let mapping = config.indicator_pillars();
    report_pillar_mismatches(&mapping, rows);

    let indicators: ScoreMap = average_by_key(rows)
        .into_iter()
        .filter(|(id, _)| {
            let declared = mapping.contains_key(id.as_str());
            if !declared {
                debug!(indicator = %id, "ignoring evidence for undeclared indicator");
            }
            declared
        })
        .collect();

    let mut levels = index_hierarchy(config).evaluate(&indicators).into_iter();
    let pillars = levels.next().unwrap_or_default();
    let indices = levels.next().unwrap_or_default();
    let global = levels
        .next()
        .and_then(|scores| scores.get(GLOBAL_KEY).copied());

    IndexScores {
        indicators,
        pillars,
        indices,
        global,
    }
}

fn report_pillar_mismatches(mapping: &BTreeMap<&str, (&str, f64)>, rows: &[EvidenceRow]) {
    for row in rows {
        let (Some(tagged), Some((declared, _))) = (row.group.as_deref(), mapping.get(row.key.as_str()))
        else {
            continue;
        };
        if tagged != *declared {
            warn!(
                indicator = %row.key,
                evidence_pillar = tagged,
                config_pillar = *declared,
                "evidence pillar disagrees with config; using config mapping"
            );
        }
    }
}
