//! Two-level modules: component evidence rolled into one 0–100 module score.

use crate::config::ModuleDef;
use crate::engine::{average_by_key, Combine, Hierarchy, Level, Node, ScoreMap};
use crate::evidence::EvidenceRow;
use crate::state::ModuleScores;
use std::collections::BTreeMap;
use tracing::debug;

/// component -> module, summed over the present components and projected
/// over the declared `max_raw`.
pub fn module_hierarchy(key: &str, def: &ModuleDef) -> Hierarchy {
    let weights: BTreeMap<String, f64> = def
        .scored_components()
        .map(|(code, _, weight)| (code.to_string(), weight))
        .collect();

    Hierarchy::new().level(
        Level::new(vec![Node::new(key, weights)], Combine::WeightedSum)
            .projected(def.scoring.max_raw),
    )
}

pub fn compute_module_scores(key: &str, def: &ModuleDef, rows: &[EvidenceRow]) -> ModuleScores {
    let averaged = average_by_key(rows);

    let mut components = ScoreMap::new();
    for (code, _, _) in def.scored_components() {
        if let Some(score) = averaged.get(code) {
            components.insert(code.to_string(), *score);
        }
    }
    for code in averaged.keys().filter(|code| !components.contains_key(*code)) {
        debug!(module = key, component = %code, "ignoring evidence for undeclared component");
    }

    let levels = module_hierarchy(key, def).evaluate(&components);
    let score = levels.first().and_then(|scores| scores.get(key)).copied();

    ModuleScores { components, score }
}
