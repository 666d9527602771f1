//! Weighted aggregation trees of arbitrary depth.
//!
//! A [`Hierarchy`] is a stack of [`Level`]s. Each level turns the score map
//! of the level below into the score map of its own nodes, so a two-level
//! module (component -> module) and the four-level index tree
//! (indicator -> pillar -> index -> global) run through the same code.

use super::aggregate::{normalize, weighted_rollup, weighted_sum, ScoreMap};
use std::collections::BTreeMap;

/// How a node folds the scores of its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combine {
    /// Weighted average renormalised over the present children.
    WeightedMean,
    /// Weighted sum over the present children, meant to be projected over a
    /// declared maximum.
    WeightedSum,
}

/// A parent node and the weights of its children.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub key: String,
    pub weights: BTreeMap<String, f64>,
}

impl Node {
    pub fn new(key: impl Into<String>, weights: BTreeMap<String, f64>) -> Self {
        Self {
            key: key.into(),
            weights,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    pub nodes: Vec<Node>,
    pub combine: Combine,
    /// When set, node scores are projected from `[0, raw_max]` onto `[0, 100]`.
    pub raw_max: Option<f64>,
}

impl Level {
    pub fn new(nodes: Vec<Node>, combine: Combine) -> Self {
        Self {
            nodes,
            combine,
            raw_max: None,
        }
    }

    pub fn projected(mut self, raw_max: f64) -> Self {
        self.raw_max = Some(raw_max);
        self
    }

    /// Score every node of this level from the scores of the level below.
    pub fn evaluate(&self, children: &ScoreMap) -> ScoreMap {
        self.nodes
            .iter()
            .filter_map(|node| {
                let raw = match self.combine {
                    Combine::WeightedMean => weighted_rollup(children, &node.weights),
                    Combine::WeightedSum => weighted_sum(children, &node.weights),
                }?;
                let score = match self.raw_max {
                    Some(raw_max) => normalize(raw, raw_max, 100.0)?,
                    None => raw,
                };
                Some((node.key.clone(), score))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hierarchy {
    levels: Vec<Level>,
}

impl Hierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: Level) -> Self {
        self.levels.push(level);
        self
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Evaluate bottom-up, returning one score map per level in declaration
    /// order. Nothing is rounded between levels.
    pub fn evaluate(&self, leaves: &ScoreMap) -> Vec<ScoreMap> {
        let mut outputs: Vec<ScoreMap> = Vec::with_capacity(self.levels.len());
        for level in &self.levels {
            let below = outputs.last().unwrap_or(leaves);
            let scores = level.evaluate(below);
            outputs.push(scores);
        }
        outputs
    }
}
