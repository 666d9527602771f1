//! Snapshot assembly.
//!
//! Scores arrive unrounded from the engine. Rounding to one decimal happens
//! here, and bands are taken from the rounded value so that re-banding an
//! emitted score always reproduces the emitted label.

pub mod views;

pub use views::{
    ComponentEntry, GlobalEntry, IndexEntry, IndexSnapshot, ModuleSnapshot, PillarEntry,
};

use crate::config::{BandsConfig, ModuleDef, ScalesConfig};
use crate::engine::{round_one, BandTable, ScoreMap};
use chrono::NaiveDate;

/// Unrounded scores of the four-level index tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexScores {
    pub indicators: ScoreMap,
    pub pillars: ScoreMap,
    pub indices: ScoreMap,
    pub global: Option<f64>,
}

/// Unrounded scores of a two-level module.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleScores {
    pub components: ScoreMap,
    pub score: Option<f64>,
}

pub struct StateBuilder<'a> {
    bands: &'a BandsConfig,
    run_date: NaiveDate,
}

impl<'a> StateBuilder<'a> {
    pub fn new(bands: &'a BandsConfig, run_date: NaiveDate) -> Self {
        Self { bands, run_date }
    }

    pub fn module(&self, key: &str, def: &ModuleDef, scores: &ModuleScores) -> ModuleSnapshot {
        let (score, band) = present(scores.score, &self.bands.module);

        let components = def
            .scored_components()
            .map(|(code, name, _)| {
                let (score_0_4, band) =
                    present(scores.components.get(code).copied(), &self.bands.component);
                ComponentEntry {
                    code: code.to_string(),
                    name: name.to_string(),
                    score_0_4,
                    band,
                    summary: String::new(),
                }
            })
            .collect();

        ModuleSnapshot {
            version: def.version().to_string(),
            as_of: self.as_of(def.as_of.as_deref()),
            key: key.to_string(),
            name: def.name_or(key).to_string(),
            score,
            band,
            summary: def.summary.clone().unwrap_or_default(),
            ect: def.classification.as_ref().map(|c| c.code.clone()),
            ect_label: def.classification.as_ref().map(|c| c.label.clone()),
            components,
            notes: def.notes.clone(),
        }
    }

    pub fn index(&self, config: &ScalesConfig, scores: &IndexScores) -> IndexSnapshot {
        let (global_score, global_band) = present(scores.global, &self.bands.constitutional);

        let indices = config
            .indices
            .iter()
            .map(|(key, def)| {
                let (score, band) =
                    present(scores.indices.get(key).copied(), &self.bands.constitutional);
                let entry = IndexEntry {
                    name: def.name.clone().unwrap_or_else(|| key.clone()),
                    score,
                    band,
                    summary: String::new(),
                };
                (key.clone(), entry)
            })
            .collect();

        let pillars = config
            .declared_pillars()
            .map(|(code, name)| {
                let (score, band) = present(scores.pillars.get(code).copied(), self.bands.pillar());
                PillarEntry {
                    code: code.to_string(),
                    name: name.to_string(),
                    score,
                    band,
                }
            })
            .collect();

        IndexSnapshot {
            version: config.version().to_string(),
            as_of: self.as_of(config.as_of.as_deref()),
            global: GlobalEntry {
                score: global_score,
                band: global_band,
                summary: String::new(),
            },
            indices,
            pillars,
        }
    }

    fn as_of(&self, declared: Option<&str>) -> String {
        match declared {
            Some(value) if !value.trim().is_empty() => value.to_string(),
            _ => self.run_date.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Round for presentation and band the rounded value.
fn present(score: Option<f64>, table: &BandTable) -> (Option<f64>, Option<String>) {
    let rounded = score.map(round_one);
    let band = table.band(rounded).map(str::to_string);
    (rounded, band)
}
