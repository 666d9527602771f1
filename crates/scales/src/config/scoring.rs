//! Scoring configuration: the weighted hierarchy, module definitions and band
//! tables, read from `SCALES_Config.yaml`.
//!
//! Every subtree is optional. Absent or `null` sections fall back to empty
//! collections so a partially written config still produces a snapshot.

use super::ordered::OrderedMap;
use crate::engine::BandTable;
use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to read scoring config '{source_name}': {source}")]
    Read {
        source_name: String,
        source: std::io::Error,
    },
    #[error("failed to parse scoring config '{source_name}': {source}")]
    Parse {
        source_name: String,
        source: serde_yaml::Error,
    },
    #[error("invalid scoring config '{source_name}': {reason}")]
    Invalid { source_name: String, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScalesConfig {
    pub version: Option<String>,
    pub as_of: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub pillars: Vec<PillarDef>,
    #[serde(deserialize_with = "null_as_default")]
    pub indicators: Vec<IndicatorDef>,
    #[serde(deserialize_with = "null_as_default")]
    pub indices: OrderedMap<IndexDef>,
    #[serde(deserialize_with = "null_as_default")]
    pub global_score: GlobalScoreDef,
    #[serde(deserialize_with = "null_as_default")]
    pub modules: OrderedMap<ModuleDef>,
    #[serde(deserialize_with = "null_as_default")]
    pub bands: BandsConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PillarDef {
    pub code: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct IndicatorDef {
    pub id: Option<String>,
    pub pillar: Option<String>,
    pub name: Option<String>,
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct IndexDef {
    pub name: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub pillar_weights: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GlobalScoreDef {
    #[serde(deserialize_with = "null_as_default")]
    pub index_weights: BTreeMap<String, f64>,
}

/// A two-level module such as AI_PEI or CAEI.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModuleDef {
    pub name: Option<String>,
    pub version: Option<String>,
    pub as_of: Option<String>,
    pub summary: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub notes: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub components: Vec<ComponentDef>,
    #[serde(deserialize_with = "null_as_default")]
    pub scoring: ScoringDef,
    pub classification: Option<Classification>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ComponentDef {
    pub code: Option<String>,
    pub name: Option<String>,
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScoringDef {
    pub max_raw: f64,
}

impl Default for ScoringDef {
    fn default() -> Self {
        Self { max_raw: 20.0 }
    }
}

/// Optional secondary classification attached to a module snapshot.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Classification {
    pub code: String,
    pub label: String,
}

/// Threshold tables per hierarchy level.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BandsConfig {
    #[serde(default = "BandTable::component")]
    pub component: BandTable,
    #[serde(default)]
    pillar: Option<BandTable>,
    #[serde(default = "BandTable::module")]
    pub module: BandTable,
    #[serde(default = "BandTable::constitutional")]
    pub constitutional: BandTable,
}

impl BandsConfig {
    /// Pillars share the 0–4 scale, so they reuse the component table unless
    /// the config names one.
    pub fn pillar(&self) -> &BandTable {
        self.pillar.as_ref().unwrap_or(&self.component)
    }
}

impl Default for BandsConfig {
    fn default() -> Self {
        Self {
            component: BandTable::component(),
            pillar: None,
            module: BandTable::module(),
            constitutional: BandTable::constitutional(),
        }
    }
}

impl ScalesConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        let source_name = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Read {
            source_name: source_name.clone(),
            source,
        })?;
        Self::from_yaml_str(&content, &source_name)
    }

    pub fn from_yaml_str(content: &str, source_name: &str) -> Result<Self, ConfigLoadError> {
        let config: Option<ScalesConfig> =
            serde_yaml::from_str(content).map_err(|source| ConfigLoadError::Parse {
                source_name: source_name.to_string(),
                source,
            })?;
        // An empty document parses as `None`.
        let config = config.unwrap_or_default();

        config
            .validate()
            .map_err(|reason| ConfigLoadError::Invalid {
                source_name: source_name.to_string(),
                reason,
            })?;

        Ok(config)
    }

    pub fn version(&self) -> &str {
        self.version.as_deref().unwrap_or("2.0.0")
    }

    pub fn module(&self, key: &str) -> Option<&ModuleDef> {
        self.modules.get(key)
    }

    /// Indicator id -> (pillar, weight). Later declarations of the same id win.
    pub fn indicator_pillars(&self) -> BTreeMap<&str, (&str, f64)> {
        self.indicators
            .iter()
            .filter_map(|indicator| {
                let id = indicator.id.as_deref()?;
                let pillar = indicator.pillar.as_deref()?;
                Some((id, (pillar, indicator.weight())))
            })
            .collect()
    }

    /// Declared pillars that carry a code, in declaration order.
    pub fn declared_pillars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pillars.iter().filter_map(|pillar| {
            let code = pillar.code.as_deref()?;
            Some((code, pillar.name.as_deref().unwrap_or(code)))
        })
    }

    fn validate(&self) -> Result<(), String> {
        for indicator in &self.indicators {
            check_weight(
                indicator.weight(),
                || format!("indicator '{}'", indicator.id.as_deref().unwrap_or("?")),
            )?;
        }

        for (key, index) in &self.indices {
            for (pillar, weight) in &index.pillar_weights {
                check_weight(*weight, || format!("index '{key}' pillar '{pillar}'"))?;
            }
        }

        for (key, weight) in &self.global_score.index_weights {
            check_weight(*weight, || format!("global index '{key}'"))?;
        }

        for (key, module) in &self.modules {
            if !module.scoring.max_raw.is_finite() {
                return Err(format!("module '{key}' max_raw must be a finite number"));
            }

            let mut seen = HashSet::new();
            for (code, _, weight) in module.scored_components() {
                check_weight(weight, || format!("module '{key}' component '{code}'"))?;
                if !seen.insert(code) {
                    return Err(format!("module '{key}' declares component '{code}' twice"));
                }
            }
        }

        Ok(())
    }
}

impl IndicatorDef {
    pub fn weight(&self) -> f64 {
        self.weight.unwrap_or(1.0)
    }
}

impl ModuleDef {
    pub fn name_or<'a>(&'a self, key: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(key)
    }

    pub fn version(&self) -> &str {
        self.version.as_deref().unwrap_or("1.0.0")
    }

    /// Components that carry a code as (code, name, weight), in declaration order.
    pub fn scored_components(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.components.iter().filter_map(|component| {
            let code = component.code.as_deref()?;
            let name = component.name.as_deref().unwrap_or(code);
            Some((code, name, component.weight.unwrap_or(1.0)))
        })
    }
}

fn check_weight(weight: f64, subject: impl FnOnce() -> String) -> Result<(), String> {
    if weight.is_finite() && weight >= 0.0 {
        Ok(())
    } else {
        Err(format!("{} has invalid weight {weight}", subject()))
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
