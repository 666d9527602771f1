use crate::config::OrderedMap;
use serde::{Deserialize, Serialize};

/// Emitted state of a two-level module (`data/modules/<KEY>_state.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSnapshot {
    pub version: String,
    pub as_of: String,
    pub key: String,
    pub name: String,
    pub score: Option<f64>,
    pub band: Option<String>,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ect: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ect_label: Option<String>,
    pub components: Vec<ComponentEntry>,
    #[serde(default)]
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentEntry {
    pub code: String,
    pub name: String,
    pub score_0_4: Option<f64>,
    pub band: Option<String>,
    pub summary: String,
}

/// Emitted state of the four-level index tree (`data/scales_state.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub version: String,
    pub as_of: String,
    pub global: GlobalEntry,
    pub indices: OrderedMap<IndexEntry>,
    pub pillars: Vec<PillarEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalEntry {
    pub score: Option<f64>,
    pub band: Option<String>,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub name: String,
    pub score: Option<f64>,
    pub band: Option<String>,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PillarEntry {
    pub code: String,
    pub name: String,
    pub score: Option<f64>,
    pub band: Option<String>,
}
