//! Load -> aggregate -> band -> write, once per invocation.
//!
//! Every entry point takes its file locations explicitly through
//! [`RunPaths`]; nothing here reads process-wide state.

pub mod index;
pub mod module;

pub use index::{compute_index_scores, index_hierarchy};
pub use module::{compute_module_scores, module_hierarchy};

use crate::config::{ConfigLoadError, PathsConfig, ScalesConfig};
use crate::evidence::{self, EvidenceError, EvidenceSchema};
use crate::output::{self, OutputError};
use crate::state::{IndexSnapshot, ModuleSnapshot, StateBuilder};
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigLoadError),
    #[error(transparent)]
    Evidence(#[from] EvidenceError),
    #[error(transparent)]
    Output(#[from] OutputError),
    #[error("module '{0}' is not declared in the scoring config")]
    UnknownModule(String),
}

/// Input and output locations for a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    pub config: PathBuf,
    pub evidence: PathBuf,
    pub output: PathBuf,
}

impl RunPaths {
    pub fn for_index(paths: &PathsConfig) -> Self {
        Self {
            config: paths.config.clone(),
            evidence: paths.index_evidence(),
            output: paths.index_state(),
        }
    }

    pub fn for_module(paths: &PathsConfig, key: &str) -> Self {
        Self {
            config: paths.config.clone(),
            evidence: paths.module_evidence(key),
            output: paths.module_state(key),
        }
    }
}

/// Score the index tree from indicator evidence and write its snapshot.
pub fn run_index(paths: &RunPaths, run_date: NaiveDate) -> Result<IndexSnapshot, PipelineError> {
    let config = ScalesConfig::load(&paths.config)?;
    info!(config = %paths.config.display(), "scoring config loaded");
    run_index_with_config(&config, paths, run_date)
}

pub fn run_index_with_config(
    config: &ScalesConfig,
    paths: &RunPaths,
    run_date: NaiveDate,
) -> Result<IndexSnapshot, PipelineError> {
    let rows = evidence::load_path(&paths.evidence, EvidenceSchema::INDICATORS)?;
    info!(evidence = %paths.evidence.display(), rows = rows.len(), "indicator evidence loaded");

    let scores = compute_index_scores(config, &rows);
    info!(
        pillars = scores.pillars.len(),
        indices = scores.indices.len(),
        global = ?scores.global,
        "index scores computed"
    );

    let snapshot = StateBuilder::new(&config.bands, run_date).index(config, &scores);
    output::write_snapshot(&paths.output, &snapshot)?;
    info!(output = %paths.output.display(), "index state written");

    Ok(snapshot)
}

/// Score one module from component evidence and write its snapshot.
pub fn run_module(
    key: &str,
    paths: &RunPaths,
    run_date: NaiveDate,
) -> Result<ModuleSnapshot, PipelineError> {
    let config = ScalesConfig::load(&paths.config)?;
    info!(config = %paths.config.display(), "scoring config loaded");
    run_module_with_config(&config, key, paths, run_date)
}

pub fn run_module_with_config(
    config: &ScalesConfig,
    key: &str,
    paths: &RunPaths,
    run_date: NaiveDate,
) -> Result<ModuleSnapshot, PipelineError> {
    let def = config
        .module(key)
        .ok_or_else(|| PipelineError::UnknownModule(key.to_string()))?;

    let rows = evidence::load_path(&paths.evidence, EvidenceSchema::COMPONENTS)?;
    info!(module = key, evidence = %paths.evidence.display(), rows = rows.len(), "component evidence loaded");

    let scores = compute_module_scores(key, def, &rows);
    info!(module = key, score = ?scores.score, "module score computed");

    let snapshot = StateBuilder::new(&config.bands, run_date).module(key, def, &scores);
    output::write_snapshot(&paths.output, &snapshot)?;
    info!(module = key, output = %paths.output.display(), "module state written");

    Ok(snapshot)
}
