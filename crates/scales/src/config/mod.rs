mod ordered;
mod scoring;

pub use ordered::OrderedMap;

pub use scoring::{
    BandsConfig, Classification, ComponentDef, ConfigLoadError, GlobalScoreDef, IndexDef,
    IndicatorDef, ModuleDef, PillarDef, ScalesConfig, ScoringDef,
};

use std::env;
use std::fmt;
use std::path::PathBuf;

/// Top-level run settings: where inputs live and how noisy to be.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = path_var("SCALES_CONFIG", "config/SCALES_Config.yaml")?;
        let ops_dir = path_var("SCALES_OPS_DIR", "ops")?;
        let data_dir = path_var("SCALES_DATA_DIR", "data")?;
        let log_level = env::var("SCALES_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            paths: PathsConfig {
                config,
                ops_dir,
                data_dir,
            },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

fn path_var(name: &'static str, default: &str) -> Result<PathBuf, ConfigError> {
    match env::var(name) {
        Ok(value) if value.trim().is_empty() => Err(ConfigError::EmptyPath { var: name }),
        Ok(value) => Ok(PathBuf::from(value.trim())),
        Err(_) => Ok(PathBuf::from(default)),
    }
}

/// Locations of the scoring config, evidence files and emitted state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathsConfig {
    pub config: PathBuf,
    pub ops_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl PathsConfig {
    pub fn index_evidence(&self) -> PathBuf {
        self.ops_dir.join("SCALES_Evidence.csv")
    }

    pub fn index_state(&self) -> PathBuf {
        self.data_dir.join("scales_state.json")
    }

    /// Public evidence ledger published next to the index state.
    pub fn ledger(&self) -> PathBuf {
        self.data_dir.join("scales_ledger_public.json")
    }

    pub fn module_evidence(&self, key: &str) -> PathBuf {
        self.ops_dir.join(format!("{key}_Evidence.csv"))
    }

    pub fn module_state(&self, key: &str) -> PathBuf {
        self.data_dir.join("modules").join(format!("{key}_state.json"))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    EmptyPath { var: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyPath { var } => write!(f, "{var} must not be empty when set"),
        }
    }
}

impl std::error::Error for ConfigError {}
