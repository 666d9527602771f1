use chrono::{Local, NaiveDate};
use clap::Args;
use scales::check;
use scales::config::{AppConfig, PathsConfig, ScalesConfig};
use scales::error::AppError;
use scales::pipeline::{self, RunPaths};
use std::path::PathBuf;
use tracing::{info, warn};

/// Overrides for the locations taken from the environment.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct PathArgs {
    /// Scoring config (YAML)
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
    /// Directory holding <KEY>_Evidence.csv files
    #[arg(long)]
    pub(crate) ops_dir: Option<PathBuf>,
    /// Directory receiving state snapshots
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
}

impl PathArgs {
    fn resolve(&self, base: &PathsConfig) -> PathsConfig {
        PathsConfig {
            config: self.config.clone().unwrap_or_else(|| base.config.clone()),
            ops_dir: self.ops_dir.clone().unwrap_or_else(|| base.ops_dir.clone()),
            data_dir: self.data_dir.clone().unwrap_or_else(|| base.data_dir.clone()),
        }
    }
}

#[derive(Args, Debug, Default)]
pub(crate) struct IndexArgs {
    #[command(flatten)]
    pub(crate) paths: PathArgs,
    /// Evidence CSV (defaults to <ops-dir>/SCALES_Evidence.csv)
    #[arg(long)]
    pub(crate) evidence: Option<PathBuf>,
    /// State file (defaults to <data-dir>/scales_state.json)
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Date stamped on the snapshot when the config has no as_of (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct ModuleArgs {
    /// Module key as declared under `modules:` in the config
    pub(crate) key: String,
    #[command(flatten)]
    pub(crate) paths: PathArgs,
    /// Evidence CSV (defaults to <ops-dir>/<KEY>_Evidence.csv)
    #[arg(long)]
    pub(crate) evidence: Option<PathBuf>,
    /// State file (defaults to <data-dir>/modules/<KEY>_state.json)
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Date stamped on the snapshot when the config has no as_of (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct BatchArgs {
    #[command(flatten)]
    pub(crate) paths: PathArgs,
    /// Date stamped on snapshots whose config has no as_of (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
}

pub(crate) fn run_index(args: IndexArgs, config: &AppConfig) -> Result<(), AppError> {
    let paths = args.paths.resolve(&config.paths);
    let mut run_paths = RunPaths::for_index(&paths);
    if let Some(evidence) = args.evidence {
        run_paths.evidence = evidence;
    }
    if let Some(output) = args.output {
        run_paths.output = output;
    }

    let snapshot = pipeline::run_index(&run_paths, run_date(args.as_of))?;
    println!(
        "Wrote SCALES state to {} (global {})",
        run_paths.output.display(),
        describe(snapshot.global.score, snapshot.global.band.as_deref())
    );
    Ok(())
}

pub(crate) fn run_module(args: ModuleArgs, config: &AppConfig) -> Result<(), AppError> {
    let paths = args.paths.resolve(&config.paths);
    let mut run_paths = RunPaths::for_module(&paths, &args.key);
    if let Some(evidence) = args.evidence {
        run_paths.evidence = evidence;
    }
    if let Some(output) = args.output {
        run_paths.output = output;
    }

    let snapshot = pipeline::run_module(&args.key, &run_paths, run_date(args.as_of))?;
    println!(
        "Wrote {} state to {} ({})",
        snapshot.key,
        run_paths.output.display(),
        describe(snapshot.score, snapshot.band.as_deref())
    );
    Ok(())
}

pub(crate) fn run_all(args: BatchArgs, config: &AppConfig) -> Result<(), AppError> {
    let paths = args.paths.resolve(&config.paths);
    let scoring = ScalesConfig::load(&paths.config)?;
    let date = run_date(args.as_of);

    let index_paths = RunPaths::for_index(&paths);
    pipeline::run_index_with_config(&scoring, &index_paths, date)?;
    println!("Wrote SCALES state to {}", index_paths.output.display());

    for key in scoring.modules.keys() {
        let module_paths = RunPaths::for_module(&paths, key);
        pipeline::run_module_with_config(&scoring, key, &module_paths, date)?;
        println!("Wrote {key} state to {}", module_paths.output.display());
    }

    info!(modules = scoring.modules.len(), "all pipelines completed");
    Ok(())
}

pub(crate) fn run_check(args: BatchArgs, config: &AppConfig) -> Result<(), AppError> {
    let paths = args.paths.resolve(&config.paths);
    let scoring = ScalesConfig::load(&paths.config)?;

    let report = check::check_all(&scoring, &paths);
    for warning in &report.warnings {
        warn!("{warning}");
        println!("[WARN]  {warning}");
    }
    for error in &report.errors {
        println!("[ERROR] {error}");
    }
    println!(
        "Errors: {}, warnings: {}",
        report.errors.len(),
        report.warnings.len()
    );

    if report.is_ok() {
        Ok(())
    } else {
        Err(AppError::CheckFailed {
            errors: report.errors.len(),
        })
    }
}

fn run_date(as_of: Option<NaiveDate>) -> NaiveDate {
    as_of.unwrap_or_else(|| Local::now().date_naive())
}

fn describe(score: Option<f64>, band: Option<&str>) -> String {
    match (score, band) {
        (Some(score), Some(band)) => format!("{score:.1}, {band}"),
        (Some(score), None) => format!("{score:.1}"),
        _ => "no evidence".to_string(),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
