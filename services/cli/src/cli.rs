use crate::commands::{run_all, run_check, run_index, run_module, BatchArgs, IndexArgs, ModuleArgs};
use clap::{Parser, Subcommand};
use scales::config::AppConfig;
use scales::error::AppError;
use scales::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "scales",
    about = "Compute SCALES index and module state snapshots from evidence files",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score the pillar/index/global tree from indicator evidence
    Index(IndexArgs),
    /// Score one module (e.g. AI_PEI, CAEI) from component evidence
    Module(ModuleArgs),
    /// Score the index tree and every configured module
    All(BatchArgs),
    /// Validate previously written state snapshots against the config
    Check(BatchArgs),
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    match cli.command {
        Command::Index(args) => run_index(args, &config),
        Command::Module(args) => run_module(args, &config),
        Command::All(args) => run_all(args, &config),
        Command::Check(args) => run_check(args, &config),
    }
}
