mod cli;
mod commands;

use scales::error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
