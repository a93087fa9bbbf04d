use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use engine_logging::DEFAULT_LOG_FILE;
use log::LevelFilter;
use tubequeue_app::cli::Cli;
use tubequeue_app::commands;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    engine_logging::initialize(cli.log, level, Path::new(DEFAULT_LOG_FILE));

    match commands::run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(err) => {
            eprintln!("tubequeue error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
