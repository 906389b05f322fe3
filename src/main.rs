use clap::Parser;
use siteops_lib::cli::Cli;
use siteops_lib::commands::{dispatch, Console};
use siteops_lib::logging::init_logging;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut console = Console::stdio();
    match dispatch(cli, &mut console).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}
