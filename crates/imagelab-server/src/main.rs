//! imagelab-server: a demonstration CLI that drives the imagelab pipeline
//! end-to-end against the local filesystem, standing in for the
//! out-of-scope HTTP surface. It does not implement request routing,
//! payload validation or static file hosting.

#![forbid(unsafe_code)]

mod cli;
mod commands;
mod events;
#[allow(dead_code)]
mod exit_codes;
mod logging;

use clap::Parser;
use cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let result = match cli.command {
        cli::Commands::Demo(args) => commands::demo::execute(args).await,
        cli::Commands::Doctor => commands::doctor::execute().await,
    };

    match result {
        Ok(()) => std::process::exit(exit_codes::SUCCESS),
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(exit_codes::ERROR);
        }
    }
}
