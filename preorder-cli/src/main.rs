use anyhow::Result;
use clap::Parser;

mod api;
mod cli;
mod config;
mod error;
mod reconcile;
mod report;
mod sheet;

use cli::Cli;

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; settings may come from the environment or flags
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: failed to load .env: {}", e);
        }
    }

    let cli = Cli::parse();
    init_logging(cli.verbose);

    cli::handler::handle_sync_command(cli).await
}
