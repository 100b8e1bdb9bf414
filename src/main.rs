use std::process::ExitCode;

use clap::Parser;
use dotenv::dotenv;
use shortit::cli::{self, Cli, Command};
use shortit::Settings;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Pretty, source-located logs for development; compact lines everywhere else.
/// Logs go to stderr so command output on stdout stays clean.
fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if settings.is_development() {
        builder
            .with_target(false)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .init();
    } else {
        builder.with_target(true).compact().init();
    }
}

#[actix_web::main]
async fn main() -> ExitCode {
    // Load environment variables
    dotenv().ok();

    let cli = Cli::parse();

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&settings);
    if settings.is_development() {
        info!("Dev build");
    }

    let command = cli.command.unwrap_or(Command::Serve);
    match cli::run(command, settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
