use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod settings;

use cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so stdout stays clean for `presets` and `config`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            if let Some(detail) = error.detail() {
                eprintln!("  {detail}");
            }
            ExitCode::FAILURE
        }
    }
}
