mod cli;
mod commands;
mod error;
mod output;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use elastic_api::{ApiLogger, TracingLogger};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::Cli;
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run() -> Result<ExitCode, CliError> {
    let cli = Cli::parse();

    let development = cli.dev || TracingLogger::from_env().is_development();
    init_tracing(development);
    let logger: Arc<dyn ApiLogger> = Arc::new(TracingLogger::new(development));

    let result = commands::run(&cli, logger).await?;
    output::render(&result.body, cli.pretty)?;

    if result.failed {
        return Ok(ExitCode::from(3));
    }

    Ok(ExitCode::SUCCESS)
}

fn init_tracing(development: bool) {
    let default_level = if development { "elastic_api=debug,info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
