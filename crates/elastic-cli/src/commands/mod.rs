mod habits;
mod request;

use std::sync::Arc;
use std::time::Duration;

use elastic_api::config::ENV_BASE_URL;
use elastic_api::{
    ApiClient, ApiClientConfig, ApiLogger, AuthInterceptor, ConfigError, MemoryTokenStorage,
};
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// Printable result of one command.
pub struct CommandResult {
    pub body: Value,
    pub failed: bool,
}

impl CommandResult {
    pub fn ok(body: Value) -> Self {
        Self {
            body,
            failed: false,
        }
    }

    pub fn failed(body: Value) -> Self {
        Self { body, failed: true }
    }
}

pub async fn run(cli: &Cli, logger: Arc<dyn ApiLogger>) -> Result<CommandResult, CliError> {
    let client = build_client(cli, logger)?;

    match &cli.command {
        Command::Get(args) => request::read(&client, request::ReadVerb::Get, args).await,
        Command::Delete(args) => request::read(&client, request::ReadVerb::Delete, args).await,
        Command::Post(args) => request::write(&client, request::WriteVerb::Post, args).await,
        Command::Put(args) => request::write(&client, request::WriteVerb::Put, args).await,
        Command::Patch(args) => request::write(&client, request::WriteVerb::Patch, args).await,
        Command::Habits(command) => habits::run(&client, command).await,
    }
}

fn build_client(cli: &Cli, logger: Arc<dyn ApiLogger>) -> Result<ApiClient, CliError> {
    let config = resolve_config(cli)?;
    tracing::debug!(
        base_url = %config.base_url,
        retries = config.default_retries,
        authenticated = cli.token.is_some(),
        "resolved api client config"
    );
    let mut builder = ApiClient::builder(config).with_logger(logger);
    if let Some(token) = cli.token.as_deref().filter(|token| !token.is_empty()) {
        let storage = Arc::new(MemoryTokenStorage::with_tokens(token, ""));
        builder = builder.with_interceptor(Arc::new(AuthInterceptor::new(storage)));
    }
    Ok(builder.build()?)
}

fn resolve_config(cli: &Cli) -> Result<ApiClientConfig, ConfigError> {
    let base_url = cli
        .base_url
        .clone()
        .ok_or(ConfigError::MissingEnv { name: ENV_BASE_URL })?;
    let mut config = ApiClientConfig::new(base_url);

    if let Some(ms) = cli.timeout_ms {
        config = config.with_timeout(Duration::from_millis(ms));
    }
    if let Some(retries) = cli.retries {
        config = config.with_retries(retries);
    }
    if let Some(ms) = cli.retry_delay_ms {
        config = config.with_retry_delay(Duration::from_millis(ms));
    }

    config.validate()?;
    Ok(config)
}
