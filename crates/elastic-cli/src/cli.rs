//! CLI argument definitions for the elastic API client.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `get` / `delete` | Raw call without a body |
//! | `post` / `put` / `patch` | Raw call with an optional JSON body |
//! | `habits` | Typed habit listing, lookup and insights |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--base-url` | `$ELASTIC_API_BASE_URL` | API root |
//! | `--timeout-ms` | `30000` | Per-attempt timeout |
//! | `--retries` | `3` | Attempt budget |
//! | `--retry-delay-ms` | `1000` | Backoff base |
//! | `--token` | `$ELASTIC_API_TOKEN` | Bearer token |
//! | `--dev` | `false` | Verbose request logging to stderr |
//! | `--pretty` | `false` | Pretty-print JSON output |
//!
//! # Examples
//!
//! ```bash
//! elastic --base-url http://localhost:3000/api get /habits -q page=1
//! elastic post /habits --data '{"name":"Read","activities":[]}' --pretty
//! elastic habits insights --dev
//! ```

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "elastic",
    author,
    version,
    about = "Command-line client for the elastic habits API"
)]
pub struct Cli {
    /// API root, e.g. `https://host/api`.
    #[arg(long, global = true, env = "ELASTIC_API_BASE_URL")]
    pub base_url: Option<String>,

    /// Per-attempt timeout in milliseconds.
    #[arg(long, global = true, env = "ELASTIC_API_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Total attempts per call, including the first.
    #[arg(long, global = true, env = "ELASTIC_API_RETRIES")]
    pub retries: Option<u32>,

    /// Backoff base in milliseconds.
    #[arg(long, global = true, env = "ELASTIC_API_RETRY_DELAY_MS")]
    pub retry_delay_ms: Option<u64>,

    /// Access token sent as `authorization: Bearer <token>`.
    #[arg(long, global = true, env = "ELASTIC_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Log requests, responses and timings to stderr.
    #[arg(long, global = true, default_value_t = false)]
    pub dev: bool,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// GET a path and print the response envelope.
    Get(ReadArgs),
    /// DELETE a path and print the response envelope.
    Delete(ReadArgs),
    /// POST a JSON body.
    Post(WriteArgs),
    /// PUT a JSON body.
    Put(WriteArgs),
    /// PATCH a JSON body.
    Patch(WriteArgs),
    /// Typed habit operations.
    #[command(subcommand)]
    Habits(HabitsCommand),
}

#[derive(Debug, Args)]
pub struct ReadArgs {
    /// Path relative to the base url.
    pub path: String,

    /// Query parameter as `key=value`. Repeatable.
    #[arg(short = 'q', long = "query", value_parser = parse_key_value)]
    pub query: Vec<(String, String)>,
}

#[derive(Debug, Args)]
pub struct WriteArgs {
    /// Path relative to the base url.
    pub path: String,

    /// JSON request body.
    #[arg(long)]
    pub data: Option<String>,

    /// Query parameter as `key=value`. Repeatable.
    #[arg(short = 'q', long = "query", value_parser = parse_key_value)]
    pub query: Vec<(String, String)>,
}

#[derive(Debug, Subcommand)]
pub enum HabitsCommand {
    /// List every habit.
    List,
    /// Show one habit.
    Show {
        id: String,
    },
    /// Recent tracking entries.
    Insights,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_owned(), value.to_owned())),
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}
