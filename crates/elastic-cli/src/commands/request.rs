use elastic_api::{ApiClient, ApiResponse, RequestOptions};
use serde_json::Value;

use crate::cli::{ReadArgs, WriteArgs};
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Clone, Copy)]
pub enum ReadVerb {
    Get,
    Delete,
}

#[derive(Debug, Clone, Copy)]
pub enum WriteVerb {
    Post,
    Put,
    Patch,
}

pub async fn read(client: &ApiClient, verb: ReadVerb, args: &ReadArgs) -> Result<CommandResult, CliError> {
    let options = options(&args.query);
    let response: ApiResponse<Value> = match verb {
        ReadVerb::Get => client.get(&args.path, options).await,
        ReadVerb::Delete => client.delete(&args.path, options).await,
    };
    envelope_result(&response)
}

pub async fn write(client: &ApiClient, verb: WriteVerb, args: &WriteArgs) -> Result<CommandResult, CliError> {
    let body = parse_body(args.data.as_deref())?;
    let options = options(&args.query);
    let response: ApiResponse<Value> = match verb {
        WriteVerb::Post => client.post(&args.path, &body, options).await,
        WriteVerb::Put => client.put(&args.path, &body, options).await,
        WriteVerb::Patch => client.patch(&args.path, &body, options).await,
    };
    envelope_result(&response)
}

fn options(query: &[(String, String)]) -> RequestOptions {
    query
        .iter()
        .fold(RequestOptions::new(), |options, (key, value)| options.param(key, value))
}

/// Missing `--data` sends no body.
fn parse_body(raw: Option<&str>) -> Result<Value, CliError> {
    match raw {
        None => Ok(Value::Null),
        Some(raw) => Ok(serde_json::from_str(raw)?),
    }
}

fn envelope_result(response: &ApiResponse<Value>) -> Result<CommandResult, CliError> {
    let body = serde_json::to_value(response)?;
    if response.is_success() {
        Ok(CommandResult::ok(body))
    } else {
        Ok(CommandResult::failed(body))
    }
}
