use elastic_api::{ApiClient, ApiResult, HabitsRepository};
use serde::Serialize;
use serde_json::json;

use crate::cli::HabitsCommand;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(client: &ApiClient, command: &HabitsCommand) -> Result<CommandResult, CliError> {
    let habits = HabitsRepository::new(client.clone());

    match command {
        HabitsCommand::List => into_command_result(habits.list().await),
        HabitsCommand::Show { id } => into_command_result(habits.get(id).await),
        HabitsCommand::Insights => into_command_result(habits.insights().await),
    }
}

fn into_command_result<T: Serialize>(result: ApiResult<T>) -> Result<CommandResult, CliError> {
    match result {
        Ok(data) => Ok(CommandResult::ok(serde_json::to_value(data)?)),
        Err(error) => Ok(CommandResult::failed(json!({ "error": error }))),
    }
}
