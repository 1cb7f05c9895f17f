use serde::Serialize;
use serde_json::Value;

use crate::error::CliError;

/// The single JSON object each command prints to stdout.
#[derive(Debug, Serialize)]
pub struct CommandOutput {
    pub command: &'static str,
    pub data: Value,
    pub warnings: Vec<String>,
}

pub fn render(output: &CommandOutput, pretty: bool) -> Result<(), CliError> {
    let payload = if pretty {
        serde_json::to_string_pretty(output)?
    } else {
        serde_json::to_string(output)?
    };
    println!("{payload}");
    Ok(())
}
