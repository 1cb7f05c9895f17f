use rankimport_core::Ticker;
use serde_json::json;

use crate::cli::ExcludeArgs;
use crate::error::CliError;

use super::{CommandResult, Context};

pub fn run(args: &ExcludeArgs, context: &Context) -> Result<CommandResult, CliError> {
    let tickers = args
        .tickers
        .iter()
        .map(|raw| Ticker::parse(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let warehouse = context.open_warehouse()?;
    for ticker in &tickers {
        warehouse.insert_exclusion(ticker)?;
    }

    let excluded: Vec<&str> = tickers.iter().map(Ticker::as_str).collect();
    Ok(CommandResult::ok(json!({ "excluded": excluded })))
}
