use rankimport_core::TickerCapture;
use rankimport_warehouse::BalanceSheetPipeline;
use time::OffsetDateTime;

use crate::cli::BalanceSheetArgs;
use crate::error::CliError;

use super::{CommandResult, Context};

pub async fn run(args: &BalanceSheetArgs, context: &Context) -> Result<CommandResult, CliError> {
    let raw = tokio::fs::read(&args.captures).await?;
    let captures: Vec<TickerCapture> = serde_json::from_slice(&raw).map_err(|error| {
        CliError::Usage(format!(
            "invalid captures file '{}': {error}",
            args.captures.display()
        ))
    })?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| context.config.balance_sheet.output_path.clone());
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let today = OffsetDateTime::now_utc().date();
    let warehouse = context.open_warehouse()?;
    let report = BalanceSheetPipeline::new(&warehouse).run(&captures, today, &output)?;

    let mut result = CommandResult::ok(serde_json::to_value(&report)?);
    if !report.excluded.is_empty() {
        result = result.with_warning(format!(
            "{} tickers excluded for missing balance-sheet figures",
            report.excluded.len()
        ));
    }
    if report.saved.skipped > 0 {
        result = result.with_warning(format!(
            "{} records had no composite figi and were not saved",
            report.saved.skipped
        ));
    }
    Ok(result)
}
