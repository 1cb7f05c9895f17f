use rankimport_core::select_targets;
use serde_json::json;
use time::OffsetDateTime;

use crate::cli::PendingArgs;
use crate::error::CliError;

use super::{CommandResult, Context};

pub fn run(args: &PendingArgs, context: &Context) -> Result<CommandResult, CliError> {
    let settings = &context.config.balance_sheet;
    let lookback_days = args.lookback_days.unwrap_or(settings.lookback_days);
    let max_assets = args.max_assets.unwrap_or(settings.max_assets);
    let as_of = OffsetDateTime::now_utc().date();

    let warehouse = context.open_warehouse()?;
    let candidates = warehouse.pending_balance_sheet_targets(as_of, lookback_days)?;
    let candidate_count = candidates.len();

    let mut rng = match args.seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };
    let targets = select_targets(candidates, max_assets, &mut rng);

    let targets: Vec<_> = targets
        .iter()
        .map(|target| {
            json!({
                "ticker": target.ticker,
                "composite_figi": target.composite_figi,
                "web_symbol": target.web_symbol(),
            })
        })
        .collect();

    Ok(CommandResult::ok(json!({
        "as_of": as_of.to_string(),
        "lookback_days": lookback_days,
        "candidates": candidate_count,
        "targets": targets,
    })))
}
