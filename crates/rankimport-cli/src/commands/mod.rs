mod balance_sheet;
mod exclude;
mod import;
mod pending;

use rankimport_core::RankImportConfig;
use rankimport_warehouse::{Warehouse, WarehouseConfig};
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::output::CommandOutput;

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

/// Loaded configuration with command-line overrides applied.
pub struct Context {
    pub config: RankImportConfig,
}

impl Context {
    pub fn new(cli: &Cli, mut config: RankImportConfig) -> Self {
        if let Some(path) = &cli.database {
            config.database.path.clone_from(path);
        }
        Self { config }
    }

    pub fn open_warehouse(&self) -> Result<Warehouse, CliError> {
        Ok(Warehouse::open(WarehouseConfig::from(&self.config.database))?)
    }
}

pub async fn run(cli: &Cli, context: &Context) -> Result<CommandOutput, CliError> {
    let result = match &cli.command {
        Command::Import(args) => import::run(args, context).await?,
        Command::BalanceSheet(args) => balance_sheet::run(args, context).await?,
        Command::Pending(args) => pending::run(args, context)?,
        Command::Exclude(args) => exclude::run(args, context)?,
    };

    Ok(CommandOutput {
        command: cli.command.name(),
        data: result.data,
        warnings: result.warnings,
    })
}
