//! CLI argument definitions for rankimport.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `import` | Load a screener CSV export into DuckDB and parquet, then upload |
//! | `balance-sheet` | Load captured balance-sheet tables and record exclusions |
//! | `pending` | List tickers whose recent working capital is missing |
//! | `exclude` | Record balance-sheet exclusions by hand |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--config` | none | Extra TOML file merged below the environment |
//! | `--database` | `database.path` | DuckDB file to use |
//! | `--log-json` | `false` | Emit log lines as JSON |
//! | `--verbose` | `false` | Debug logging |
//! | `--quiet` | `false` | Errors only |
//! | `--pretty` | `false` | Pretty-print JSON output |
//!
//! `RANKIMPORT_LOG` overrides `--verbose` and `--quiet` with a full
//! `tracing` filter directive.
//!
//! # Examples
//!
//! ```bash
//! # Import an export, taking the report date from the file name
//! rankimport import ~/Downloads/zacks_custom_screen_2024-01-19.csv
//!
//! # Import without uploading, keeping the parquet file
//! rankimport import export.csv --date 2024-01-19 --no-upload --output-dir ./out
//!
//! # Pick up to 10 tickers that still need balance sheets
//! rankimport pending --max-assets 10 --pretty
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Screener and balance-sheet importer.
#[derive(Debug, Parser)]
#[command(
    name = "rankimport",
    author,
    version,
    about = "Import stock-screener exports and balance-sheet figures into DuckDB and parquet"
)]
pub struct Cli {
    /// Extra configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// DuckDB database file; overrides `database.path`.
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// Emit log lines as JSON objects.
    #[arg(long, global = true, default_value_t = false)]
    pub log_json: bool,

    /// Enable debug logging.
    #[arg(long, short, global = true, default_value_t = false, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors.
    #[arg(long, short, global = true, default_value_t = false)]
    pub quiet: bool,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import a screener CSV export.
    Import(ImportArgs),
    /// Load captured balance-sheet tables.
    BalanceSheet(BalanceSheetArgs),
    /// List balance-sheet targets with missing working capital.
    Pending(PendingArgs),
    /// Record balance-sheet exclusions.
    Exclude(ExcludeArgs),
}

impl Command {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Import(_) => "import",
            Self::BalanceSheet(_) => "balance-sheet",
            Self::Pending(_) => "pending",
            Self::Exclude(_) => "exclude",
        }
    }
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// CSV export to import.
    pub file: PathBuf,

    /// Report date (YYYY-MM-DD); defaults to the date in the file name.
    #[arg(long)]
    pub date: Option<String>,

    /// Keep only the first N rows; 0 keeps every row.
    #[arg(long)]
    pub limit: Option<usize>,

    /// Directory that keeps the parquet file; a temporary directory otherwise.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Skip the object-storage upload.
    #[arg(long, default_value_t = false)]
    pub no_upload: bool,
}

#[derive(Debug, Args)]
pub struct BalanceSheetArgs {
    /// JSON file of captured balance-sheet tables.
    pub captures: PathBuf,

    /// Parquet output path; defaults to `balance_sheet.output_path`.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct PendingArgs {
    /// Days of fundamentals history to consider.
    #[arg(long)]
    pub lookback_days: Option<u32>,

    /// Maximum number of targets; 0 returns every candidate.
    #[arg(long)]
    pub max_assets: Option<usize>,

    /// Seed for a reproducible shuffle.
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Args)]
pub struct ExcludeArgs {
    /// Tickers to exclude.
    #[arg(required = true)]
    pub tickers: Vec<String>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn import_flags_parse() {
        let cli = Cli::try_parse_from([
            "rankimport",
            "--database",
            "ranks.duckdb",
            "import",
            "zacks_custom_screen_2024-01-19.csv",
            "--limit",
            "5",
            "--no-upload",
        ])
        .expect("parse");

        assert_eq!(cli.database, Some(PathBuf::from("ranks.duckdb")));
        let Command::Import(args) = cli.command else {
            panic!("expected import");
        };
        assert_eq!(args.limit, Some(5));
        assert!(args.no_upload);
        assert_eq!(args.date, None);
    }

    #[test]
    fn exclude_requires_a_ticker() {
        assert!(Cli::try_parse_from(["rankimport", "exclude"]).is_err());
    }
}
