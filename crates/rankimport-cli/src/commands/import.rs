//! `rankimport import`: screener export to DuckDB, parquet and object storage.

use rankimport_core::{compact_date, parse_report_date};
use rankimport_warehouse::{ImportJob, ImportPipeline};
use regex::Regex;
use serde_json::json;
use tracing::{info, warn};

use crate::cli::ImportArgs;
use crate::error::CliError;
use crate::storage;

use super::{CommandResult, Context};

const FILE_DATE_PATTERN: &str = r"zacks_custom_screen_(\d{4}-\d{2}-\d{2})";

pub async fn run(args: &ImportArgs, context: &Context) -> Result<CommandResult, CliError> {
    let config = &context.config;
    let source_name = args.file.display().to_string();

    let report_date = match &args.date {
        Some(date) => date.clone(),
        None => report_date_from_file_name(&source_name).ok_or_else(|| {
            CliError::Usage(format!(
                "cannot extract date from '{source_name}', expecting zacks_custom_screen_YYYY-MM-DD or --date"
            ))
        })?,
    };
    let event_date = parse_report_date(&report_date)?;

    let raw = tokio::fs::read(&args.file).await?;

    // The scratch directory is removed when the command returns, after the upload.
    let (output_dir, _scratch) = match &args.output_dir {
        Some(dir) => {
            tokio::fs::create_dir_all(dir).await?;
            (dir.clone(), None)
        }
        None => {
            let scratch = tempfile::Builder::new().prefix("import-zacks").tempdir()?;
            (scratch.path().to_path_buf(), Some(scratch))
        }
    };

    let file_name = format!(
        "{}-{}.parquet",
        config.import.file_prefix,
        compact_date(event_date)?
    );
    let job = ImportJob {
        source_name,
        report_date,
        limit: args.limit.unwrap_or(config.import.limit),
        output_path: output_dir.join(&file_name),
        exempt: config.import.exempt(),
    };

    let warehouse = context.open_warehouse()?;
    let report = ImportPipeline::new(&warehouse).run(&raw, &job)?;

    let mut data = serde_json::to_value(&report)?;
    let mut result_warnings = Vec::new();
    if report.enrichment.warned > 0 {
        result_warnings.push(format!(
            "{} tickers could not be matched to a composite figi",
            report.enrichment.warned
        ));
    }
    if report.label_warnings > 0 {
        result_warnings.push(format!(
            "{} period labels could not be parsed",
            report.label_warnings
        ));
    }
    if report.saved.failed > 0 || report.parquet.rejected > 0 {
        result_warnings.push(format!(
            "{} rows failed to save and {} rows were left out of the parquet file",
            report.saved.failed, report.parquet.rejected
        ));
    }

    if args.no_upload {
        result_warnings.push(String::from("upload skipped (--no-upload)"));
    } else if !config.storage.is_configured() {
        warn!("storage is not configured; skipping upload");
        result_warnings.push(String::from("upload skipped: storage is not configured"));
    } else {
        let store = storage::s3_store(&config.storage)?;
        let key = storage::object_key(event_date.year(), &file_name);
        info!(bucket = %config.storage.bucket, key = %key, "uploading parquet file");
        let size = storage::upload(&store, &job.output_path, &key).await?;
        data["upload"] = json!({
            "bucket": config.storage.bucket,
            "key": key.to_string(),
            "size": size,
        });
    }

    let mut result = CommandResult::ok(data);
    for warning in result_warnings {
        result = result.with_warning(warning);
    }
    Ok(result)
}

/// Report date embedded in an export file name.
pub fn report_date_from_file_name(name: &str) -> Option<String> {
    let pattern = Regex::new(FILE_DATE_PATTERN).ok()?;
    pattern
        .captures(name)
        .and_then(|captures| captures.get(1))
        .map(|date| date.as_str().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_comes_from_the_file_name() {
        assert_eq!(
            report_date_from_file_name("/home/me/Downloads/zacks_custom_screen_2024-01-19.csv"),
            Some(String::from("2024-01-19"))
        );
    }

    #[test]
    fn file_without_date_has_none() {
        assert_eq!(report_date_from_file_name("screen.csv"), None);
        assert_eq!(
            report_date_from_file_name("zacks_custom_screen_20240119.csv"),
            None
        );
    }
}
