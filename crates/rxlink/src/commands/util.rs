//! Shared helpers for command handlers.

use std::path::Path;

use serde::de::DeserializeOwned;

use rxlink_core::{MutationOutcome, RefetchOptions, RefetchOutcome, RefetchReport};

use crate::cli::RefetchArgs;
use crate::error::CliError;
use crate::output;

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Read and parse a JSON file for `--from-file` flags.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("{}: {e}", path.display()),
    })
}

/// Parse a wire enum (`READY`, `female`, ...) case-insensitively.
pub fn parse_enum<T: DeserializeOwned>(field: &str, value: &str) -> Result<T, CliError> {
    serde_json::from_value(serde_json::Value::String(value.to_uppercase())).map_err(|_| {
        CliError::Validation {
            field: field.into(),
            reason: format!("unknown value '{value}'"),
        }
    })
}

pub fn refetch_options(args: &RefetchArgs) -> RefetchOptions {
    let options = RefetchOptions::new(args.refetch.iter().cloned());
    if args.await_refetch {
        options.awaited()
    } else {
        options
    }
}

/// One status line per requested refetch name.
pub fn report_refetch(report: &RefetchReport, quiet: bool) {
    for entry in &report.entries {
        let status = match &entry.outcome {
            RefetchOutcome::Refreshed => output::ok("refreshed"),
            RefetchOutcome::Started => output::ok("started"),
            RefetchOutcome::Failed { error } => {
                output::fail(&format!("failed: {}", error.message))
            }
            RefetchOutcome::Unknown => output::warn("skipped, not a defined query"),
        };
        output::print_status(&format!("refetch {}: {status}", entry.name), quiet);
    }
}

/// Report refetches, then surface the write's own result. Data that came
/// back alongside an application error is still returned, with a warning.
pub fn finish_mutation<T>(outcome: MutationOutcome<T>, quiet: bool) -> Result<T, CliError> {
    report_refetch(&outcome.refetch, quiet);
    match (outcome.data, outcome.error) {
        (Some(data), None) => Ok(data),
        (Some(data), Some(err)) => {
            output::print_status(&output::warn(&format!("warning: {}", err.message)), quiet);
            Ok(data)
        }
        (None, Some(err)) => Err(err.into()),
        (None, None) => Err(CliError::ApiError {
            code: "empty".into(),
            message: "the server returned no data".into(),
        }),
    }
}
