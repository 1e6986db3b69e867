use std::io::Read;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Value, json};

use crate::domain::error::EvaluationFailure;
use crate::domain::report::LighthouseReport;
use crate::engine::evaluate;
use crate::io::{self, IoError};

/// Where the assertion block comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssertionSource {
    Text(String),
    File(PathBuf),
}

/// Input arguments for evaluate command execution API.
#[derive(Debug, Clone)]
pub struct EvaluateCommandArgs {
    /// Report path; `None` or `-` reads the report from stdin.
    pub report: Option<PathBuf>,
    pub assertions: AssertionSource,
}

/// Structured command response that carries exit-code mapping and JSON payload.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EvaluateCommandResponse {
    pub exit_code: i32,
    pub payload: Value,
}

pub fn run_with_stdin<R: Read>(args: &EvaluateCommandArgs, stdin: R) -> EvaluateCommandResponse {
    match execute(args, stdin) {
        Ok(outcome) => outcome_response(outcome),
        Err(CommandError::InputUsage(message)) => EvaluateCommandResponse {
            exit_code: 3,
            payload: json!({
                "error": "input_usage_error",
                "message": message,
            }),
        },
    }
}

/// Payload and exit code for an evaluation outcome: 0 when every assertion
/// held, 2 when at least one failed.
pub fn outcome_response(outcome: Result<usize, EvaluationFailure>) -> EvaluateCommandResponse {
    match outcome {
        Ok(success_count) => EvaluateCommandResponse {
            exit_code: 0,
            payload: json!({
                "matched": true,
                "success_count": success_count,
            }),
        },
        Err(failure) => EvaluateCommandResponse {
            exit_code: 2,
            payload: json!({
                "matched": false,
                "failure_count": failure.len(),
                "failures": failure.failures(),
                "message": failure.to_string(),
            }),
        },
    }
}

fn execute<R: Read>(
    args: &EvaluateCommandArgs,
    stdin: R,
) -> Result<Result<usize, EvaluationFailure>, CommandError> {
    let assertions = load_assertions(&args.assertions)?;
    let report = load_report(args, stdin)?;
    Ok(evaluate::evaluate(Some(&report), Some(assertions.as_str())))
}

fn load_assertions(source: &AssertionSource) -> Result<String, CommandError> {
    match source {
        AssertionSource::Text(text) => Ok(text.clone()),
        AssertionSource::File(path) => io::reader::read_text_path(path).map_err(|err| {
            CommandError::InputUsage(format!("failed to read assertions: {err}"))
        }),
    }
}

fn load_report<R: Read>(args: &EvaluateCommandArgs, stdin: R) -> Result<LighthouseReport, CommandError> {
    let result = match args.report.as_deref() {
        Some(path) if !io::is_stdin_path(path) => io::reader::read_report_path(path),
        _ => io::reader::read_report(stdin),
    };
    result.map_err(map_report_error)
}

fn map_report_error(error: IoError) -> CommandError {
    CommandError::InputUsage(format!("failed to load report: {error}"))
}

enum CommandError {
    InputUsage(String),
}
