use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::adapters::lighthouse::{self, LighthouseError};
use crate::adapters::pipeline::{
    HTML_ATTACHMENT_TYPE, META_ATTACHMENT_TYPE, PipelineCommands, TaskResult,
};
use crate::cmd::evaluate::outcome_response;
use crate::cmd::plan::{PlanCommandArgs, TaskPlan};
use crate::domain::report::LighthouseReport;
use crate::engine::evaluate;
use crate::io;

/// Agent variables consulted, in order, when no working directory is given.
const SOURCE_DIRECTORY_VARIABLES: [&str; 2] = ["BUILD_SOURCEDIRECTORY", "BUILD_SOURCESDIRECTORY"];

/// Input arguments for the pipeline task driver.
#[derive(Debug, Clone, Default)]
pub struct RunCommandArgs {
    pub plan: PlanCommandArgs,
    pub working_dir: Option<PathBuf>,
    pub evaluate_audit_rules: bool,
    pub audit_rules: String,
    pub tab_name: Option<String>,
}

/// Structured command response that carries exit-code mapping and JSON payload.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunCommandResponse {
    pub exit_code: i32,
    pub payload: Value,
}

/// Runs Lighthouse, records the report as a pipeline attachment and, when
/// enabled, gates on the audit assertions. Logging commands go to `commands`.
pub fn run<W: Write>(args: &RunCommandArgs, commands: &mut PipelineCommands<W>) -> RunCommandResponse {
    let plan = match TaskPlan::resolve(&args.plan) {
        Ok(plan) => plan,
        Err(error) => return fail(commands, CommandError::InputUsage(error.to_string())),
    };

    let result = execute(args, &plan);

    if plan.paths.html.is_file() {
        attach_reports(commands, &plan);
    }

    match result {
        Ok(outcome) => {
            if let Err(error) = commands.complete(TaskResult::Succeeded, "Lighthouse task finished") {
                warn!(%error, "failed to write task result");
            }
            RunCommandResponse {
                exit_code: 0,
                payload: outcome.to_json(&plan),
            }
        }
        Err(error) => fail(commands, error),
    }
}

struct RunOutcome {
    lighthouse_exit_code: Option<i32>,
    source: &'static str,
    success_count: Option<usize>,
}

impl RunOutcome {
    fn to_json(&self, plan: &TaskPlan) -> Value {
        json!({
            "status": "succeeded",
            "report": {
                "html": plan.paths.html.display().to_string(),
                "json": plan.paths.json.display().to_string(),
                "meta": plan.paths.meta.display().to_string(),
            },
            "lighthouse": {
                "source": self.source,
                "exit_code": self.lighthouse_exit_code,
            },
            "success_count": self.success_count,
        })
    }
}

fn execute(args: &RunCommandArgs, plan: &TaskPlan) -> Result<RunOutcome, CommandError> {
    let working_dir = resolve_working_dir(args.working_dir.as_deref())
        .ok_or_else(|| CommandError::InputUsage("Working directory is not defined".to_string()))?;
    info!(url = %plan.url, "Lighthouse target URL");
    info!(path = %working_dir.display(), "working directory");
    info!(path = %plan.output_dir.display(), "temporary directory");

    fs::create_dir_all(&plan.output_dir).map_err(|err| {
        CommandError::Internal(format!(
            "failed to create `{}`: {err}",
            plan.output_dir.display()
        ))
    })?;
    info!(path = %plan.paths.html.display(), "HTML report will be saved");
    info!(path = %plan.paths.json.display(), "JSON report will be saved");

    let command = lighthouse::locate(&working_dir, &plan.output_dir)?;
    let exit_code = command.execute(&plan.lighthouse_args)?;
    lighthouse::ensure_output(&plan.paths.json, "JSON", exit_code)?;
    lighthouse::ensure_output(&plan.paths.html, "HTML", exit_code)?;

    let tab_name = args
        .tab_name
        .clone()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| plan.hostname.clone());
    io::writer::write_json_path(&plan.paths.meta, &plan.paths.meta(tab_name))
        .map_err(|err| CommandError::Internal(err.to_string()))?;

    let report = io::reader::read_report_path(&plan.paths.json).map_err(|err| {
        CommandError::Lighthouse(format!("Lighthouse produced an unreadable JSON report: {err}"))
    })?;

    let success_count = if args.evaluate_audit_rules {
        Some(evaluate_assertions(&report, &args.audit_rules)?)
    } else {
        None
    };

    Ok(RunOutcome {
        lighthouse_exit_code: exit_code,
        source: command.source.as_str(),
        success_count,
    })
}

fn evaluate_assertions(report: &LighthouseReport, assertions: &str) -> Result<usize, CommandError> {
    let outcome = evaluate::evaluate(Some(report), Some(assertions));
    match outcome {
        Ok(success_count) => {
            info!(success_count, "audit assertions satisfied");
            Ok(success_count)
        }
        Err(failure) => {
            let message = failure.to_string();
            let payload = outcome_response(Err(failure)).payload;
            Err(CommandError::AssertionsFailed { message, payload })
        }
    }
}

fn resolve_working_dir(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit.filter(|path| !path.as_os_str().is_empty()) {
        return Some(path.to_path_buf());
    }
    SOURCE_DIRECTORY_VARIABLES
        .iter()
        .filter_map(env::var_os)
        .find(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn attach_reports<W: Write>(commands: &mut PipelineCommands<W>, plan: &TaskPlan) {
    info!("adding the report as attachment of this build / release");
    let mut results = vec![commands.add_attachment(
        HTML_ATTACHMENT_TYPE,
        &plan.paths.html_file_name(),
        &plan.paths.html,
    )];
    if plan.paths.meta.is_file() {
        results.push(commands.add_attachment(
            META_ATTACHMENT_TYPE,
            &plan.paths.meta_file_name(),
            &plan.paths.meta,
        ));
    }
    results.push(commands.upload_file(&plan.paths.html));
    if plan.paths.json.is_file() {
        results.push(commands.upload_file(&plan.paths.json));
    }

    for error in results.into_iter().filter_map(Result::err) {
        warn!(%error, "failed to write attachment command");
    }
}

fn fail<W: Write>(commands: &mut PipelineCommands<W>, error: CommandError) -> RunCommandResponse {
    let message = error.message().to_string();
    if let Err(write_error) = commands.complete(TaskResult::Failed, &message) {
        warn!(error = %write_error, "failed to write task result");
    }

    match error {
        CommandError::AssertionsFailed { payload, .. } => RunCommandResponse {
            exit_code: 2,
            payload,
        },
        other => RunCommandResponse {
            exit_code: other.exit_code(),
            payload: json!({
                "error": other.kind(),
                "message": message,
            }),
        },
    }
}

enum CommandError {
    InputUsage(String),
    Lighthouse(String),
    Internal(String),
    AssertionsFailed { message: String, payload: Value },
}

impl CommandError {
    fn message(&self) -> &str {
        match self {
            Self::InputUsage(message)
            | Self::Lighthouse(message)
            | Self::Internal(message)
            | Self::AssertionsFailed { message, .. } => message,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::InputUsage(_) => "input_usage_error",
            Self::Lighthouse(_) => "lighthouse_error",
            Self::Internal(_) => "internal_error",
            Self::AssertionsFailed { .. } => "assertions_failed",
        }
    }

    fn exit_code(&self) -> i32 {
        match self {
            Self::InputUsage(_) => 3,
            Self::AssertionsFailed { .. } => 2,
            Self::Lighthouse(_) | Self::Internal(_) => 1,
        }
    }
}

impl From<LighthouseError> for CommandError {
    fn from(error: LighthouseError) -> Self {
        Self::Lighthouse(error.to_string())
    }
}
