use std::env;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Value, json};

use crate::engine::cli_args;
use crate::engine::report_name::{self, ReportNameError, ReportPaths};
use crate::util::time::unix_millis_suffix;

/// Directory created under the agent temp directory for reports and installs.
pub const TASK_TEMP_FOLDER: &str = "__lighthouse";

/// Inputs that decide where reports go and how Lighthouse is invoked.
#[derive(Debug, Clone, Default)]
pub struct PlanCommandArgs {
    pub url: Option<String>,
    pub args: String,
    pub chrome_flags: String,
    pub temp_dir: Option<PathBuf>,
    pub report_suffix: Option<String>,
}

/// Structured command response that carries exit-code mapping and JSON payload.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlanCommandResponse {
    pub exit_code: i32,
    pub payload: Value,
}

/// Fully resolved invocation for one Lighthouse run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPlan {
    pub url: String,
    pub hostname: String,
    pub output_dir: PathBuf,
    pub paths: ReportPaths,
    pub lighthouse_args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("Input required: url")]
    MissingUrl,
    #[error(transparent)]
    ReportName(#[from] ReportNameError),
}

impl TaskPlan {
    pub fn resolve(args: &PlanCommandArgs) -> Result<Self, PlanError> {
        let url = args
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(PlanError::MissingUrl)?;
        let hostname = report_name::hostname_from_url(url)?;

        let suffix = args
            .report_suffix
            .clone()
            .filter(|suffix| !suffix.trim().is_empty())
            .unwrap_or_else(unix_millis_suffix);
        let base_name = report_name::report_base_name(url, &suffix)?;

        let output_dir = args
            .temp_dir
            .clone()
            .unwrap_or_else(env::temp_dir)
            .join(TASK_TEMP_FOLDER);
        let paths = ReportPaths::new(&output_dir, base_name);

        let lighthouse_args = cli_args::lighthouse_args(
            url,
            &cli_args::sanitize_args(&args.args),
            &cli_args::sanitize_chrome_flags(&args.chrome_flags),
            &paths.output_base,
        );

        Ok(Self {
            url: url.to_string(),
            hostname,
            output_dir,
            paths,
            lighthouse_args,
        })
    }

    pub fn to_json(&self) -> Value {
        json!({
            "url": self.url,
            "output_dir": self.output_dir.display().to_string(),
            "report": {
                "base_name": self.paths.base_name,
                "html": self.paths.html.display().to_string(),
                "json": self.paths.json.display().to_string(),
                "meta": self.paths.meta.display().to_string(),
            },
            "lighthouse_args": self.lighthouse_args,
        })
    }
}

pub fn run(args: &PlanCommandArgs) -> PlanCommandResponse {
    match TaskPlan::resolve(args) {
        Ok(plan) => PlanCommandResponse {
            exit_code: 0,
            payload: plan.to_json(),
        },
        Err(error) => PlanCommandResponse {
            exit_code: 3,
            payload: json!({
                "error": "input_usage_error",
                "message": error.to_string(),
            }),
        },
    }
}
