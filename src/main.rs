use std::io;
use std::path::PathBuf;
use std::process;

use clap::builder::BoolishValueParser;
use clap::error::ErrorKind;
use clap::{ArgGroup, Parser, Subcommand};
use lhgate::adapters::pipeline::PipelineCommands;
use lhgate::cmd::evaluate::{AssertionSource, EvaluateCommandArgs};
use lhgate::cmd::plan::PlanCommandArgs;
use lhgate::cmd::run::RunCommandArgs;
use lhgate::cmd::{evaluate, plan, run};
use serde::Serialize;
use serde_json::{Value, json};

#[derive(Debug, Parser)]
#[command(
    name = "lhgate",
    version,
    about = "Run Lighthouse in a pipeline and gate on audit score assertions"
)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Evaluate audit assertions against an existing Lighthouse JSON report.
    Evaluate(EvaluateArgs),
    /// Print report paths and the Lighthouse command line without running it.
    Plan(PlanArgs),
    /// Run Lighthouse, attach the report, and evaluate assertions (pipeline task).
    Run(RunArgs),
}

#[derive(Debug, clap::Args)]
#[command(group(
    ArgGroup::new("assertion_source")
        .required(true)
        .args(["assertions", "assertions_text"])
))]
struct EvaluateArgs {
    /// Lighthouse JSON report; `-` or omitted reads stdin.
    #[arg(long)]
    report: Option<PathBuf>,

    /// File with one assertion per line.
    #[arg(long)]
    assertions: Option<PathBuf>,

    /// Assertions given inline, one per line.
    #[arg(long, allow_hyphen_values = true)]
    assertions_text: Option<String>,
}

#[derive(Debug, clap::Args)]
struct PlanArgs {
    /// Target URL to audit.
    #[arg(long, env = "INPUT_URL")]
    url: Option<String>,

    /// Extra Lighthouse CLI arguments, whitespace or newline separated.
    #[arg(long = "args", env = "INPUT_ARGS", default_value = "", allow_hyphen_values = true)]
    lighthouse_args: String,

    /// Extra Chrome flags; `--headless` is always included.
    #[arg(long, env = "INPUT_CHROMEFLAGS", default_value = "", allow_hyphen_values = true)]
    chrome_flags: String,

    /// Agent temp directory; reports go to `<temp-dir>/__lighthouse`.
    #[arg(long, env = "AGENT_TEMPDIRECTORY")]
    temp_dir: Option<PathBuf>,

    /// Report file name suffix (defaults to the current Unix time in milliseconds).
    #[arg(long, env = "LIGHTHOUSE_REPORT_SUFFIX")]
    report_suffix: Option<String>,
}

#[derive(Debug, clap::Args)]
struct RunArgs {
    #[command(flatten)]
    plan: PlanArgs,

    /// Directory searched for a local `node_modules/lighthouse` install.
    #[arg(long, env = "INPUT_CWD")]
    cwd: Option<PathBuf>,

    /// Evaluate `--audit-rules` against the produced report.
    #[arg(
        long,
        env = "INPUT_EVALUATEAUDITRULES",
        action = clap::ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    evaluate_audit_rules: bool,

    /// Audit assertions, one per line.
    #[arg(long, env = "INPUT_AUDITRULESSTR", default_value = "", allow_hyphen_values = true)]
    audit_rules: String,

    /// Name shown for this report in the pipeline tab (defaults to the host name).
    #[arg(long, env = "INPUT_TABNAME")]
    tab_name: Option<String>,
}

impl From<PlanArgs> for PlanCommandArgs {
    fn from(value: PlanArgs) -> Self {
        Self {
            url: value.url,
            args: value.lighthouse_args,
            chrome_flags: value.chrome_flags,
            temp_dir: value.temp_dir,
            report_suffix: value.report_suffix,
        }
    }
}

#[derive(Serialize)]
struct CliError<'a> {
    error: &'a str,
    message: String,
    code: i32,
    details: Value,
}

fn main() {
    process::exit(run());
}

fn run() -> i32 {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => return handle_parse_error(error),
    };

    init_tracing(cli.verbose);

    match cli.command {
        Commands::Evaluate(args) => run_evaluate(args),
        Commands::Plan(args) => run_plan(args),
        Commands::Run(args) => run_task(args),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn handle_parse_error(error: clap::Error) -> i32 {
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            print!("{error}");
            0
        }
        _ => {
            emit_error(
                "input_usage_error",
                error.to_string(),
                json!({"kind": "cli_parse_error"}),
                3,
            );
            3
        }
    }
}

fn run_evaluate(args: EvaluateArgs) -> i32 {
    // The `assertion_source` group guarantees one of the two is present.
    let assertions = match args.assertions {
        Some(path) => AssertionSource::File(path),
        None => AssertionSource::Text(args.assertions_text.unwrap_or_default()),
    };
    let command_args = EvaluateCommandArgs {
        report: args.report,
        assertions,
    };

    let stdin = io::stdin();
    let response = evaluate::run_with_stdin(&command_args, stdin.lock());
    emit_response("evaluate", response.exit_code, &response.payload)
}

fn run_plan(args: PlanArgs) -> i32 {
    let response = plan::run(&args.into());
    emit_response("plan", response.exit_code, &response.payload)
}

fn run_task(args: RunArgs) -> i32 {
    let command_args = RunCommandArgs {
        plan: args.plan.into(),
        working_dir: args.cwd,
        evaluate_audit_rules: args.evaluate_audit_rules,
        audit_rules: args.audit_rules,
        tab_name: args.tab_name,
    };

    let mut commands = PipelineCommands::stdout();
    let response = run::run(&command_args, &mut commands);
    emit_response("run", response.exit_code, &response.payload)
}

/// Success and assertion-failure payloads go to stdout; errors go to stderr.
fn emit_response(command: &'static str, exit_code: i32, payload: &Value) -> i32 {
    let emitted = match exit_code {
        0 | 2 => emit_json_stdout(payload),
        1 | 3 => emit_json_stderr(payload),
        other => {
            emit_error(
                "internal_error",
                format!("unexpected {command} exit code: {other}"),
                json!({"command": command}),
                1,
            );
            return 1;
        }
    };

    if emitted {
        exit_code
    } else {
        emit_error(
            "internal_error",
            format!("failed to serialize {command} response"),
            json!({"command": command}),
            1,
        );
        1
    }
}

fn emit_json_stdout(value: &Value) -> bool {
    match serde_json::to_string(value) {
        Ok(serialized) => {
            println!("{serialized}");
            true
        }
        Err(_) => false,
    }
}

fn emit_json_stderr(value: &Value) -> bool {
    match serde_json::to_string(value) {
        Ok(serialized) => {
            eprintln!("{serialized}");
            true
        }
        Err(_) => false,
    }
}

fn emit_error(error: &'static str, message: String, details: Value, code: i32) {
    let payload = CliError {
        error,
        message,
        code,
        details,
    };
    match serde_json::to_string(&payload) {
        Ok(serialized) => eprintln!("{serialized}"),
        Err(_) => eprintln!(
            "{{\"error\":\"internal_error\",\"message\":\"failed to serialize error\",\"code\":1}}"
        ),
    }
}
