#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};

use predicates::prelude::{PredicateBooleanExt, predicate};
use serde_json::{Value, json};
use tempfile::{TempDir, tempdir};

const FAKE_REPORT: &str = r#"{"audits":{"speed-index":{"score":0.62,"displayValue":"4.8 s"},"interactive":{"score":1},"diagnostics":{"score":null}}}"#;

fn write_exec_script(path: &Path, body: &str) {
    fs::write(path, body).expect("write script");
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).expect("chmod");
}

/// Fake Lighthouse that writes both reports next to `--output-path` and
/// records the arguments it received.
fn fake_lighthouse(dir: &Path) -> PathBuf {
    let script = dir.join("fake-lighthouse");
    write_exec_script(
        &script,
        &format!(
            r#"#!/bin/sh
out=""
for arg in "$@"; do
  case "$arg" in
    --output-path=*) out="${{arg#--output-path=}}" ;;
  esac
done
printf '%s\n' "$@" > "$out.args"
printf '<html>lighthouse</html>' > "$out.report.html"
cat > "$out.report.json" <<'JSON'
{FAKE_REPORT}
JSON
"#
        ),
    );
    script
}

fn broken_lighthouse(dir: &Path) -> PathBuf {
    let script = dir.join("broken-lighthouse");
    write_exec_script(&script, "#!/bin/sh\necho 'chrome failed to launch' 1>&2\nexit 1\n");
    script
}

struct Workspace {
    root: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let root = tempdir().expect("tempdir");
        fs::create_dir_all(root.path().join("agent-temp")).expect("mkdir temp");
        fs::create_dir_all(root.path().join("sources")).expect("mkdir sources");
        Self { root }
    }

    fn temp_dir(&self) -> PathBuf {
        self.root.path().join("agent-temp")
    }

    fn sources(&self) -> PathBuf {
        self.root.path().join("sources")
    }

    fn output_dir(&self) -> PathBuf {
        self.temp_dir().join("__lighthouse")
    }

    fn command(&self, lighthouse: &Path) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("lhgate");
        cmd.arg("run")
            .env("LHGATE_LIGHTHOUSE_BIN", lighthouse)
            .env("INPUT_URL", "https://www.example.com/")
            .env("AGENT_TEMPDIRECTORY", self.temp_dir())
            .env("BUILD_SOURCESDIRECTORY", self.sources())
            .env("LIGHTHOUSE_REPORT_SUFFIX", "12345")
            .env_remove("INPUT_CWD")
            .env_remove("BUILD_SOURCEDIRECTORY")
            .env_remove("INPUT_EVALUATEAUDITRULES")
            .env_remove("INPUT_AUDITRULESSTR");
        cmd
    }
}

fn last_json_line(stdout: &[u8]) -> Value {
    let text = String::from_utf8(stdout.to_vec()).expect("stdout utf8");
    let line = text
        .lines()
        .rev()
        .find(|line| line.starts_with('{'))
        .expect("json line");
    serde_json::from_str(line).expect("stdout json")
}

#[test]
fn run_attaches_report_and_writes_meta() {
    let workspace = Workspace::new();
    let lighthouse = fake_lighthouse(workspace.root.path());

    let output = workspace
        .command(&lighthouse)
        .args(["--args", "--quiet --view"])
        .output()
        .expect("run lhgate");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8(output.stdout.clone()).expect("stdout utf8");
    let html = workspace.output_dir().join("www.example.com-12345.report.html");
    let json_report = workspace.output_dir().join("www.example.com-12345.report.json");
    let meta = workspace.output_dir().join("www.example.com-12345.meta.json");

    assert!(stdout.contains(&format!(
        "##vso[task.addattachment type=lighthouse_html_result;name=www.example.com-12345.report.html;]{}",
        html.display()
    )));
    assert!(stdout.contains(&format!(
        "##vso[task.addattachment type=lighthouse_meta_result;name=www.example.com-12345.meta.json;]{}",
        meta.display()
    )));
    assert!(stdout.contains(&format!("##vso[task.uploadfile]{}", json_report.display())));
    assert!(stdout.contains("##vso[task.complete result=Succeeded;]"));

    let payload = last_json_line(&output.stdout);
    assert_eq!(payload["status"], json!("succeeded"));
    assert_eq!(payload["lighthouse"]["source"], json!("override"));
    assert_eq!(payload["success_count"], Value::Null);

    let meta_value: Value =
        serde_json::from_str(&fs::read_to_string(&meta).expect("read meta")).expect("meta json");
    assert_eq!(
        meta_value,
        json!({
            "tabName": "www.example.com",
            "reportFileName": "www.example.com-12345.report.html",
            "metaFileName": "www.example.com-12345.meta.json"
        })
    );

    let recorded_args =
        fs::read_to_string(workspace.output_dir().join("www.example.com-12345.args"))
            .expect("recorded args");
    let recorded: Vec<&str> = recorded_args.lines().collect();
    assert_eq!(recorded[0], "https://www.example.com/");
    assert_eq!(recorded[1], "--quiet");
    assert!(!recorded.contains(&"--view"));
    assert_eq!(recorded.last(), Some(&"--chrome-flags=--headless"));
}

#[test]
fn run_evaluates_assertions_when_enabled() {
    let workspace = Workspace::new();
    let lighthouse = fake_lighthouse(workspace.root.path());

    let output = workspace
        .command(&lighthouse)
        .env("INPUT_EVALUATEAUDITRULES", "true")
        .env("INPUT_AUDITRULESSTR", "interactive = 1\r\ndiagnostics > 0.5\r\nspeed-index > 0.5")
        .env("INPUT_TABNAME", "Home page")
        .output()
        .expect("run lhgate");

    assert_eq!(output.status.code(), Some(0));
    let payload = last_json_line(&output.stdout);
    assert_eq!(payload["success_count"], json!(2));

    let meta = fs::read_to_string(workspace.output_dir().join("www.example.com-12345.meta.json"))
        .expect("read meta");
    assert!(meta.contains("\"tabName\": \"Home page\""));
}

#[test]
fn run_fails_task_on_unmet_assertions_but_still_attaches() {
    let workspace = Workspace::new();
    let lighthouse = fake_lighthouse(workspace.root.path());

    let output = workspace
        .command(&lighthouse)
        .args([
            "--evaluate-audit-rules",
            "--audit-rules",
            "speed-index > 0.9\nmissing-audit > 0",
        ])
        .output()
        .expect("run lhgate");

    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8(output.stdout.clone()).expect("stdout utf8");
    assert!(stdout.contains("##vso[task.addattachment type=lighthouse_html_result;"));
    assert!(stdout.contains(
        "##vso[task.complete result=Failed;]Expected greater than 0.9 for audit \"speed-index\" score but got 0.62, friendly display value: 4.8 s%0ACould not find audit \"missing-audit\""
    ));

    let payload = last_json_line(&output.stdout);
    assert_eq!(payload["matched"], json!(false));
    assert_eq!(payload["failure_count"], json!(2));
}

#[test]
fn assertions_are_ignored_unless_enabled() {
    let workspace = Workspace::new();
    let lighthouse = fake_lighthouse(workspace.root.path());

    workspace
        .command(&lighthouse)
        .args(["--audit-rules", "speed-index > 0.9"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("\"status\":\"succeeded\""));
}

#[test]
fn run_fails_when_lighthouse_produces_no_report() {
    let workspace = Workspace::new();
    let lighthouse = broken_lighthouse(workspace.root.path());

    workspace
        .command(&lighthouse)
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "##vso[task.complete result=Failed;]Lighthouse did not generate a JSON output. Error code: 1",
        ))
        .stdout(predicate::str::contains("task.addattachment").not())
        .stderr(predicate::str::contains("lighthouse_error"));
}

#[test]
fn run_requires_a_working_directory() {
    let workspace = Workspace::new();
    let lighthouse = fake_lighthouse(workspace.root.path());

    workspace
        .command(&lighthouse)
        .env_remove("BUILD_SOURCESDIRECTORY")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Working directory is not defined"));
}
