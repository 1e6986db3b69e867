use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::info;

#[cfg(windows)]
use std::ffi::OsString;

/// Environment variable naming an explicit Lighthouse executable.
pub const LIGHTHOUSE_BIN_ENV: &str = "LHGATE_LIGHTHOUSE_BIN";

/// Entry scripts of the npm package, newest layout first.
const PACKAGE_ENTRY_POINTS: [&str; 2] = ["cli/index.js", "lighthouse-cli/index.js"];

#[derive(Debug, Error)]
pub enum LighthouseError {
    #[error("npm package \"lighthouse\" is not installed globally or locally")]
    NotInstalled,
    #[error("`{tool}` is required but was not found in PATH")]
    MissingTool { tool: &'static str },
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Lighthouse did not generate a {kind} output. Error code: {code}")]
    MissingOutput { kind: &'static str, code: String },
}

/// Where the Lighthouse executable was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallSource {
    Override,
    Local,
    Global,
    TaskInstall,
}

impl InstallSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Override => "override",
            Self::Local => "local",
            Self::Global => "global",
            Self::TaskInstall => "task_install",
        }
    }
}

/// Resolved program plus the arguments that precede the Lighthouse arguments
/// (the entry script when the package is run through `node`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LighthouseCommand {
    pub program: PathBuf,
    pub leading_args: Vec<String>,
    pub source: InstallSource,
}

impl LighthouseCommand {
    fn direct(program: PathBuf, source: InstallSource) -> Self {
        Self {
            program,
            leading_args: Vec::new(),
            source,
        }
    }

    fn via_node(script: PathBuf, source: InstallSource) -> Result<Self, LighthouseError> {
        let node = find_in_path(OsStr::new("node")).ok_or(LighthouseError::MissingTool { tool: "node" })?;
        Ok(Self {
            program: node,
            leading_args: vec![script.display().to_string()],
            source,
        })
    }

    /// Runs Lighthouse to completion and returns its exit code
    /// (`None` when terminated by a signal).
    pub fn execute(&self, args: &[String]) -> Result<Option<i32>, LighthouseError> {
        info!(program = %self.program.display(), source = self.source.as_str(), "executing Lighthouse");
        let status = Command::new(&self.program)
            .args(&self.leading_args)
            .args(args)
            .stdin(Stdio::null())
            .status()
            .map_err(|source| LighthouseError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;
        info!(code = %status_label(status.code()), "Lighthouse returned");
        Ok(status.code())
    }
}

/// Finds Lighthouse: explicit override, package installed in `working_dir`,
/// global executable, and finally a fresh npm install into `install_dir`.
pub fn locate(working_dir: &Path, install_dir: &Path) -> Result<LighthouseCommand, LighthouseError> {
    if let Some(program) = env::var_os(LIGHTHOUSE_BIN_ENV).filter(|value| !value.is_empty()) {
        return Ok(LighthouseCommand::direct(PathBuf::from(program), InstallSource::Override));
    }

    if let Some(script) = package_entry_point(working_dir) {
        info!(path = %script.display(), "locally installed Lighthouse found");
        return LighthouseCommand::via_node(script, InstallSource::Local);
    }

    if let Some(program) = find_in_path(OsStr::new("lighthouse")) {
        info!(path = %program.display(), "globally installed Lighthouse found");
        return Ok(LighthouseCommand::direct(program, InstallSource::Global));
    }

    if let Some(script) = package_entry_point(install_dir) {
        info!(path = %script.display(), "previously installed Lighthouse found");
        return LighthouseCommand::via_node(script, InstallSource::TaskInstall);
    }

    install_with_npm(install_dir)?;
    match package_entry_point(install_dir) {
        Some(script) => LighthouseCommand::via_node(script, InstallSource::TaskInstall),
        None => Err(LighthouseError::NotInstalled),
    }
}

/// Fails unless Lighthouse produced the file at `path`.
pub fn ensure_output(path: &Path, kind: &'static str, exit_code: Option<i32>) -> Result<(), LighthouseError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(LighthouseError::MissingOutput {
            kind,
            code: status_label(exit_code),
        })
    }
}

fn install_with_npm(install_dir: &Path) -> Result<(), LighthouseError> {
    let npm = find_in_path(OsStr::new("npm")).ok_or(LighthouseError::MissingTool { tool: "npm" })?;
    info!(prefix = %install_dir.display(), "existing Lighthouse installation not found, installing with npm");
    let status = Command::new(&npm)
        .arg("install")
        .arg("lighthouse")
        .arg("--prefix")
        .arg(install_dir)
        .arg("--loglevel=error")
        .stdin(Stdio::null())
        .status()
        .map_err(|source| LighthouseError::Spawn {
            program: npm.display().to_string(),
            source,
        })?;
    info!(code = %status_label(status.code()), "npm install returned");
    Ok(())
}

fn package_entry_point(prefix: &Path) -> Option<PathBuf> {
    let package_dir = prefix.join("node_modules").join("lighthouse");
    PACKAGE_ENTRY_POINTS
        .iter()
        .map(|entry| package_dir.join(entry))
        .find(|candidate| candidate.is_file())
}

fn status_label(code: Option<i32>) -> String {
    code.map(|value| value.to_string())
        .unwrap_or_else(|| "terminated by signal".to_string())
}

/// Agents may have Lighthouse, `node` and `npm` on `PATH` without a local
/// package, so the probe mirrors the shell's lookup (with `PATHEXT` on Windows).
fn find_in_path(tool: &OsStr) -> Option<PathBuf> {
    let path_var = env::var_os("PATH")?;
    env::split_paths(&path_var)
        .flat_map(|directory| candidate_paths(&directory, tool))
        .find(|candidate| candidate.is_file())
}

fn candidate_paths(directory: &Path, tool: &OsStr) -> Vec<PathBuf> {
    #[cfg(windows)]
    let mut candidates = vec![directory.join(tool)];
    #[cfg(not(windows))]
    let candidates = vec![directory.join(tool)];

    #[cfg(windows)]
    {
        if Path::new(tool).extension().is_none() {
            let pathext =
                env::var_os("PATHEXT").unwrap_or_else(|| OsString::from(".COM;.EXE;.BAT;.CMD"));
            for ext in env::split_paths(&pathext) {
                let ext_str = ext.to_string_lossy();
                if ext_str.is_empty() {
                    continue;
                }
                let mut name = OsString::from(tool);
                name.push(ext_str.as_ref());
                candidates.push(directory.join(name));
            }
        }
    }

    candidates
}
