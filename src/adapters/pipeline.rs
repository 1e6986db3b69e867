//! Azure Pipelines logging commands (`##vso[area.action key=value;]data`).
//!
//! The agent scans task stdout for these lines; nothing else is needed to
//! attach files to a run or to set the task result.

use std::io::{self, Write};
use std::path::Path;

pub const HTML_ATTACHMENT_TYPE: &str = "lighthouse_html_result";
pub const META_ATTACHMENT_TYPE: &str = "lighthouse_meta_result";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskResult {
    Succeeded,
    Failed,
}

impl TaskResult {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
        }
    }
}

/// Writes logging commands to any sink, normally stdout.
pub struct PipelineCommands<W: Write> {
    out: W,
}

impl PipelineCommands<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> PipelineCommands<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn add_attachment(&mut self, kind: &str, name: &str, path: &Path) -> io::Result<()> {
        self.command(
            "task.addattachment",
            &[("type", kind), ("name", name)],
            &path.display().to_string(),
        )
    }

    pub fn upload_file(&mut self, path: &Path) -> io::Result<()> {
        self.command("task.uploadfile", &[], &path.display().to_string())
    }

    pub fn complete(&mut self, result: TaskResult, message: &str) -> io::Result<()> {
        self.command("task.complete", &[("result", result.as_str())], message)
    }

    pub fn command(
        &mut self,
        name: &str,
        properties: &[(&str, &str)],
        data: &str,
    ) -> io::Result<()> {
        let mut line = format!("##vso[{name}");
        if !properties.is_empty() {
            line.push(' ');
            for (key, value) in properties {
                line.push_str(key);
                line.push('=');
                line.push_str(&escape_property(value));
                line.push(';');
            }
        }
        line.push(']');
        line.push_str(&escape_data(data));
        writeln!(self.out, "{line}")?;
        self.out.flush()
    }
}

fn escape_data(value: &str) -> String {
    value
        .replace('%', "%AZP25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn escape_property(value: &str) -> String {
    escape_data(value).replace(';', "%3B").replace(']', "%5D")
}
