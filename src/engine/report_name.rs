use std::path::{Path, PathBuf};

use thiserror::Error;
use url::Url;

use crate::domain::report::ReportMeta;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportNameError {
    #[error("`{url}` is not a valid absolute URL with a host")]
    InvalidUrl { url: String },
    #[error("report suffix `{suffix}` must not contain path separators or `..`")]
    InvalidSuffix { suffix: String },
}

/// Lowercased host of `url`, used as the readable part of report file names.
pub fn hostname_from_url(url: &str) -> Result<String, ReportNameError> {
    let invalid = || ReportNameError::InvalidUrl {
        url: url.to_string(),
    };
    let parsed = Url::parse(url.trim()).map_err(|_| invalid())?;
    let host = parsed.host_str().filter(|host| !host.is_empty()).ok_or_else(invalid)?;
    Ok(host.to_ascii_lowercase())
}

/// `<host>-<suffix>`, the shared stem of every file produced for one run.
pub fn report_base_name(url: &str, suffix: &str) -> Result<String, ReportNameError> {
    if suffix.contains(['/', '\\']) || suffix.contains("..") {
        return Err(ReportNameError::InvalidSuffix {
            suffix: suffix.to_string(),
        });
    }
    Ok(format!("{}-{suffix}", hostname_from_url(url)?))
}

/// Locations of the files produced for one Lighthouse run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub base_name: String,
    pub output_base: PathBuf,
    pub html: PathBuf,
    pub json: PathBuf,
    pub meta: PathBuf,
}

impl ReportPaths {
    pub fn new(output_dir: &Path, base_name: impl Into<String>) -> Self {
        let base_name = base_name.into();
        Self {
            output_base: output_dir.join(&base_name),
            html: output_dir.join(format!("{base_name}.report.html")),
            json: output_dir.join(format!("{base_name}.report.json")),
            meta: output_dir.join(format!("{base_name}.meta.json")),
            base_name,
        }
    }

    pub fn html_file_name(&self) -> String {
        format!("{}.report.html", self.base_name)
    }

    pub fn meta_file_name(&self) -> String {
        format!("{}.meta.json", self.base_name)
    }

    pub fn meta(&self, tab_name: impl Into<String>) -> ReportMeta {
        ReportMeta {
            tab_name: tab_name.into(),
            report_file_name: self.html_file_name(),
            meta_file_name: self.meta_file_name(),
        }
    }
}
