use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde_json::Value;

use crate::domain::report::LighthouseReport;
use crate::io::IoError;

/// Reads a Lighthouse JSON report. A `null` document is an empty report.
pub fn read_report<R: Read>(reader: R) -> Result<LighthouseReport, IoError> {
    let value: Value = serde_json::from_reader(reader)?;
    match value {
        Value::Null => Ok(LighthouseReport::default()),
        Value::Object(_) => Ok(serde_json::from_value(value)?),
        _ => Err(IoError::ReportShape),
    }
}

pub fn read_report_path(path: &Path) -> Result<LighthouseReport, IoError> {
    let file = File::open(path).map_err(|source| IoError::Open {
        path: path.display().to_string(),
        source,
    })?;
    read_report(BufReader::new(file))
}

pub fn read_text_path(path: &Path) -> Result<String, IoError> {
    std::fs::read_to_string(path).map_err(|source| IoError::Open {
        path: path.display().to_string(),
        source,
    })
}
