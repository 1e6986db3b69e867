use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::io::IoError;

/// Serializes `value` as pretty JSON into `path`, replacing any existing file.
pub fn write_json_path<T: Serialize>(path: &Path, value: &T) -> Result<(), IoError> {
    let as_write_error = |source| IoError::Write {
        path: path.display().to_string(),
        source,
    };
    let file = File::create(path).map_err(as_write_error)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush().map_err(as_write_error)
}
