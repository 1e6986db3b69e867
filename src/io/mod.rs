pub mod error;
pub mod reader;
pub mod writer;

use std::path::Path;

pub use error::IoError;

/// Path value that selects stdin instead of a file.
pub const STDIN_PATH: &str = "-";

pub fn is_stdin_path(path: &Path) -> bool {
    path.as_os_str() == STDIN_PATH
}
