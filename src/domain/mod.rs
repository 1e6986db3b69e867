pub mod assertion;
pub mod error;
pub mod report;
