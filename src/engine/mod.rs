pub mod cli_args;
pub mod evaluate;
pub mod report_name;
