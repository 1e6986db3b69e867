pub mod lighthouse;
pub mod pipeline;
