pub mod evaluate;
pub mod plan;
pub mod run;
