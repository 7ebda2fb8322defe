//! Pipeline driving: lifecycle until a stop condition, plus run statistics.

mod runner;
mod stats;

pub use runner::{drive, StopReason};
pub use stats::PipelineStats;
