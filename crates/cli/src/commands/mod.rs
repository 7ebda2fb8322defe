//! Command implementations.

mod history;
mod info;
mod replay;
mod run;
mod validate;

pub use history::run_history;
pub use info::run_info;
pub use replay::run_replay;
pub use run::run_pipeline;
pub use validate::run_validate;
