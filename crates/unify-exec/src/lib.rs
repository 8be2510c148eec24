//! Edit-plan execution for unify.
//!
//! Runs the planner's step queue against the filesystem with bounded
//! parallelism, releasing each step only after the directory it depends on
//! has been created. The only mutations are directory creation and
//! numbered-backup file copies; nothing is ever deleted or overwritten.

mod executor;
mod fsops;

pub use executor::{ExecError, ExecReport, PlanExecutor, StepError};
pub use fsops::{copy_with_backup, numbered_backup_path, Mutation};

/// Default bound on concurrently running steps.
pub const DEFAULT_MAX_PARALLEL: usize = 10;

/// Buffer size of the worker completion channel.
pub(crate) const COMPLETION_CHANNEL_SIZE: usize = 100;
