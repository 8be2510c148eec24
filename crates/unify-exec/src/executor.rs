//! Concurrent execution of a merge plan.
//!
//! One supervisor task owns the scheduling state; up to `max_parallel`
//! worker tasks run filesystem mutations and report back over a completion
//! channel. Workers never touch the node graph: each step is resolved to
//! plain paths before it is launched, and only the supervisor flips
//! `created` flags and releases dependents.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;

use thiserror::Error;
use tokio::sync::mpsc;

use unify_core::{Arena, EditStep, NodeId};
use unify_plan::MergePlan;

use crate::fsops::Mutation;
use crate::{COMPLETION_CHANNEL_SIZE, DEFAULT_MAX_PARALLEL};

/// An error that occurred while executing one step.
#[derive(Debug, Clone)]
pub struct StepError {
    /// The path the step acted on.
    pub path: PathBuf,
    /// A human-readable error message.
    pub message: String,
}

impl std::fmt::Display for StepError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

/// Execution failures. Prior steps are never rolled back; steps that
/// depended on a failed step simply stay blocked.
#[derive(Debug, Error)]
pub enum ExecError {
    /// One or more steps failed or could never be released.
    #[error("{} step(s) failed, {blocked} left blocked", .failed.len())]
    Incomplete {
        /// Steps that reported failure.
        failed: Vec<StepError>,
        /// Steps whose prerequisite never completed.
        blocked: usize,
    },
}

/// Summary of a completed execution.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecReport {
    /// Steps that completed successfully.
    pub completed: usize,
    /// Bytes written by copy steps.
    pub bytes_copied: u64,
    /// Highest number of steps that were in flight at once.
    pub max_in_flight: usize,
}

/// Executor running a plan's steps with bounded parallelism.
#[derive(Debug, Clone, Copy)]
pub struct PlanExecutor {
    max_parallel: usize,
}

impl Default for PlanExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PARALLEL)
    }
}

impl PlanExecutor {
    /// Create an executor running at most `max_parallel` steps at once.
    pub fn new(max_parallel: usize) -> Self {
        Self {
            max_parallel: max_parallel.max(1),
        }
    }

    /// Run every step of `plan`, honoring parent-before-child ordering.
    ///
    /// A step launches only once its prerequisite node is `created`; steps
    /// pulled from the plan while their prerequisite is still pending wait
    /// keyed under it and are released on its completion.
    pub async fn execute(
        &self,
        arena: &mut Arena,
        plan: MergePlan,
    ) -> Result<ExecReport, ExecError> {
        let mut pending = plan.steps;
        let mut state = ExecState::default();
        let (tx, mut rx) = mpsc::channel::<Completion>(COMPLETION_CHANNEL_SIZE);

        'supervise: while !(pending.is_empty()
            && state.waiting.is_empty()
            && state.ready.is_empty())
        {
            // Block while at capacity, or while nothing can be launched yet.
            while state.running >= self.max_parallel
                || (state.ready.is_empty() && pending.is_empty())
            {
                if state.running == 0 {
                    // Nothing in flight will ever release the waiters.
                    break 'supervise;
                }
                match rx.recv().await {
                    Some(done) => state.complete(arena, done),
                    None => break 'supervise,
                }
            }

            let next = match state.ready.pop_front() {
                Some(step) => Some(step),
                None => loop {
                    // Classify pending steps until one is launchable.
                    let Some(step) = pending.pop_front() else {
                        break None;
                    };
                    match step.prerequisite(arena) {
                        Some(p) if !arena[p].created => {
                            state.waiting.entry(p).or_default().push(step);
                        }
                        _ => break Some(step),
                    }
                },
            };
            let Some(step) = next else {
                continue;
            };

            state.running += 1;
            state.max_in_flight = state.max_in_flight.max(state.running);
            self.launch(arena, step, tx.clone());
        }

        while state.running > 0 {
            match rx.recv().await {
                Some(done) => state.complete(arena, done),
                None => break,
            }
        }

        let blocked = pending.len() + state.waiting.values().map(Vec::len).sum::<usize>();
        if state.failed.is_empty() && blocked == 0 {
            Ok(ExecReport {
                completed: state.completed,
                bytes_copied: state.bytes_copied,
                max_in_flight: state.max_in_flight,
            })
        } else {
            Err(ExecError::Incomplete {
                failed: state.failed,
                blocked,
            })
        }
    }

    /// Spawn one step as a worker task.
    fn launch(&self, arena: &Arena, step: EditStep, tx: mpsc::Sender<Completion>) {
        let acting = step.acting();
        let mutation = match step {
            EditStep::Mkdir { target } => Mutation::Mkdir {
                path: arena[target].path.clone(),
            },
            EditStep::Copy { source, dest_dir } => Mutation::Copy {
                source: arena[source].path.clone(),
                dest_dir: arena[dest_dir].path.clone(),
            },
        };

        tokio::spawn(async move {
            let path = mutation.target().to_path_buf();
            let result = match tokio::task::spawn_blocking(move || mutation.apply()).await {
                Ok(result) => result,
                Err(e) => Err(format!("Task failed: {e}")),
            };
            let _ = tx.send(Completion {
                acting,
                path,
                result,
            })
            .await;
        });
    }
}

/// Completion notice sent by a worker.
struct Completion {
    acting: NodeId,
    path: PathBuf,
    result: Result<u64, String>,
}

/// Mutable scheduling state, owned by the supervisor.
#[derive(Default)]
struct ExecState {
    /// Steps blocked until the keyed node is created.
    waiting: HashMap<NodeId, Vec<EditStep>>,
    /// Released steps awaiting launch.
    ready: VecDeque<EditStep>,
    running: usize,
    completed: usize,
    bytes_copied: u64,
    max_in_flight: usize,
    failed: Vec<StepError>,
}

impl ExecState {
    /// Fold one completion into the schedule: mark the acting node created
    /// and release every step that was waiting on it. A failed step
    /// releases nothing, leaving its dependents blocked.
    fn complete(&mut self, arena: &mut Arena, done: Completion) {
        self.running -= 1;
        match done.result {
            Ok(bytes) => {
                self.completed += 1;
                self.bytes_copied += bytes;
                arena[done.acting].created = true;
                if let Some(released) = self.waiting.remove(&done.acting) {
                    self.ready.extend(released);
                }
            }
            Err(message) => self.failed.push(StepError {
                path: done.path,
                message,
            }),
        }
    }
}
