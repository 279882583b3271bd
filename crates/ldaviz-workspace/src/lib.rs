//! ldaviz Workspace - Action dispatch and background tasks
//!
//! This crate implements the workspace use cases: it decides which action
//! can run given the current state, chains the loading actions a request
//! depends on, runs each job as a progress-reporting background task and
//! commits the results before notifying anyone.

pub mod action;
pub mod generate;
mod jobs;
pub mod task;
pub mod workspace;

pub use action::{Action, ActionOptions};
pub use generate::{Generator, ParameterSweep, ScriptGenerator, SweepRange};
pub use task::{Completion, Continuation, ProgressSink, TaskHandle, TaskStatus};
pub use workspace::{DirectoryStorageProvider, StorageProvider, Workspace, WorkspaceSettings};
