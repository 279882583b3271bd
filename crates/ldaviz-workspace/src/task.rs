//! Background tasks and the completion protocol
//!
//! A task runs one job off the calling thread. When it reaches a terminal
//! state it commits its results to the workspace (success only), publishes
//! the completion to workspace subscribers, invokes every registered
//! continuation once and finally resolves the caller's handle. A job that
//! panics ends as `Failed` through the same path.

use chrono::{DateTime, Utc};
use futures::FutureExt;
use ldaviz_core::error::LdavizError;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{broadcast, oneshot, watch};
use uuid::Uuid;

use crate::action::Action;
use crate::jobs::{Job, JobOutcome};
use crate::workspace::Workspace;

/// Receives the progress fraction of a task
pub trait ProgressSink: Send + Sync {
    /// Called with a value in `[0, 1]` that never decreases
    fn update(&self, fraction: f64);
}

impl<F> ProgressSink for F
where
    F: Fn(f64) + Send + Sync,
{
    fn update(&self, fraction: f64) {
        self(fraction)
    }
}

/// Callback run once with the completion of the requested action
pub type Continuation = Box<dyn FnOnce(&Completion) + Send + 'static>;

/// Terminal state of a task
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum TaskStatus {
    /// The job finished and its results were committed
    Completed { items: usize },
    /// The artifact the job loads does not exist yet
    NotFound,
    /// The job failed; nothing was committed
    Failed { reason: String },
}

impl TaskStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, TaskStatus::Completed { .. })
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Completed { items } => write!(f, "completed ({} items)", items),
            TaskStatus::NotFound => f.write_str("not found"),
            TaskStatus::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}

/// Notification that an action finished
#[derive(Debug, Clone, Serialize)]
pub struct Completion {
    pub task_id: Uuid,
    pub action: Action,
    #[serde(flatten)]
    pub status: TaskStatus,
    pub finished_at: DateTime<Utc>,
}

impl Completion {
    pub fn new(task_id: Uuid, action: Action, status: TaskStatus) -> Self {
        Self { task_id, action, status, finished_at: Utc::now() }
    }
}

/// Publishes monotonic progress to a watch channel and an optional sink
#[derive(Clone)]
pub(crate) struct ProgressReporter {
    tx: Arc<watch::Sender<f64>>,
    sink: Option<Arc<dyn ProgressSink>>,
}

impl ProgressReporter {
    fn new(sink: Option<Arc<dyn ProgressSink>>) -> (Self, watch::Receiver<f64>) {
        let (tx, rx) = watch::channel(0.0);
        (Self { tx: Arc::new(tx), sink }, rx)
    }

    /// Report `done` of `total` units; ignored when it would move backwards
    pub(crate) fn update_progress(&self, done: usize, total: usize) {
        if total == 0 {
            return;
        }
        self.publish((done as f64 / total as f64).clamp(0.0, 1.0));
    }

    pub(crate) fn finish(&self) {
        self.publish(1.0);
    }

    fn publish(&self, fraction: f64) {
        let advanced = self.tx.send_if_modified(|current| {
            if fraction > *current {
                *current = fraction;
                true
            } else {
                false
            }
        });

        if advanced {
            if let Some(sink) = &self.sink {
                sink.update(fraction);
            }
        }
    }
}

/// Caller-facing side of a requested action
///
/// The handle follows the task that runs the requested action itself, not
/// the loading tasks chained in front of it.
#[derive(Debug)]
pub struct TaskHandle {
    id: Uuid,
    action: Action,
    progress: watch::Receiver<f64>,
    result: oneshot::Receiver<Completion>,
}

impl TaskHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn action(&self) -> Action {
        self.action
    }

    /// Latest published progress fraction
    pub fn progress(&self) -> f64 {
        *self.progress.borrow()
    }

    /// A receiver that observes every progress change
    pub fn watch_progress(&self) -> watch::Receiver<f64> {
        self.progress.clone()
    }

    /// Wait for the terminal state
    pub async fn wait(self) -> Completion {
        let (id, action) = (self.id, self.action);
        self.result.await.unwrap_or_else(|_| {
            Completion::new(
                id,
                action,
                TaskStatus::Failed { reason: "task was dropped before completing".to_string() },
            )
        })
    }
}

/// The reporting half of a request, carried until a task takes it over
pub(crate) struct Binding {
    task_id: Uuid,
    action: Action,
    progress: ProgressReporter,
    continuations: Vec<Continuation>,
    result: oneshot::Sender<Completion>,
}

impl Binding {
    pub(crate) fn new(
        action: Action,
        sink: Option<Arc<dyn ProgressSink>>,
        continuation: Option<Continuation>,
    ) -> (Self, TaskHandle) {
        let task_id = Uuid::new_v4();
        let (progress, progress_rx) = ProgressReporter::new(sink);
        let (result_tx, result_rx) = oneshot::channel();

        let binding = Self {
            task_id,
            action,
            progress,
            continuations: continuation.into_iter().collect(),
            result: result_tx,
        };
        let handle = TaskHandle { id: task_id, action, progress: progress_rx, result: result_rx };
        (binding, handle)
    }

    /// A binding nobody outside the workspace observes
    pub(crate) fn internal(action: Action, continuation: Option<Continuation>) -> Self {
        Self::new(action, None, continuation).0
    }

    pub(crate) fn action(&self) -> Action {
        self.action
    }

    /// Run `continuation` before any caller-registered one
    pub(crate) fn prepend(&mut self, continuation: Continuation) {
        self.continuations.insert(0, continuation);
    }

    /// Deliver a terminal state: subscribers, then continuations, then the handle
    ///
    /// Subscribers hear about this completion before any continuation can
    /// dispatch the next task.
    pub(crate) fn finish(self, status: TaskStatus, subscribers: &broadcast::Sender<Completion>) {
        let completion = Completion::new(self.task_id, self.action, status);

        // No subscribers is fine
        let _ = subscribers.send(completion.clone());

        for continuation in self.continuations {
            continuation(&completion);
        }

        let _ = self.result.send(completion);
    }
}

/// One job bound to the request it serves
pub(crate) struct Task {
    binding: Binding,
    job: Job,
}

impl Task {
    pub(crate) fn new(binding: Binding, job: Job) -> Self {
        Self { binding, job }
    }

    /// Start the task. Consuming `self` means it cannot be started twice.
    pub(crate) fn spawn(self, workspace: Workspace) {
        tokio::spawn(self.run(workspace));
    }

    async fn run(self, workspace: Workspace) {
        let Task { binding, job } = self;
        let task_id = binding.task_id;
        let action = binding.action;
        let job_name = job.name();

        tracing::debug!(%task_id, %action, job = job_name, "Task started");

        let context = workspace.job_context();
        let epoch = context.epoch;
        let outcome = AssertUnwindSafe(job.run(context, &binding.progress))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(LdavizError::TaskPanicked {
                    job: job_name.to_string(),
                    message: panic_message(&*panic),
                })
            });

        let status = match outcome {
            Ok(JobOutcome::Completed { items, commit }) => {
                binding.progress.finish();
                if workspace.commit(epoch, commit) {
                    tracing::info!(%task_id, %action, items, "Task completed");
                    TaskStatus::Completed { items }
                } else {
                    tracing::warn!(%task_id, %action, "Workspace was reset while the task ran; result discarded");
                    TaskStatus::Failed {
                        reason: "workspace was reset while the task was running".to_string(),
                    }
                }
            }
            Ok(JobOutcome::NotFound) => {
                tracing::info!(%task_id, %action, job = job_name, "Nothing to load");
                TaskStatus::NotFound
            }
            Err(e) => {
                tracing::error!(%task_id, %action, job = job_name, error = %e, "Task failed");
                TaskStatus::Failed { reason: e.to_string() }
            }
        };

        binding.finish(status, workspace.subscribers());
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
