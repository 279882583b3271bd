use async_trait::async_trait;
use futures::future::BoxFuture;
use ldaviz_core::config::LayeredConfig;
use ldaviz_core::error::{LdavizError, Result};
use ldaviz_core::models::{
    Aggregation, Configuration, CoordinateMatrix, DatasetMap, DistanceMatrix, IntegrityStatus,
    StorageBackend, TopicMetric, WorkspaceState,
};
use ldaviz_numeric::DistanceEngine;
use ldaviz_store::Storage;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;

use crate::action::{Action, ActionOptions};
use crate::generate::{Generator, ParameterSweep, ScriptGenerator};
use crate::jobs::{Commit, Job, JobContext};
use crate::task::{Binding, Completion, Continuation, Task, TaskHandle, TaskStatus};

/// Completions buffered for slow subscribers
const COMPLETION_CAPACITY: usize = 64;

/// Opens the stores for a workspace directory
#[async_trait]
pub trait StorageProvider: Send + Sync {
    async fn open(&self, directory: &Path) -> Result<Storage>;
}

/// Opens flat-file or SQLite storage inside the directory itself
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryStorageProvider {
    backend: StorageBackend,
}

impl DirectoryStorageProvider {
    pub fn new(backend: StorageBackend) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl StorageProvider for DirectoryStorageProvider {
    async fn open(&self, directory: &Path) -> Result<Storage> {
        Storage::open(directory, self.backend).await
    }
}

/// Engine and generator settings fixed for the life of a workspace
#[derive(Clone, Default)]
pub struct WorkspaceSettings {
    pub metric: TopicMetric,
    pub aggregation: Aggregation,
    pub backend: StorageBackend,
    pub generator: Option<Arc<dyn Generator>>,
}

impl WorkspaceSettings {
    pub fn from_config(config: &LayeredConfig) -> Result<Self> {
        let generator = match &config.generator_command.value {
            Some(command) => {
                Some(Arc::new(ScriptGenerator::from_command_line(command)?) as Arc<dyn Generator>)
            }
            None => None,
        };

        Ok(Self {
            metric: config.metric.value,
            aggregation: config.aggregation.value,
            backend: config.backend.value,
            generator,
        })
    }

    pub fn with_generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }
}

impl std::fmt::Debug for WorkspaceSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceSettings")
            .field("metric", &self.metric)
            .field("aggregation", &self.aggregation)
            .field("backend", &self.backend)
            .field("generator", &self.generator.is_some())
            .finish()
    }
}

/// Everything a reset clears
struct Session {
    directory: Option<PathBuf>,
    storage: Storage,
    configurations: Vec<Configuration>,
    metadata_collected: bool,
    datasets: Arc<DatasetMap>,
    distances: Option<Arc<DistanceMatrix>>,
    coordinates: Option<Arc<CoordinateMatrix>>,
    state: WorkspaceState,
    /// Bumped on every reset so stale tasks cannot commit
    epoch: u64,
}

impl Session {
    fn new(storage: Storage, directory: Option<PathBuf>) -> Self {
        Self {
            directory,
            storage,
            configurations: Vec::new(),
            metadata_collected: false,
            datasets: Arc::new(DatasetMap::new()),
            distances: None,
            coordinates: None,
            state: WorkspaceState::default(),
            epoch: 0,
        }
    }

    fn clear(&mut self) {
        self.configurations.clear();
        self.metadata_collected = false;
        self.datasets = Arc::new(DatasetMap::new());
        self.distances = None;
        self.coordinates = None;
        self.state = WorkspaceState::default();
        self.epoch += 1;
    }
}

struct Inner {
    session: RwLock<Session>,
    settings: WorkspaceSettings,
    provider: Arc<dyn StorageProvider>,
    completions: broadcast::Sender<Completion>,
}

/// How a request proceeds given the current state
enum Plan {
    Run(Job),
    After(Action),
}

/// A request waiting to be planned
struct Request {
    binding: Binding,
    sweep: Option<ParameterSweep>,
}

/// Shared handle to one exploration session
///
/// Cloning is cheap; all clones see the same state.
#[derive(Clone)]
pub struct Workspace {
    inner: Arc<Inner>,
}

impl Workspace {
    /// Create a workspace over already-open storage
    pub fn new(storage: Storage, settings: WorkspaceSettings) -> Self {
        let provider = Arc::new(DirectoryStorageProvider::new(settings.backend));
        Self::with_provider(storage, settings, provider)
    }

    pub fn with_provider(
        storage: Storage,
        settings: WorkspaceSettings,
        provider: Arc<dyn StorageProvider>,
    ) -> Self {
        let (completions, _) = broadcast::channel(COMPLETION_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                session: RwLock::new(Session::new(storage, None)),
                settings,
                provider,
                completions,
            }),
        }
    }

    /// Open the workspace stored in `directory`
    ///
    /// No action is dispatched; call `collect-metadata` to read it.
    pub async fn open(directory: impl Into<PathBuf>, settings: WorkspaceSettings) -> Result<Self> {
        let directory = directory.into();
        let provider = Arc::new(DirectoryStorageProvider::new(settings.backend));
        let storage = provider.open(&directory).await?;

        let workspace = Self::with_provider(storage, settings, provider);
        workspace.write().directory = Some(directory);
        Ok(workspace)
    }

    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.inner.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.inner.session.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Request an action
    ///
    /// Missing prerequisites that can be loaded are dispatched first and the
    /// request is re-issued when they complete. The returned handle, the
    /// progress sink and the continuation in `options` all follow the
    /// requested action only. `reset` and `none` run inline and return
    /// `Ok(None)`.
    pub async fn execute_action(
        &self,
        action: Action,
        options: ActionOptions,
    ) -> Result<Option<TaskHandle>> {
        let ActionOptions { progress, continuation, directory, sweep } = options;

        match action {
            Action::None => return Ok(None),
            Action::Reset => {
                self.reset();
                return Ok(None);
            }
            Action::SwitchDirectory => {
                let directory = directory
                    .ok_or_else(|| precondition(action, "a target directory is required"))?;
                self.reopen(directory).await?;
            }
            _ => {}
        }

        let plan = self.plan(action, sweep.as_ref()).await?;
        let (binding, handle) = Binding::new(action, progress, continuation);

        tracing::debug!(task_id = %handle.id(), %action, "Action accepted");
        self.launch(plan, Request { binding, sweep }).await;
        Ok(Some(handle))
    }

    /// Clear configurations, datasets, matrices and flags
    pub fn reset(&self) {
        self.write().clear();
        tracing::debug!("Workspace reset");
    }

    /// Reset, reopen storage for `directory` and collect its metadata
    pub async fn switch_directory(&self, directory: impl Into<PathBuf>) -> Result<TaskHandle> {
        let options = ActionOptions::new().with_directory(directory);
        self.execute_action(Action::SwitchDirectory, options)
            .await?
            .ok_or_else(|| precondition(Action::SwitchDirectory, "no task was started"))
    }

    /// Open `directory` first; the current session survives a failed open
    async fn reopen(&self, directory: PathBuf) -> Result<()> {
        let storage = self.inner.provider.open(&directory).await?;

        let mut session = self.write();
        session.clear();
        session.storage = storage;
        session.directory = Some(directory.clone());
        drop(session);

        tracing::info!(dir = %directory.display(), "Switched directory");
        Ok(())
    }

    /// Decide whether `action` can run now or must wait for a loading action
    async fn plan(&self, action: Action, sweep: Option<&ParameterSweep>) -> Result<Plan> {
        let (metadata_collected, state, storage) = {
            let session = self.read();
            (session.metadata_collected, session.state, session.storage.clone())
        };

        let plan = match action {
            Action::CollectMetadata | Action::SwitchDirectory => Plan::Run(Job::CollectMetadata),
            Action::LoadRawData if metadata_collected => Plan::Run(Job::LoadRawData),
            Action::LoadRawData => Plan::After(Action::CollectMetadata),
            Action::LoadDistances => Plan::Run(Job::LoadDistances),
            Action::LoadCoordinates => Plan::Run(Job::LoadCoordinates),
            Action::CalculateDistances if state.raw_data_loaded => Plan::Run(Job::CalculateDistances),
            Action::CalculateDistances => Plan::After(Action::LoadRawData),
            Action::CalculateCoordinates => {
                if !state.distance_data_loaded && !storage.matrices.has_distance_matrix().await? {
                    return Err(precondition(
                        action,
                        "no distance matrix is loaded and none has been saved",
                    ));
                }
                // Coordinates are saved with one label per configuration
                if !metadata_collected {
                    Plan::After(Action::CollectMetadata)
                } else if state.distance_data_loaded {
                    Plan::Run(Job::CalculateCoordinates)
                } else {
                    Plan::After(Action::LoadDistances)
                }
            }
            Action::GenerateParameterList => match sweep {
                Some(sweep) => Plan::Run(Job::GenerateParameterList(*sweep)),
                None => return Err(precondition(action, "a parameter sweep is required")),
            },
            Action::GenerateData if self.inner.settings.generator.is_some() => {
                Plan::Run(Job::GenerateData)
            }
            Action::GenerateData => {
                return Err(precondition(action, "no data generator is configured"))
            }
            Action::Reset | Action::None => {
                return Err(precondition(action, "runs inline and has no task"))
            }
        };

        Ok(plan)
    }

    /// Start a planned request, chaining its prerequisite when needed
    fn launch(&self, plan: Plan, request: Request) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            match plan {
                Plan::Run(job) => {
                    let mut binding = request.binding;
                    if binding.action() == Action::GenerateData {
                        binding.prepend(self.follow_up(Action::CollectMetadata));
                    }
                    Task::new(binding, job).spawn(self.clone());
                }
                Plan::After(prerequisite) => {
                    tracing::debug!(
                        action = %request.binding.action(),
                        %prerequisite,
                        "Dispatching prerequisite first"
                    );
                    let binding =
                        Binding::internal(prerequisite, Some(self.reissue_after(request)));
                    let chained = Request { binding, sweep: None };

                    match self.plan(prerequisite, None).await {
                        Ok(plan) => self.launch(plan, chained).await,
                        Err(e) => self.abandon(chained, e.to_string()),
                    }
                }
            }
        })
    }

    /// Continuation that re-issues `request` once its prerequisite completed
    fn reissue_after(&self, request: Request) -> Continuation {
        let workspace = self.clone();
        Box::new(move |completion: &Completion| {
            if !completion.status.is_completed() {
                let reason = format!("prerequisite {} {}", completion.action, completion.status);
                workspace.abandon(request, reason);
                return;
            }

            tokio::spawn(async move {
                let action = request.binding.action();
                match workspace.plan(action, request.sweep.as_ref()).await {
                    Ok(plan) => workspace.launch(plan, request).await,
                    Err(e) => workspace.abandon(request, e.to_string()),
                }
            });
        })
    }

    /// Continuation that dispatches `action` with nobody listening
    fn follow_up(&self, action: Action) -> Continuation {
        let workspace = self.clone();
        Box::new(move |completion: &Completion| {
            if !completion.status.is_completed() {
                return;
            }
            tokio::spawn(async move {
                if let Err(e) = workspace.execute_action(action, ActionOptions::new()).await {
                    tracing::warn!(%action, error = %e, "Follow-up action rejected");
                }
            });
        })
    }

    /// Resolve a request that will never get a task
    fn abandon(&self, request: Request, reason: String) {
        tracing::warn!(action = %request.binding.action(), %reason, "Request abandoned");
        request.binding.finish(TaskStatus::Failed { reason }, &self.inner.completions);
    }

    /// Snapshot of what a job needs, taken under the read lock
    pub(crate) fn job_context(&self) -> JobContext {
        let session = self.read();
        JobContext {
            storage: session.storage.clone(),
            directory: session.directory.clone(),
            configurations: session.configurations.clone(),
            datasets: Arc::clone(&session.datasets),
            distances: session.distances.clone(),
            engine: DistanceEngine::new(self.inner.settings.metric, self.inner.settings.aggregation),
            generator: self.inner.settings.generator.clone(),
            epoch: session.epoch,
        }
    }

    /// Apply a job result atomically
    ///
    /// Returns false when the session was reset after the snapshot was
    /// taken; the result is then dropped.
    pub(crate) fn commit(&self, epoch: u64, commit: Commit) -> bool {
        let mut session = self.write();
        if session.epoch != epoch {
            return false;
        }

        match commit {
            Commit::Metadata(configurations) => {
                session.configurations = configurations;
                session.metadata_collected = true;
                session.datasets = Arc::new(DatasetMap::new());
                session.state.raw_data_loaded = false;
            }
            Commit::RawData(datasets) => {
                session.datasets = Arc::new(datasets);
                session.state.raw_data_loaded = true;
            }
            Commit::Distances(matrix) => {
                session.distances = Some(Arc::new(matrix));
                session.state.distance_data_loaded = true;
            }
            Commit::Coordinates(matrix) => {
                session.coordinates = Some(Arc::new(matrix));
                session.state.coordinates_loaded = true;
            }
            Commit::Nothing => {}
        }

        true
    }

    pub(crate) fn subscribers(&self) -> &broadcast::Sender<Completion> {
        &self.inner.completions
    }

    /// Receive every completion, in commit order
    pub fn subscribe(&self) -> broadcast::Receiver<Completion> {
        self.inner.completions.subscribe()
    }

    pub fn is_raw_data_loaded(&self) -> bool {
        self.read().state.raw_data_loaded
    }

    pub fn is_distance_data_loaded(&self) -> bool {
        self.read().state.distance_data_loaded
    }

    pub fn is_coordinates_loaded(&self) -> bool {
        self.read().state.coordinates_loaded
    }

    pub fn state(&self) -> WorkspaceState {
        self.read().state
    }

    pub fn configurations(&self) -> Vec<Configuration> {
        self.read().configurations.clone()
    }

    pub fn datasets(&self) -> Arc<DatasetMap> {
        Arc::clone(&self.read().datasets)
    }

    pub fn distance_matrix(&self) -> Option<Arc<DistanceMatrix>> {
        self.read().distances.clone()
    }

    pub fn coordinate_matrix(&self) -> Option<Arc<CoordinateMatrix>> {
        self.read().coordinates.clone()
    }

    pub fn directory(&self) -> Option<PathBuf> {
        self.read().directory.clone()
    }

    pub fn storage(&self) -> Storage {
        self.read().storage.clone()
    }

    pub fn settings(&self) -> &WorkspaceSettings {
        &self.inner.settings
    }

    /// Grade persisted artifacts against the store's configuration count
    ///
    /// A store or artifact that cannot be read counts as corrupted.
    pub async fn integrity_status(&self) -> IntegrityStatus {
        let storage = self.storage();

        let live = match storage.topics.count_configurations().await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot count configurations");
                return IntegrityStatus::Corrupted;
            }
        };

        match storage.matrices.recorded_counts().await {
            Ok(recorded) => {
                let status = IntegrityStatus::assess(live, recorded);
                if status == IntegrityStatus::Corrupted {
                    tracing::warn!(
                        configurations = live,
                        distances = ?recorded.distances,
                        coordinates = ?recorded.coordinates,
                        "Artifacts disagree with the configuration count"
                    );
                }
                status
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cannot read artifacts");
                IntegrityStatus::Corrupted
            }
        }
    }

    /// False iff a persisted artifact disagrees with the configuration count
    pub async fn check_metadata_integrity(&self) -> bool {
        self.integrity_status().await != IntegrityStatus::Corrupted
    }
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.read();
        f.debug_struct("Workspace")
            .field("directory", &session.directory)
            .field("configurations", &session.configurations.len())
            .field("state", &session.state)
            .field("settings", &self.inner.settings)
            .finish()
    }
}

fn precondition(action: Action, reason: &str) -> LdavizError {
    LdavizError::PreconditionFailed { action: action.to_string(), reason: reason.to_string() }
}
