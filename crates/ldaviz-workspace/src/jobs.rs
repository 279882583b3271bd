//! Concrete jobs run by tasks
//!
//! A job reads only from its [`JobContext`] snapshot and returns the state
//! change to commit; it never touches the session directly.

use ldaviz_core::error::{LdavizError, Result};
use ldaviz_core::models::{Configuration, CoordinateMatrix, DatasetMap, DistanceMatrix};
use ldaviz_numeric::{DistanceEngine, EmbeddingEngine};
use ldaviz_store::Storage;
use std::path::PathBuf;
use std::sync::Arc;

use crate::generate::{Generator, ParameterSweep};
use crate::task::ProgressReporter;

/// What a job reads, copied out of the session before it starts
pub(crate) struct JobContext {
    pub storage: Storage,
    pub directory: Option<PathBuf>,
    pub configurations: Vec<Configuration>,
    pub datasets: Arc<DatasetMap>,
    pub distances: Option<Arc<DistanceMatrix>>,
    pub engine: DistanceEngine,
    pub generator: Option<Arc<dyn Generator>>,
    /// Session generation the snapshot was taken from
    pub epoch: u64,
}

/// State change applied atomically when a job succeeds
pub(crate) enum Commit {
    Metadata(Vec<Configuration>),
    RawData(DatasetMap),
    Distances(DistanceMatrix),
    Coordinates(CoordinateMatrix),
    Nothing,
}

pub(crate) enum JobOutcome {
    Completed { items: usize, commit: Commit },
    NotFound,
}

pub(crate) enum Job {
    CollectMetadata,
    LoadRawData,
    LoadDistances,
    LoadCoordinates,
    CalculateDistances,
    CalculateCoordinates,
    GenerateParameterList(ParameterSweep),
    GenerateData,
}

impl Job {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Job::CollectMetadata => "collect-metadata",
            Job::LoadRawData => "load-raw-data",
            Job::LoadDistances => "load-distances",
            Job::LoadCoordinates => "load-coordinates",
            Job::CalculateDistances => "calculate-distances",
            Job::CalculateCoordinates => "calculate-coordinates",
            Job::GenerateParameterList(_) => "generate-parameter-list",
            Job::GenerateData => "generate-data",
        }
    }

    pub(crate) async fn run(self, ctx: JobContext, progress: &ProgressReporter) -> Result<JobOutcome> {
        match self {
            Job::CollectMetadata => collect_metadata(ctx).await,
            Job::LoadRawData => load_raw_data(ctx, progress).await,
            Job::LoadDistances => load_distances(ctx).await,
            Job::LoadCoordinates => load_coordinates(ctx).await,
            Job::CalculateDistances => calculate_distances(ctx, progress).await,
            Job::CalculateCoordinates => calculate_coordinates(ctx).await,
            Job::GenerateParameterList(sweep) => generate_parameter_list(ctx, sweep).await,
            Job::GenerateData => generate_data(ctx).await,
        }
    }
}

/// One label per matrix row, or an error when the parameter list disagrees
fn matching_labels(configurations: &[Configuration], rows: usize) -> Result<Vec<String>> {
    if configurations.len() != rows {
        return Err(LdavizError::InvalidMatrix {
            reason: format!(
                "{} rows but {} configurations in the parameter list",
                rows,
                configurations.len()
            ),
        });
    }
    Ok(Configuration::labels(configurations))
}

fn completed(items: usize, commit: Commit) -> Result<JobOutcome> {
    Ok(JobOutcome::Completed { items, commit })
}

async fn collect_metadata(ctx: JobContext) -> Result<JobOutcome> {
    let configurations = ctx.storage.topics.load_configurations().await?;
    completed(configurations.len(), Commit::Metadata(configurations))
}

async fn load_raw_data(ctx: JobContext, progress: &ProgressReporter) -> Result<JobOutcome> {
    let datasets = ctx
        .storage
        .topics
        .load_raw_data(&ctx.configurations, &mut |done: usize, total: usize| {
            progress.update_progress(done, total)
        })
        .await?;

    if datasets.len() < ctx.configurations.len() {
        tracing::warn!(
            loaded = datasets.len(),
            configurations = ctx.configurations.len(),
            "Some configurations have no raw data"
        );
    }

    completed(datasets.len(), Commit::RawData(datasets))
}

async fn load_distances(ctx: JobContext) -> Result<JobOutcome> {
    match ctx.storage.matrices.load_distance_matrix().await? {
        Some(matrix) => completed(matrix.size(), Commit::Distances(matrix)),
        None => Ok(JobOutcome::NotFound),
    }
}

async fn load_coordinates(ctx: JobContext) -> Result<JobOutcome> {
    match ctx.storage.matrices.load_coordinate_matrix().await? {
        Some(matrix) => completed(matrix.len(), Commit::Coordinates(matrix)),
        None => Ok(JobOutcome::NotFound),
    }
}

async fn calculate_distances(ctx: JobContext, progress: &ProgressReporter) -> Result<JobOutcome> {
    let reporter = progress.clone();
    let engine = ctx.engine;
    let configurations = ctx.configurations.clone();
    let datasets = Arc::clone(&ctx.datasets);

    let matrix = tokio::task::spawn_blocking(move || {
        engine.compute(&configurations, &datasets, |done, total| reporter.update_progress(done, total))
    })
    .await
    .map_err(|e| LdavizError::NumericFailure { reason: format!("distance computation aborted: {}", e) })??;

    let labels = matching_labels(&ctx.configurations, matrix.size())?;
    ctx.storage.matrices.save_distance_matrix(&matrix, &labels).await?;

    completed(matrix.size(), Commit::Distances(matrix))
}

async fn calculate_coordinates(ctx: JobContext) -> Result<JobOutcome> {
    let distances = ctx.distances.clone().ok_or_else(|| LdavizError::PreconditionFailed {
        action: Job::CalculateCoordinates.name().to_string(),
        reason: "no distance matrix is loaded".to_string(),
    })?;

    let coordinates = tokio::task::spawn_blocking(move || EmbeddingEngine::new().embed(&distances))
        .await
        .map_err(|e| LdavizError::NumericFailure { reason: format!("embedding aborted: {}", e) })??;

    let labels = matching_labels(&ctx.configurations, coordinates.len())?;
    ctx.storage.matrices.save_coordinate_matrix(&coordinates, &labels).await?;

    completed(coordinates.len(), Commit::Coordinates(coordinates))
}

async fn generate_parameter_list(ctx: JobContext, sweep: ParameterSweep) -> Result<JobOutcome> {
    let grid = sweep.expand()?;
    ctx.storage.topics.store_configurations(&grid).await?;
    tracing::info!(configurations = grid.len(), "Stored parameter list");
    completed(grid.len(), Commit::Nothing)
}

async fn generate_data(ctx: JobContext) -> Result<JobOutcome> {
    let generator = ctx.generator.clone().ok_or_else(|| LdavizError::ConfigMissing {
        key: "generator_command".to_string(),
    })?;
    let directory = ctx.directory.clone().ok_or_else(|| LdavizError::Generation {
        reason: "the workspace has no directory".to_string(),
    })?;

    let parameters = ctx.storage.topics.load_parameter_list().await?;
    if parameters.is_empty() {
        return Err(LdavizError::Generation { reason: "the parameter list is empty".to_string() });
    }

    generator.generate(&directory, &parameters).await?;
    completed(parameters.len(), Commit::Nothing)
}
