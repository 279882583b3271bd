use async_trait::async_trait;
use ldaviz_core::error::Result;
use ldaviz_core::models::{ArtifactCounts, Configuration, CoordinateMatrix, DatasetMap, DistanceMatrix};

/// Progress callback receiving `(done, total)`
pub type Progress<'a> = &'a mut (dyn FnMut(usize, usize) + Send);

/// Port for configurations and their topic/keyword rows
#[async_trait]
pub trait TopicStore: Send + Sync {
    /// Configurations that have raw topic data, ordered by id
    async fn load_configurations(&self) -> Result<Vec<Configuration>>;

    /// Number of configurations [`load_configurations`](Self::load_configurations) would return
    async fn count_configurations(&self) -> Result<usize>;

    /// Load the topics of every listed configuration
    ///
    /// Configurations without stored rows are skipped. `progress` is called
    /// once per configuration.
    async fn load_raw_data(
        &self,
        configurations: &[Configuration],
        progress: Progress<'_>,
    ) -> Result<DatasetMap>;

    /// Persist a parameter list, replacing the previous one
    async fn store_configurations(&self, configurations: &[Configuration]) -> Result<()>;

    /// The stored parameter list, whether or not data exists for it
    async fn load_parameter_list(&self) -> Result<Vec<Configuration>>;
}

/// Port for persisted distance and coordinate matrices
#[async_trait]
pub trait MatrixStore: Send + Sync {
    /// `None` when no distance matrix has been saved
    async fn load_distance_matrix(&self) -> Result<Option<DistanceMatrix>>;

    async fn save_distance_matrix(&self, matrix: &DistanceMatrix, labels: &[String]) -> Result<()>;

    /// `None` when no coordinate matrix has been saved
    async fn load_coordinate_matrix(&self) -> Result<Option<CoordinateMatrix>>;

    async fn save_coordinate_matrix(&self, matrix: &CoordinateMatrix, labels: &[String]) -> Result<()>;

    /// Whether a distance matrix has been saved
    async fn has_distance_matrix(&self) -> Result<bool>;

    /// Configuration counts recorded in each saved artifact
    async fn recorded_counts(&self) -> Result<ArtifactCounts>;
}
