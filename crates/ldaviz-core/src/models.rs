pub mod configuration;
pub mod matrix;
pub mod metric;
pub mod topic;
pub mod workspace;

pub use configuration::{Configuration, ConfigurationId};
pub use matrix::{CoordinateMatrix, DistanceMatrix};
pub use metric::{Aggregation, TopicMetric};
pub use topic::{Dataset, DatasetMap, Topic};
pub use workspace::{ArtifactCounts, IntegrityStatus, StorageBackend, WorkspaceState};
