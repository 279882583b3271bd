//! In-memory storage implementations for development and testing.

use async_trait::async_trait;
use ldaviz_core::error::Result;
use ldaviz_core::models::{
    ArtifactCounts, Configuration, CoordinateMatrix, Dataset, DatasetMap, DistanceMatrix,
};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::ports::{MatrixStore, Progress, TopicStore};

/// In-memory implementation of TopicStore
#[derive(Debug, Clone, Default)]
pub struct MemoryTopicStore {
    configurations: Arc<RwLock<Vec<Configuration>>>,
    datasets: Arc<RwLock<DatasetMap>>,
    parameters: Arc<RwLock<Vec<Configuration>>>,
}

impl MemoryTopicStore {
    /// Create a new, empty in-memory topic store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a configuration together with its topics
    pub async fn insert_dataset(&self, configuration: Configuration, dataset: Dataset) {
        let mut configurations = self.configurations.write().await;
        match configurations.binary_search_by_key(&configuration.id, |c| c.id) {
            Ok(pos) => configurations[pos] = configuration,
            Err(pos) => configurations.insert(pos, configuration),
        }
        self.datasets.write().await.insert(configuration.id, dataset);
    }
}

#[async_trait]
impl TopicStore for MemoryTopicStore {
    async fn load_configurations(&self) -> Result<Vec<Configuration>> {
        Ok(self.configurations.read().await.clone())
    }

    async fn count_configurations(&self) -> Result<usize> {
        Ok(self.configurations.read().await.len())
    }

    async fn load_raw_data(
        &self,
        configurations: &[Configuration],
        progress: Progress<'_>,
    ) -> Result<DatasetMap> {
        let datasets = self.datasets.read().await;
        let total = configurations.len();
        let mut loaded = DatasetMap::new();

        for (i, configuration) in configurations.iter().enumerate() {
            if let Some(dataset) = datasets.get(&configuration.id) {
                loaded.insert(configuration.id, dataset.clone());
            }
            progress(i + 1, total);
        }

        Ok(loaded)
    }

    async fn store_configurations(&self, configurations: &[Configuration]) -> Result<()> {
        *self.parameters.write().await = configurations.to_vec();
        Ok(())
    }

    async fn load_parameter_list(&self) -> Result<Vec<Configuration>> {
        Ok(self.parameters.read().await.clone())
    }
}

#[derive(Debug, Clone)]
struct Saved<T> {
    matrix: T,
    labels: Vec<String>,
}

/// In-memory implementation of MatrixStore
#[derive(Debug, Clone, Default)]
pub struct MemoryMatrixStore {
    distances: Arc<RwLock<Option<Saved<DistanceMatrix>>>>,
    coordinates: Arc<RwLock<Option<Saved<CoordinateMatrix>>>>,
}

impl MemoryMatrixStore {
    /// Create a new, empty in-memory matrix store
    pub fn new() -> Self {
        Self::default()
    }

    /// Header labels of the saved distance matrix
    pub async fn distance_labels(&self) -> Option<Vec<String>> {
        self.distances.read().await.as_ref().map(|s| s.labels.clone())
    }

    /// Header labels of the saved coordinate matrix
    pub async fn coordinate_labels(&self) -> Option<Vec<String>> {
        self.coordinates.read().await.as_ref().map(|s| s.labels.clone())
    }
}

#[async_trait]
impl MatrixStore for MemoryMatrixStore {
    async fn load_distance_matrix(&self) -> Result<Option<DistanceMatrix>> {
        Ok(self.distances.read().await.as_ref().map(|s| s.matrix.clone()))
    }

    async fn save_distance_matrix(&self, matrix: &DistanceMatrix, labels: &[String]) -> Result<()> {
        *self.distances.write().await = Some(Saved { matrix: matrix.clone(), labels: labels.to_vec() });
        Ok(())
    }

    async fn load_coordinate_matrix(&self) -> Result<Option<CoordinateMatrix>> {
        Ok(self.coordinates.read().await.as_ref().map(|s| s.matrix.clone()))
    }

    async fn save_coordinate_matrix(&self, matrix: &CoordinateMatrix, labels: &[String]) -> Result<()> {
        *self.coordinates.write().await = Some(Saved { matrix: matrix.clone(), labels: labels.to_vec() });
        Ok(())
    }

    async fn has_distance_matrix(&self) -> Result<bool> {
        Ok(self.distances.read().await.is_some())
    }

    async fn recorded_counts(&self) -> Result<ArtifactCounts> {
        Ok(ArtifactCounts {
            distances: self.distances.read().await.as_ref().map(|s| s.matrix.size()),
            coordinates: self.coordinates.read().await.as_ref().map(|s| s.matrix.len()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ldaviz_core::models::{ConfigurationId, Topic};

    fn dataset(id: u32) -> Dataset {
        Dataset::new(ConfigurationId(id), vec![Topic::with_keywords(0, [("word", 1.0)])])
    }

    #[tokio::test]
    async fn test_insert_keeps_configurations_ordered() {
        let store = MemoryTopicStore::new();
        store.insert_dataset(Configuration::new(3, 2.0, 0.1, 0.1), dataset(3)).await;
        store.insert_dataset(Configuration::new(1, 2.0, 0.1, 0.1), dataset(1)).await;

        let ids: Vec<u32> = store.load_configurations().await.unwrap().iter().map(|c| c.id.0).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(store.count_configurations().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_load_raw_data_reports_progress() {
        let store = MemoryTopicStore::new();
        let configurations: Vec<Configuration> =
            (1..=3).map(|id| Configuration::new(id, 1.0, 0.1, 0.1)).collect();
        for c in &configurations {
            store.insert_dataset(*c, dataset(c.id.0)).await;
        }

        let mut calls = Vec::new();
        let datasets = store
            .load_raw_data(&configurations, &mut |done: usize, total: usize| calls.push((done, total)))
            .await
            .unwrap();

        assert_eq!(datasets.len(), 3);
        assert_eq!(calls, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[tokio::test]
    async fn test_parameter_list_is_not_data() {
        let store = MemoryTopicStore::new();
        store.store_configurations(&[Configuration::new(1, 2.0, 0.1, 0.1)]).await.unwrap();

        assert_eq!(store.load_parameter_list().await.unwrap().len(), 1);
        assert_eq!(store.count_configurations().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_matrix_store_counts() {
        let store = MemoryMatrixStore::new();
        assert_eq!(store.recorded_counts().await.unwrap(), ArtifactCounts::default());
        assert!(!store.has_distance_matrix().await.unwrap());

        store.save_distance_matrix(&DistanceMatrix::zeros(4), &[]).await.unwrap();
        store.save_coordinate_matrix(&CoordinateMatrix::zeros(3), &[]).await.unwrap();

        let counts = store.recorded_counts().await.unwrap();
        assert_eq!(counts.distances, Some(4));
        assert_eq!(counts.coordinates, Some(3));
        assert!(store.has_distance_matrix().await.unwrap());
    }
}
