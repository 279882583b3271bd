//! Integration tests for the flat-file and SQLite backends behind `Storage`

use ldaviz_core::error::LdavizError;
use ldaviz_core::models::{
    ArtifactCounts, Configuration, CoordinateMatrix, Dataset, DistanceMatrix, StorageBackend, Topic,
};
use ldaviz_store::files::{FileTopicStore, COORDINATES_FILE, DISTANCES_FILE};
use ldaviz_store::Storage;
use std::fs;
use tempfile::TempDir;

fn dataset(configuration: &Configuration) -> Dataset {
    Dataset::new(
        configuration.id,
        vec![
            Topic::with_keywords(0, [("river", 0.7), ("valley", 0.3)]),
            Topic::with_keywords(1, [("river", 0.2), ("valley", 0.8)]),
        ],
    )
}

#[tokio::test]
async fn test_open_missing_directory_fails() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope");

    let result = Storage::open(&missing, StorageBackend::Files).await;
    assert!(matches!(result, Err(LdavizError::DirectoryNotFound { .. })));
}

#[tokio::test]
async fn test_file_backend_reports_only_configurations_with_raw_data() {
    let dir = TempDir::new().unwrap();
    let configurations: Vec<Configuration> =
        (1..=3).map(|id| Configuration::new(id, 2.0, 0.1, 0.01 * id as f64)).collect();

    let files = FileTopicStore::new(dir.path());
    let storage = Storage::open(dir.path(), StorageBackend::Files).await.unwrap();
    storage.topics.store_configurations(&configurations).await.unwrap();
    files.write_dataset(&configurations[0], &dataset(&configurations[0])).await.unwrap();
    files.write_dataset(&configurations[2], &dataset(&configurations[2])).await.unwrap();

    let loaded = storage.topics.load_configurations().await.unwrap();
    let ids: Vec<u32> = loaded.iter().map(|c| c.id.0).collect();
    assert_eq!(ids, vec![1, 3]);
    assert_eq!(storage.topics.count_configurations().await.unwrap(), 2);
    assert_eq!(storage.topics.load_parameter_list().await.unwrap().len(), 3);

    let datasets = storage.topics.load_raw_data(&loaded, &mut |_: usize, _: usize| {}).await.unwrap();
    assert_eq!(datasets.len(), 2);
    assert_eq!(datasets[&loaded[1].id], dataset(&loaded[1]));
}

#[tokio::test]
async fn test_missing_artifacts_load_as_none() {
    let dir = TempDir::new().unwrap();
    let storage = Storage::open(dir.path(), StorageBackend::Files).await.unwrap();

    assert!(storage.matrices.load_distance_matrix().await.unwrap().is_none());
    assert!(storage.matrices.load_coordinate_matrix().await.unwrap().is_none());
    assert!(!storage.matrices.has_distance_matrix().await.unwrap());
    assert_eq!(storage.matrices.recorded_counts().await.unwrap(), ArtifactCounts::default());
}

#[tokio::test]
async fn test_matrices_survive_a_save_load_cycle() {
    let dir = TempDir::new().unwrap();
    let storage = Storage::open(dir.path(), StorageBackend::Files).await.unwrap();
    let configurations: Vec<Configuration> =
        (1..=3).map(|id| Configuration::new(id, 3.0, 0.5, 0.1)).collect();
    let labels = Configuration::labels(&configurations);

    let mut distances = DistanceMatrix::zeros(3);
    distances.set_symmetric(0, 1, 0.125);
    distances.set_symmetric(0, 2, 2.0 / 7.0);
    distances.set_symmetric(1, 2, 0.3);
    let coordinates = CoordinateMatrix::new(vec![-0.1, 0.0, 0.1], vec![0.2, -0.4, 0.2]).unwrap();

    storage.matrices.save_distance_matrix(&distances, &labels).await.unwrap();
    storage.matrices.save_coordinate_matrix(&coordinates, &labels).await.unwrap();

    assert_eq!(storage.matrices.load_distance_matrix().await.unwrap(), Some(distances));
    assert_eq!(storage.matrices.load_coordinate_matrix().await.unwrap(), Some(coordinates));

    let header = fs::read_to_string(dir.path().join(DISTANCES_FILE)).unwrap();
    assert_eq!(header.lines().next(), Some("1:3,0.5,0.1 2:3,0.5,0.1 3:3,0.5,0.1"));

    let counts = storage.matrices.recorded_counts().await.unwrap();
    assert_eq!(counts, ArtifactCounts { distances: Some(3), coordinates: Some(3) });
}

#[tokio::test]
async fn test_coordinate_file_with_header_and_five_columns() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(COORDINATES_FILE),
        "a b c d e\n0.1 0.2 0.3 0.4 0.5\n-1 -2 -3 -4 -5\n",
    )
    .unwrap();

    let storage = Storage::open(dir.path(), StorageBackend::Files).await.unwrap();
    let coordinates = storage.matrices.load_coordinate_matrix().await.unwrap().unwrap();

    assert_eq!(coordinates.len(), 5);
    assert_eq!(coordinates.point(0), (0.1, -1.0));
    assert_eq!(coordinates.point(4), (0.5, -5.0));
}

#[tokio::test]
async fn test_corrupt_distance_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(DISTANCES_FILE), "a b\n0 1\n2 0\n").unwrap();

    let storage = Storage::open(dir.path(), StorageBackend::Files).await.unwrap();
    assert!(storage.matrices.load_distance_matrix().await.is_err());
    assert!(storage.matrices.has_distance_matrix().await.unwrap());
}

#[tokio::test]
async fn test_sqlite_backend_creates_database_in_directory() {
    let dir = TempDir::new().unwrap();
    let storage = Storage::open(dir.path(), StorageBackend::Sqlite).await.unwrap();

    assert!(dir.path().join("topics.db").exists());
    assert_eq!(storage.topics.count_configurations().await.unwrap(), 0);

    let configurations = vec![Configuration::new(1, 2.0, 0.1, 0.1)];
    storage.topics.store_configurations(&configurations).await.unwrap();
    assert_eq!(storage.topics.load_parameter_list().await.unwrap(), configurations);
}
