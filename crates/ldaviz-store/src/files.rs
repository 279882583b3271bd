//! Flat-file storage rooted at a workspace directory
//!
//! Layout:
//!
//! ```text
//! parameters.txt     id kappa alpha eta        (one configuration per line)
//! raw/<id>.txt       topic keyword probability (one row per line)
//! distances.txt      header + n rows of n values
//! coordinates.txt    header + 2 rows of n values
//! ```

use async_trait::async_trait;
use ldaviz_core::error::{LdavizError, Result};
use ldaviz_core::models::{
    ArtifactCounts, Configuration, CoordinateMatrix, Dataset, DatasetMap, DistanceMatrix,
};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::codec;
use crate::ports::{MatrixStore, Progress, TopicStore};

pub const PARAMETERS_FILE: &str = "parameters.txt";
pub const RAW_DIR: &str = "raw";
pub const DISTANCES_FILE: &str = "distances.txt";
pub const COORDINATES_FILE: &str = "coordinates.txt";

/// Read a file, mapping "not found" to `None`
async fn read_optional(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn field<T: std::str::FromStr>(path: &Path, line: usize, token: Option<&str>, name: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    let token = token.ok_or_else(|| LdavizError::MalformedArtifact {
        path: path.to_path_buf(),
        line,
        reason: format!("missing {}", name),
    })?;
    token.parse().map_err(|e: T::Err| LdavizError::MalformedArtifact {
        path: path.to_path_buf(),
        line,
        reason: format!("invalid {} '{}': {}", name, token, e),
    })
}

/// Parse `id kappa alpha eta` lines
pub fn parse_parameters(path: &Path, text: &str) -> Result<Vec<Configuration>> {
    let mut configurations = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        if line.trim().is_empty() {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let id: u32 = field(path, line_no, tokens.next(), "id")?;
        let kappa: f64 = field(path, line_no, tokens.next(), "kappa")?;
        let alpha: f64 = field(path, line_no, tokens.next(), "alpha")?;
        let eta: f64 = field(path, line_no, tokens.next(), "eta")?;
        configurations.push(Configuration::new(id, kappa, alpha, eta));
    }

    configurations.sort_by_key(|c| c.id);
    Ok(configurations)
}

pub fn render_parameters(configurations: &[Configuration]) -> String {
    configurations
        .iter()
        .map(|c| format!("{} {} {} {}\n", c.id, c.kappa, c.alpha, c.eta))
        .collect()
}

/// Parse `topic keyword probability` lines into a dataset
pub fn parse_raw(path: &Path, configuration: &Configuration, text: &str) -> Result<Dataset> {
    let mut dataset = Dataset::new(configuration.id, Vec::new());

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        if line.trim().is_empty() {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let topic: usize = field(path, line_no, tokens.next(), "topic")?;
        let keyword: String = field(path, line_no, tokens.next(), "keyword")?;
        let probability: f64 = field(path, line_no, tokens.next(), "probability")?;
        dataset.insert_keyword(topic, keyword, probability);
    }

    Ok(dataset)
}

pub fn render_raw(dataset: &Dataset) -> String {
    let mut out = String::new();
    for topic in &dataset.topics {
        for (keyword, probability) in &topic.keywords {
            out.push_str(&format!("{} {} {}\n", topic.index, keyword, probability));
        }
    }
    out
}

/// TopicStore over `parameters.txt` and `raw/<id>.txt`
#[derive(Debug, Clone)]
pub struct FileTopicStore {
    root: PathBuf,
}

impl FileTopicStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn parameters_path(&self) -> PathBuf {
        self.root.join(PARAMETERS_FILE)
    }

    pub fn raw_path(&self, configuration: &Configuration) -> PathBuf {
        self.root.join(RAW_DIR).join(format!("{}.txt", configuration.id))
    }

    /// Write the raw rows of one configuration
    pub async fn write_dataset(&self, configuration: &Configuration, dataset: &Dataset) -> Result<()> {
        tokio::fs::create_dir_all(self.root.join(RAW_DIR)).await?;
        tokio::fs::write(self.raw_path(configuration), render_raw(dataset)).await?;
        Ok(())
    }
}

#[async_trait]
impl TopicStore for FileTopicStore {
    async fn load_configurations(&self) -> Result<Vec<Configuration>> {
        let mut with_data = Vec::new();
        for configuration in self.load_parameter_list().await? {
            if tokio::fs::try_exists(self.raw_path(&configuration)).await? {
                with_data.push(configuration);
            }
        }
        Ok(with_data)
    }

    async fn count_configurations(&self) -> Result<usize> {
        Ok(self.load_configurations().await?.len())
    }

    async fn load_raw_data(
        &self,
        configurations: &[Configuration],
        progress: Progress<'_>,
    ) -> Result<DatasetMap> {
        let total = configurations.len();
        let mut datasets = DatasetMap::new();

        for (i, configuration) in configurations.iter().enumerate() {
            let path = self.raw_path(configuration);
            match read_optional(&path).await? {
                Some(text) => {
                    datasets.insert(configuration.id, parse_raw(&path, configuration, &text)?);
                }
                None => {
                    tracing::warn!(configuration = %configuration.id, path = %path.display(), "Raw data file missing");
                }
            }
            progress(i + 1, total);
        }

        Ok(datasets)
    }

    async fn store_configurations(&self, configurations: &[Configuration]) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.parameters_path(), render_parameters(configurations)).await?;
        Ok(())
    }

    async fn load_parameter_list(&self) -> Result<Vec<Configuration>> {
        let path = self.parameters_path();
        match read_optional(&path).await? {
            Some(text) => parse_parameters(&path, &text),
            None => Ok(Vec::new()),
        }
    }
}

/// MatrixStore over `distances.txt` and `coordinates.txt`
#[derive(Debug, Clone)]
pub struct FileMatrixStore {
    root: PathBuf,
}

impl FileMatrixStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn distances_path(&self) -> PathBuf {
        self.root.join(DISTANCES_FILE)
    }

    pub fn coordinates_path(&self) -> PathBuf {
        self.root.join(COORDINATES_FILE)
    }
}

#[async_trait]
impl MatrixStore for FileMatrixStore {
    async fn load_distance_matrix(&self) -> Result<Option<DistanceMatrix>> {
        let path = self.distances_path();
        read_optional(&path)
            .await?
            .map(|text| codec::decode_distances(&path, &text))
            .transpose()
    }

    async fn save_distance_matrix(&self, matrix: &DistanceMatrix, labels: &[String]) -> Result<()> {
        tokio::fs::write(self.distances_path(), codec::encode_distances(matrix, labels)).await?;
        Ok(())
    }

    async fn load_coordinate_matrix(&self) -> Result<Option<CoordinateMatrix>> {
        let path = self.coordinates_path();
        read_optional(&path)
            .await?
            .map(|text| codec::decode_coordinates(&path, &text))
            .transpose()
    }

    async fn save_coordinate_matrix(&self, matrix: &CoordinateMatrix, labels: &[String]) -> Result<()> {
        tokio::fs::write(self.coordinates_path(), codec::encode_coordinates(matrix, labels)).await?;
        Ok(())
    }

    async fn has_distance_matrix(&self) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.distances_path()).await?)
    }

    async fn recorded_counts(&self) -> Result<ArtifactCounts> {
        Ok(ArtifactCounts {
            distances: self.load_distance_matrix().await?.map(|m| m.size()),
            coordinates: self.load_coordinate_matrix().await?.map(|m| m.len()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_parameters_sorts_by_id() {
        let text = "2 4 0.1 0.01\n\n1 3 0.5 0.02\n";
        let configurations = parse_parameters(Path::new(PARAMETERS_FILE), text).unwrap();

        assert_eq!(configurations.len(), 2);
        assert_eq!(configurations[0], Configuration::new(1, 3.0, 0.5, 0.02));
        assert_eq!(configurations[1].kappa, 4.0);
    }

    #[test]
    fn test_parse_parameters_rejects_short_line() {
        let result = parse_parameters(Path::new(PARAMETERS_FILE), "1 3 0.5\n");
        assert!(matches!(result, Err(LdavizError::MalformedArtifact { line: 1, .. })));
    }

    #[test]
    fn test_parse_raw_groups_by_topic() {
        let configuration = Configuration::new(7, 2.0, 0.1, 0.1);
        let text = "1 gene 0.4\n0 cell 0.7\n0 gene 0.3\n1 cell 0.6\n";
        let dataset = parse_raw(Path::new("raw/7.txt"), &configuration, text).unwrap();

        assert_eq!(dataset.topic_count(), 2);
        assert_eq!(dataset.topics[0].probability("cell"), Some(0.7));
        assert_eq!(dataset.topics[1].probability("gene"), Some(0.4));
    }

    #[test]
    fn test_render_raw_is_parseable() {
        let configuration = Configuration::new(1, 1.0, 0.1, 0.1);
        let mut dataset = Dataset::new(configuration.id, Vec::new());
        dataset.insert_keyword(0, "alpha", 0.25);
        dataset.insert_keyword(0, "beta", 0.75);

        let parsed = parse_raw(Path::new("raw/1.txt"), &configuration, &render_raw(&dataset)).unwrap();
        assert_eq!(parsed, dataset);
    }
}
