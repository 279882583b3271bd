use ldaviz_core::error::{LdavizError, Result};
use ldaviz_core::models::{
    Aggregation, Configuration, Dataset, DatasetMap, DistanceMatrix, TopicMetric,
};

use crate::metric::topic_distance;

/// Computes configuration-level distances from topic-level distances
#[derive(Debug, Clone, Copy)]
pub struct DistanceEngine {
    metric: TopicMetric,
    aggregation: Aggregation,
}

impl DistanceEngine {
    pub fn new(metric: TopicMetric, aggregation: Aggregation) -> Self {
        Self { metric, aggregation }
    }

    pub fn metric(&self) -> TopicMetric {
        self.metric
    }

    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }

    /// Build the full distance matrix for an ordered configuration list
    ///
    /// `progress` is called after every completed configuration pair with
    /// `(pairs_done, pairs_total)`.
    pub fn compute<F>(
        &self,
        configurations: &[Configuration],
        datasets: &DatasetMap,
        mut progress: F,
    ) -> Result<DistanceMatrix>
    where
        F: FnMut(usize, usize),
    {
        let ordered: Vec<&Dataset> = configurations
            .iter()
            .map(|c| {
                datasets.get(&c.id).ok_or_else(|| LdavizError::DatasetMissing { id: c.id.0 })
            })
            .collect::<Result<_>>()?;

        let n = ordered.len();
        let total = n * n.saturating_sub(1) / 2;
        let mut matrix = DistanceMatrix::zeros(n);
        let mut done = 0;

        tracing::debug!(
            configurations = n,
            pairs = total,
            metric = %self.metric,
            aggregation = %self.aggregation,
            "Computing distance matrix"
        );

        for i in 0..n {
            for j in (i + 1)..n {
                let distance = self.dataset_distance(ordered[i], ordered[j])?;
                matrix.set_symmetric(i, j, distance);
                done += 1;
                progress(done, total);
            }
        }

        Ok(matrix)
    }

    /// Symmetric distance between two datasets
    pub fn dataset_distance(&self, a: &Dataset, b: &Dataset) -> Result<f64> {
        for dataset in [a, b] {
            if dataset.topics.is_empty() {
                return Err(LdavizError::EmptyDataset { id: dataset.configuration.0 });
            }
        }

        let forward_grid = topic_distance_matrix(self.metric, a, b)?;
        let forward: Vec<f64> = forward_grid.iter().map(|row| row_min(row)).collect();

        let backward: Vec<f64> = if self.metric.is_symmetric() {
            (0..b.topics.len())
                .map(|col| forward_grid.iter().map(|row| row[col]).fold(f64::INFINITY, f64::min))
                .collect()
        } else {
            topic_distance_matrix(self.metric, b, a)?.iter().map(|row| row_min(row)).collect()
        };

        let distance = match self.aggregation {
            Aggregation::Minimal => {
                let pairs = (a.topics.len() * b.topics.len()) as f64;
                let forward_mean = forward.iter().sum::<f64>() / pairs;
                let backward_mean = backward.iter().sum::<f64>() / pairs;
                (forward_mean + backward_mean) / 2.0
            }
            Aggregation::Hausdorff => {
                let forward_max = forward.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let backward_max = backward.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                (forward_max + backward_max) / 2.0
            }
        };

        Ok(distance)
    }
}

/// Topic-by-topic distance grid between two datasets
///
/// Row `r`, column `c` holds the distance from topic `r` of `source` to
/// topic `c` of `target`.
pub fn topic_distance_matrix(
    metric: TopicMetric,
    source: &Dataset,
    target: &Dataset,
) -> Result<Vec<Vec<f64>>> {
    source
        .topics
        .iter()
        .map(|s| target.topics.iter().map(|t| topic_distance(metric, s, t)).collect())
        .collect()
}

fn row_min(row: &[f64]) -> f64 {
    row.iter().copied().fold(f64::INFINITY, f64::min)
}
