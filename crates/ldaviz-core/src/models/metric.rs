use serde::{Deserialize, Serialize};
use std::fmt;

/// Distance between two topic distributions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TopicMetric {
    /// `-log2 Σ √(p·q)`
    #[default]
    Bhattacharyya,
    /// `(1/√2) · √Σ (√p - √q)²`
    Hellinger,
    /// `Σ p · log2(p/q)`, source topic to target topic
    KullbackLeibler,
    /// Mean KL divergence of both topics to their midpoint
    JensenShannon,
    /// Plain L2 distance
    Euclidean,
}

impl TopicMetric {
    /// Whether `d(p, q) == d(q, p)` for every pair
    pub fn is_symmetric(&self) -> bool {
        !matches!(self, TopicMetric::KullbackLeibler)
    }
}

impl fmt::Display for TopicMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TopicMetric::Bhattacharyya => "bhattacharyya",
            TopicMetric::Hellinger => "hellinger",
            TopicMetric::KullbackLeibler => "kullback-leibler",
            TopicMetric::JensenShannon => "jensen-shannon",
            TopicMetric::Euclidean => "euclidean",
        };
        f.write_str(name)
    }
}

/// How topic-level distances are folded into one dataset distance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Aggregation {
    /// Sum of nearest-topic distances over `n_i · n_j`, averaged over both directions
    #[default]
    Minimal,
    /// Directed Hausdorff distance, averaged over both directions
    Hausdorff,
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregation::Minimal => f.write_str("minimal"),
            Aggregation::Hausdorff => f.write_str("hausdorff"),
        }
    }
}
