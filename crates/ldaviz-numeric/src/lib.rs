//! ldaviz Numeric - Topic distances and planar embedding
//!
//! This crate holds the CPU-bound parts of the pipeline: distribution
//! distances between topics, their aggregation into a configuration-level
//! distance matrix, and classical multidimensional scaling of that matrix.

pub mod distance;
pub mod embedding;
pub mod metric;

pub use distance::{topic_distance_matrix, DistanceEngine};
pub use embedding::EmbeddingEngine;
pub use metric::topic_distance;
