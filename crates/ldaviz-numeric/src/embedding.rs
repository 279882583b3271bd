//! Classical multidimensional scaling into the plane

use ldaviz_core::error::{LdavizError, Result};
use ldaviz_core::models::{CoordinateMatrix, DistanceMatrix};
use nalgebra::DMatrix;

/// Relative tolerance below which an eigenvalue counts as zero
const EIGEN_TOLERANCE: f64 = 1e-9;

/// Number of output dimensions
const DIMENSIONS: usize = 2;

/// Projects a distance matrix onto two dimensions
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddingEngine;

impl EmbeddingEngine {
    pub fn new() -> Self {
        Self
    }

    /// Embed `distances` so that Euclidean distances between the returned
    /// points approximate the input dissimilarities.
    ///
    /// Axes whose eigenvalue is numerically zero collapse to zero
    /// coordinates instead of failing.
    pub fn embed(&self, distances: &DistanceMatrix) -> Result<CoordinateMatrix> {
        let n = distances.size();
        if let Some(pos) = distances.as_slice().iter().position(|v| !v.is_finite()) {
            return Err(LdavizError::InvalidMatrix {
                reason: format!("non-finite value at ({}, {})", pos / n, pos % n),
            });
        }

        match n {
            0 => return Ok(CoordinateMatrix::zeros(0)),
            1 => return Ok(CoordinateMatrix::zeros(1)),
            _ => {}
        }

        let centered = double_center(distances);
        let eigen = centered.symmetric_eigen();

        if eigen.eigenvalues.iter().any(|v| !v.is_finite())
            || eigen.eigenvectors.iter().any(|v| !v.is_finite())
        {
            return Err(LdavizError::NumericFailure {
                reason: "eigendecomposition produced non-finite values".to_string(),
            });
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));

        let scale = eigen.eigenvalues.iter().fold(1.0f64, |acc, v| acc.max(v.abs()));
        let tolerance = EIGEN_TOLERANCE * scale;

        let largest = eigen.eigenvalues[order[0]];
        if largest < -tolerance {
            return Err(LdavizError::NumericFailure {
                reason: format!("matrix is not positive semidefinite (largest eigenvalue {})", largest),
            });
        }

        let mut axes: Vec<Vec<f64>> = Vec::with_capacity(DIMENSIONS);
        for &k in order.iter().take(DIMENSIONS) {
            let lambda = eigen.eigenvalues[k];
            if lambda <= tolerance {
                tracing::debug!(eigenvalue = lambda, "Degenerate embedding axis");
                axes.push(vec![0.0; n]);
                continue;
            }

            let mut vector: Vec<f64> = eigen.eigenvectors.column(k).iter().copied().collect();
            normalize_sign(&mut vector);
            let factor = lambda.sqrt();
            axes.push(vector.into_iter().map(|v| v * factor).collect());
        }

        let mut axes = axes.into_iter();
        let x = axes.next().unwrap_or_else(|| vec![0.0; n]);
        let y = axes.next().unwrap_or_else(|| vec![0.0; n]);
        CoordinateMatrix::new(x, y)
    }
}

/// `B = -½ J D² J` written out with row means and the grand mean
fn double_center(distances: &DistanceMatrix) -> DMatrix<f64> {
    let n = distances.size();
    let squared = DMatrix::from_fn(n, n, |i, j| distances.get(i, j).powi(2));

    let row_means: Vec<f64> = (0..n).map(|i| squared.row(i).sum() / n as f64).collect();
    let grand_mean = row_means.iter().sum::<f64>() / n as f64;

    DMatrix::from_fn(n, n, |i, j| {
        -0.5 * (squared[(i, j)] - row_means[i] - row_means[j] + grand_mean)
    })
}

/// Flip the vector so its largest-magnitude component is positive
fn normalize_sign(vector: &mut [f64]) {
    let pivot = vector
        .iter()
        .copied()
        .fold(0.0f64, |best, v| if v.abs() > best.abs() { v } else { best });
    if pivot < 0.0 {
        for v in vector.iter_mut() {
            *v = -*v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairwise(points: &[(f64, f64)]) -> DistanceMatrix {
        let mut matrix = DistanceMatrix::zeros(points.len());
        for i in 0..points.len() {
            for j in (i + 1)..points.len() {
                let (dx, dy) = (points[i].0 - points[j].0, points[i].1 - points[j].1);
                matrix.set_symmetric(i, j, (dx * dx + dy * dy).sqrt());
            }
        }
        matrix
    }

    fn embedded_distance(coords: &CoordinateMatrix, i: usize, j: usize) -> f64 {
        let (xi, yi) = coords.point(i);
        let (xj, yj) = coords.point(j);
        ((xi - xj).powi(2) + (yi - yj).powi(2)).sqrt()
    }

    #[test]
    fn test_empty_and_single_point() {
        let engine = EmbeddingEngine::new();
        assert!(engine.embed(&DistanceMatrix::zeros(0)).unwrap().is_empty());

        let single = engine.embed(&DistanceMatrix::zeros(1)).unwrap();
        assert_eq!(single.point(0), (0.0, 0.0));
    }

    #[test]
    fn test_planar_points_are_recovered_up_to_isometry() {
        let points = [(0.0, 0.0), (3.0, 0.0), (0.0, 4.0), (3.0, 4.0), (1.0, 2.0)];
        let distances = pairwise(&points);

        let coords = EmbeddingEngine::new().embed(&distances).unwrap();
        assert_eq!(coords.len(), points.len());

        for i in 0..points.len() {
            for j in 0..points.len() {
                assert!((embedded_distance(&coords, i, j) - distances.get(i, j)).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_zero_matrix_collapses_to_origin() {
        let coords = EmbeddingEngine::new().embed(&DistanceMatrix::zeros(3)).unwrap();
        for i in 0..3 {
            let (x, y) = coords.point(i);
            assert!(x.abs() < 1e-12 && y.abs() < 1e-12);
        }
    }

    #[test]
    fn test_collinear_points_have_zero_second_axis() {
        let distances = pairwise(&[(0.0, 0.0), (1.0, 0.0), (3.0, 0.0)]);
        let coords = EmbeddingEngine::new().embed(&distances).unwrap();

        assert!(coords.y().iter().all(|v| v.abs() < 1e-6));
        assert!((embedded_distance(&coords, 0, 2) - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_repeated_runs_agree() {
        let distances = pairwise(&[(0.0, 1.0), (2.0, 0.5), (1.0, 3.0), (4.0, 4.0)]);
        let engine = EmbeddingEngine::new();

        let first = engine.embed(&distances).unwrap();
        let second = engine.embed(&distances).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_sign_normalization() {
        let mut v = vec![0.2, -0.9, 0.1];
        normalize_sign(&mut v);
        assert_eq!(v, vec![-0.2, 0.9, -0.1]);

        let mut w = vec![0.5, -0.1];
        normalize_sign(&mut w);
        assert_eq!(w, vec![0.5, -0.1]);
    }

    #[test]
    fn test_double_center_rows_sum_to_zero() {
        let distances = pairwise(&[(0.0, 0.0), (1.0, 1.0), (2.0, 5.0)]);
        let centered = double_center(&distances);
        for i in 0..3 {
            assert!(centered.row(i).sum().abs() < 1e-9);
        }
    }
}
