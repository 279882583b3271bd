use serde::{Deserialize, Serialize};

use crate::error::{LdavizError, Result};

/// Absolute tolerance used when validating symmetry and the zero diagonal
const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// Square, symmetric, zero-diagonal matrix of configuration dissimilarities
///
/// Indexed by position in the ordered configuration list. Stored row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceMatrix {
    size: usize,
    values: Vec<f64>,
}

impl DistanceMatrix {
    /// Create an n×n matrix of zeros
    pub fn zeros(size: usize) -> Self {
        Self { size, values: vec![0.0; size * size] }
    }

    /// Build a matrix from rows, validating shape, finiteness and symmetry
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let size = rows.len();
        let mut values = Vec::with_capacity(size * size);

        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != size {
                return Err(LdavizError::InvalidMatrix {
                    reason: format!("row {} has {} values, expected {}", i, row.len(), size),
                });
            }
            values.extend(row);
        }

        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(LdavizError::InvalidMatrix {
                reason: format!("non-finite value at ({}, {})", pos / size, pos % size),
            });
        }

        let matrix = Self { size, values };
        for i in 0..size {
            if matrix.get(i, i).abs() > SYMMETRY_TOLERANCE {
                return Err(LdavizError::InvalidMatrix {
                    reason: format!("diagonal entry {} is {}", i, matrix.get(i, i)),
                });
            }
            for j in (i + 1)..size {
                if (matrix.get(i, j) - matrix.get(j, i)).abs() > SYMMETRY_TOLERANCE {
                    return Err(LdavizError::InvalidMatrix {
                        reason: format!("entries ({}, {}) and ({}, {}) differ", i, j, j, i),
                    });
                }
            }
        }

        Ok(matrix)
    }

    /// Number of rows (and columns)
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }

    /// Set both (i, j) and (j, i). The diagonal stays zero.
    pub fn set_symmetric(&mut self, i: usize, j: usize, value: f64) {
        assert_ne!(i, j, "diagonal entries of a distance matrix are fixed at zero");
        self.values[i * self.size + j] = value;
        self.values[j * self.size + i] = value;
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.size..(i + 1) * self.size]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks(0) panics, so an empty matrix yields no rows explicitly
        self.values.chunks(self.size.max(1)).take(self.size)
    }

    /// Row-major view of all entries
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Largest entry, zero for an empty matrix
    pub fn max_distance(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }
}

/// Planar embedding coordinates, one point per configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateMatrix {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl CoordinateMatrix {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self> {
        if x.len() != y.len() {
            return Err(LdavizError::InvalidMatrix {
                reason: format!("x has {} values but y has {}", x.len(), y.len()),
            });
        }
        Ok(Self { x, y })
    }

    /// All points at the origin
    pub fn zeros(len: usize) -> Self {
        Self { x: vec![0.0; len], y: vec![0.0; len] }
    }

    /// Build from exactly two rows (x then y)
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        if rows.len() != 2 {
            return Err(LdavizError::InvalidMatrix {
                reason: format!("expected 2 coordinate rows, found {}", rows.len()),
            });
        }
        let mut rows = rows.into_iter();
        let x = rows.next().unwrap_or_default();
        let y = rows.next().unwrap_or_default();
        Self::new(x, y)
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn point(&self, i: usize) -> (f64, f64) {
        (self.x[i], self.y[i])
    }

    pub fn rows(&self) -> [&[f64]; 2] {
        [&self.x, &self.y]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_symmetric_mirrors_entry() {
        let mut matrix = DistanceMatrix::zeros(3);
        matrix.set_symmetric(0, 2, 1.5);

        assert_eq!(matrix.get(0, 2), 1.5);
        assert_eq!(matrix.get(2, 0), 1.5);
        assert_eq!(matrix.get(1, 1), 0.0);
        assert_eq!(matrix.max_distance(), 1.5);
    }

    #[test]
    fn test_from_rows_rejects_asymmetric() {
        let result = DistanceMatrix::from_rows(vec![vec![0.0, 1.0], vec![2.0, 0.0]]);
        assert!(matches!(result, Err(LdavizError::InvalidMatrix { .. })));
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let result = DistanceMatrix::from_rows(vec![vec![0.0, 1.0], vec![1.0]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_rows_rejects_nonzero_diagonal() {
        let result = DistanceMatrix::from_rows(vec![vec![0.5, 1.0], vec![1.0, 0.0]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rows_of_empty_matrix() {
        let matrix = DistanceMatrix::zeros(0);
        assert_eq!(matrix.rows().count(), 0);
        assert!(matrix.is_empty());
    }

    #[test]
    fn test_coordinate_rows_must_align() {
        assert!(CoordinateMatrix::new(vec![1.0, 2.0], vec![1.0]).is_err());
        assert!(CoordinateMatrix::from_rows(vec![vec![1.0]]).is_err());

        let coords = CoordinateMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(coords.len(), 2);
        assert_eq!(coords.point(1), (2.0, 4.0));
    }
}
