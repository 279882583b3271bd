//! Text codec for persisted matrices
//!
//! An artifact starts with one header line of configuration labels. Every
//! following non-blank line is a matrix row of whitespace-separated floats.
//! Values are written in Rust's shortest round-trip form, so a save/load
//! cycle reproduces them exactly.

use ldaviz_core::error::{LdavizError, Result};
use ldaviz_core::models::{CoordinateMatrix, DistanceMatrix};
use std::fmt::Write;
use std::path::Path;

/// Render a header line followed by one line per row
pub fn encode<'a, I>(labels: &[String], rows: I) -> String
where
    I: IntoIterator<Item = &'a [f64]>,
{
    let mut out = labels.join(" ");
    out.push('\n');

    for row in rows {
        let mut first = true;
        for value in row {
            if !first {
                out.push(' ');
            }
            // Writing to a String cannot fail
            let _ = write!(out, "{}", value);
            first = false;
        }
        out.push('\n');
    }

    out
}

pub fn encode_distances(matrix: &DistanceMatrix, labels: &[String]) -> String {
    encode(labels, matrix.rows())
}

pub fn encode_coordinates(matrix: &CoordinateMatrix, labels: &[String]) -> String {
    encode(labels, matrix.rows())
}

/// Parse the rows of an artifact, skipping the header and blank lines
///
/// `path` is only used for error reporting.
pub fn decode_rows(path: &Path, text: &str) -> Result<Vec<Vec<f64>>> {
    let mut rows = Vec::new();

    for (index, line) in text.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }

        let row = line
            .split_whitespace()
            .map(|token| {
                token.parse::<f64>().map_err(|e| LdavizError::MalformedArtifact {
                    path: path.to_path_buf(),
                    line: index + 1,
                    reason: format!("'{}' is not a number: {}", token, e),
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }

    Ok(rows)
}

pub fn decode_distances(path: &Path, text: &str) -> Result<DistanceMatrix> {
    DistanceMatrix::from_rows(decode_rows(path, text)?).map_err(|e| malformed(path, e))
}

/// An artifact with no rows decodes to an empty embedding
pub fn decode_coordinates(path: &Path, text: &str) -> Result<CoordinateMatrix> {
    let rows = decode_rows(path, text)?;
    if rows.is_empty() {
        return Ok(CoordinateMatrix::zeros(0));
    }
    CoordinateMatrix::from_rows(rows).map_err(|e| malformed(path, e))
}

fn malformed(path: &Path, error: LdavizError) -> LdavizError {
    LdavizError::MalformedArtifact {
        path: path.to_path_buf(),
        line: 0,
        reason: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("{}:{},0.1,0.01", i, i + 1)).collect()
    }

    #[test]
    fn test_encode_writes_header_then_rows() {
        let text = encode(&labels(2), [&[0.0, 1.5][..], &[1.5, 0.0][..]]);
        assert_eq!(text, "1:2,0.1,0.01 2:3,0.1,0.01\n0 1.5\n1.5 0\n");
    }

    #[test]
    fn test_values_survive_save_and_load() {
        let mut matrix = DistanceMatrix::zeros(3);
        matrix.set_symmetric(0, 1, 0.1 + 0.2);
        matrix.set_symmetric(0, 2, 1.0 / 3.0);
        matrix.set_symmetric(1, 2, 1e-300);

        let text = encode_distances(&matrix, &labels(3));
        let loaded = decode_distances(Path::new("distances.txt"), &text).unwrap();
        assert_eq!(loaded, matrix);
    }

    #[test]
    fn test_two_by_five_coordinates_keep_alignment() {
        let text = "1:2,0.1,0.01 2:2,0.1,0.02 3:2,0.1,0.03 4:3,0.1,0.01 5:3,0.1,0.02\n\
                    0.5 -1 2.25 0 3\n\
                    \n\
                    1 2 3 4 5\n";

        let coords = decode_coordinates(Path::new("coordinates.txt"), text).unwrap();
        assert_eq!(coords.len(), 5);
        assert_eq!(coords.point(0), (0.5, 1.0));
        assert_eq!(coords.point(4), (3.0, 5.0));
    }

    #[test]
    fn test_header_only_coordinates_are_empty() {
        let coords = decode_coordinates(Path::new("coordinates.txt"), "\n").unwrap();
        assert!(coords.is_empty());
    }

    #[test]
    fn test_bad_token_reports_line() {
        let text = "a b\n0 1\n1 zero\n";
        match decode_rows(Path::new("distances.txt"), text) {
            Err(LdavizError::MalformedArtifact { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected MalformedArtifact, got {:?}", other),
        }
    }

    #[test]
    fn test_ragged_distances_are_malformed() {
        let text = "a b\n0 1\n1\n";
        let result = decode_distances(Path::new("distances.txt"), text);
        assert!(matches!(result, Err(LdavizError::MalformedArtifact { .. })));
    }
}
