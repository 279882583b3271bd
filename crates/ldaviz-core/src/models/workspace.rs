use serde::{Deserialize, Serialize};
use std::fmt;

/// Flags gating which actions are currently valid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceState {
    /// Topic/keyword rows are in memory
    pub raw_data_loaded: bool,

    /// A distance matrix is in memory
    pub distance_data_loaded: bool,

    /// A coordinate matrix is in memory
    pub coordinates_loaded: bool,
}

/// Storage backend for configurations and raw topic data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageBackend {
    /// `parameters.txt` plus one `raw/<id>.txt` file per configuration
    #[default]
    Files,
    /// `topics.db` SQLite database
    Sqlite,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Files => f.write_str("files"),
            StorageBackend::Sqlite => f.write_str("sqlite"),
        }
    }
}

/// Configuration counts recorded in persisted artifacts
///
/// `None` means the artifact does not exist yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactCounts {
    pub distances: Option<usize>,
    pub coordinates: Option<usize>,
}

/// Agreement between persisted artifacts and the live configuration count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntegrityStatus {
    /// Every artifact exists and matches
    Consistent,
    /// No mismatch, but at least one artifact has not been written
    Incomplete,
    /// An artifact disagrees with the configuration count
    Corrupted,
}

impl IntegrityStatus {
    /// Grade recorded artifact counts against the live configuration count
    pub fn assess(live: usize, recorded: ArtifactCounts) -> Self {
        let counts = [recorded.distances, recorded.coordinates];

        if counts.iter().flatten().any(|&count| count != live) {
            IntegrityStatus::Corrupted
        } else if counts.iter().any(Option::is_none) {
            IntegrityStatus::Incomplete
        } else {
            IntegrityStatus::Consistent
        }
    }
}

impl fmt::Display for IntegrityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityStatus::Consistent => f.write_str("consistent"),
            IntegrityStatus::Incomplete => f.write_str("incomplete"),
            IntegrityStatus::Corrupted => f.write_str("corrupted"),
        }
    }
}
