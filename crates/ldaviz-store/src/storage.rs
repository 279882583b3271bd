use ldaviz_core::error::{LdavizError, Result};
use ldaviz_core::models::StorageBackend;
use std::path::Path;
use std::sync::Arc;

use crate::files::{FileMatrixStore, FileTopicStore};
use crate::memory::{MemoryMatrixStore, MemoryTopicStore};
use crate::ports::{MatrixStore, TopicStore};
use crate::sqlite::{SqliteTopicStore, DATABASE_FILE};

/// The pair of stores a workspace reads and writes through
#[derive(Clone)]
pub struct Storage {
    pub topics: Arc<dyn TopicStore>,
    pub matrices: Arc<dyn MatrixStore>,
}

impl Storage {
    pub fn new(topics: Arc<dyn TopicStore>, matrices: Arc<dyn MatrixStore>) -> Self {
        Self { topics, matrices }
    }

    /// Fresh in-memory stores
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTopicStore::new()), Arc::new(MemoryMatrixStore::new()))
    }

    /// Open the stores for a workspace directory
    ///
    /// Matrices always live in flat files next to the topic data.
    pub async fn open(dir: &Path, backend: StorageBackend) -> Result<Self> {
        let is_dir = tokio::fs::metadata(dir).await.map(|m| m.is_dir()).unwrap_or(false);
        if !is_dir {
            return Err(LdavizError::DirectoryNotFound { path: dir.to_path_buf() });
        }

        let topics: Arc<dyn TopicStore> = match backend {
            StorageBackend::Files => Arc::new(FileTopicStore::new(dir)),
            StorageBackend::Sqlite => Arc::new(SqliteTopicStore::open(&dir.join(DATABASE_FILE)).await?),
        };

        tracing::debug!(dir = %dir.display(), backend = %backend, "Opened storage");
        Ok(Self::new(topics, Arc::new(FileMatrixStore::new(dir))))
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").finish_non_exhaustive()
    }
}
