//! SQLite storage adapter implementation

use async_trait::async_trait;
use futures::TryStreamExt;
use ldaviz_core::error::{LdavizError, Result};
use ldaviz_core::models::{Configuration, Dataset, DatasetMap};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;

use crate::ports::{Progress, TopicStore};

pub const DATABASE_FILE: &str = "topics.db";

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS configurations (
        id INTEGER PRIMARY KEY,
        kappa REAL NOT NULL,
        alpha REAL NOT NULL,
        eta REAL NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS keyword_in_topic (
        configuration_id INTEGER NOT NULL,
        topic INTEGER NOT NULL,
        keyword TEXT NOT NULL,
        probability REAL NOT NULL,
        PRIMARY KEY (configuration_id, topic, keyword)
    )
    "#,
];

fn storage_error(context: &str) -> impl FnOnce(sqlx::Error) -> LdavizError + '_ {
    move |e| LdavizError::Storage(format!("{}: {}", context, e))
}

type ConfigurationRow = (i64, f64, f64, f64);

fn to_configuration((id, kappa, alpha, eta): ConfigurationRow) -> Result<Configuration> {
    let id = u32::try_from(id)
        .map_err(|_| LdavizError::Storage(format!("configuration id {} out of range", id)))?;
    Ok(Configuration::new(id, kappa, alpha, eta))
}

/// TopicStore over the `configurations` and `keyword_in_topic` tables
#[derive(Debug, Clone)]
pub struct SqliteTopicStore {
    pool: SqlitePool,
}

impl SqliteTopicStore {
    /// Open (or create) a database file and ensure the schema exists
    pub async fn open(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new().filename(path).create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(storage_error("Failed to open database"))?;

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool and ensure the schema exists
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(storage_error("Failed to create schema"))?;
        }
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a configuration with all its keyword rows in one transaction
    pub async fn insert_dataset(&self, configuration: &Configuration, dataset: &Dataset) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(storage_error("Failed to begin transaction"))?;

        sqlx::query("INSERT OR REPLACE INTO configurations (id, kappa, alpha, eta) VALUES (?, ?, ?, ?)")
            .bind(i64::from(configuration.id.0))
            .bind(configuration.kappa)
            .bind(configuration.alpha)
            .bind(configuration.eta)
            .execute(&mut *tx)
            .await
            .map_err(storage_error("Failed to insert configuration"))?;

        sqlx::query("DELETE FROM keyword_in_topic WHERE configuration_id = ?")
            .bind(i64::from(configuration.id.0))
            .execute(&mut *tx)
            .await
            .map_err(storage_error("Failed to clear keyword rows"))?;

        for topic in &dataset.topics {
            for (keyword, probability) in &topic.keywords {
                sqlx::query(
                    "INSERT INTO keyword_in_topic (configuration_id, topic, keyword, probability) VALUES (?, ?, ?, ?)",
                )
                .bind(i64::from(configuration.id.0))
                .bind(topic.index as i64)
                .bind(keyword.as_str())
                .bind(*probability)
                .execute(&mut *tx)
                .await
                .map_err(storage_error("Failed to insert keyword row"))?;
            }
        }

        tx.commit().await.map_err(storage_error("Failed to commit transaction"))?;
        Ok(())
    }
}

#[async_trait]
impl TopicStore for SqliteTopicStore {
    async fn load_configurations(&self) -> Result<Vec<Configuration>> {
        let rows: Vec<ConfigurationRow> = sqlx::query_as(
            r#"
            SELECT c.id, c.kappa, c.alpha, c.eta FROM configurations c
            WHERE EXISTS (SELECT 1 FROM keyword_in_topic k WHERE k.configuration_id = c.id)
            ORDER BY c.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error("Failed to load configurations"))?;

        rows.into_iter().map(to_configuration).collect()
    }

    async fn count_configurations(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM configurations c
            WHERE EXISTS (SELECT 1 FROM keyword_in_topic k WHERE k.configuration_id = c.id)
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error("Failed to count configurations"))?;

        Ok(count.max(0) as usize)
    }

    async fn load_raw_data(
        &self,
        configurations: &[Configuration],
        progress: Progress<'_>,
    ) -> Result<DatasetMap> {
        let total = configurations.len();
        let mut datasets = DatasetMap::new();

        for (i, configuration) in configurations.iter().enumerate() {
            let mut rows = sqlx::query_as::<_, (i64, String, f64)>(
                "SELECT topic, keyword, probability FROM keyword_in_topic WHERE configuration_id = ?",
            )
            .bind(i64::from(configuration.id.0))
            .fetch(&self.pool);

            let mut dataset = Dataset::new(configuration.id, Vec::new());
            while let Some((topic, keyword, probability)) =
                rows.try_next().await.map_err(storage_error("Failed to read keyword rows"))?
            {
                let topic = usize::try_from(topic)
                    .map_err(|_| LdavizError::Storage(format!("negative topic index {}", topic)))?;
                dataset.insert_keyword(topic, keyword, probability);
            }

            if !dataset.topics.is_empty() {
                datasets.insert(configuration.id, dataset);
            }
            progress(i + 1, total);
        }

        Ok(datasets)
    }

    async fn store_configurations(&self, configurations: &[Configuration]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(storage_error("Failed to begin transaction"))?;

        // Listed-only configurations from an earlier sweep are replaced
        sqlx::query(
            "DELETE FROM configurations WHERE id NOT IN (SELECT DISTINCT configuration_id FROM keyword_in_topic)",
        )
        .execute(&mut *tx)
        .await
        .map_err(storage_error("Failed to clear parameter list"))?;

        for configuration in configurations {
            sqlx::query("INSERT OR REPLACE INTO configurations (id, kappa, alpha, eta) VALUES (?, ?, ?, ?)")
                .bind(i64::from(configuration.id.0))
                .bind(configuration.kappa)
                .bind(configuration.alpha)
                .bind(configuration.eta)
                .execute(&mut *tx)
                .await
                .map_err(storage_error("Failed to store configuration"))?;
        }

        tx.commit().await.map_err(storage_error("Failed to commit transaction"))?;
        Ok(())
    }

    async fn load_parameter_list(&self) -> Result<Vec<Configuration>> {
        let rows: Vec<ConfigurationRow> =
            sqlx::query_as("SELECT id, kappa, alpha, eta FROM configurations ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .map_err(storage_error("Failed to load parameter list"))?;

        rows.into_iter().map(to_configuration).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ldaviz_core::models::Topic;

    async fn memory_store() -> SqliteTopicStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        SqliteTopicStore::from_pool(pool).await.unwrap()
    }

    fn dataset(configuration: &Configuration) -> Dataset {
        Dataset::new(
            configuration.id,
            vec![
                Topic::with_keywords(0, [("cell", 0.6), ("gene", 0.4)]),
                Topic::with_keywords(1, [("cell", 0.1), ("gene", 0.9)]),
            ],
        )
    }

    #[tokio::test]
    async fn test_insert_and_load_dataset() {
        let store = memory_store().await;
        let configuration = Configuration::new(5, 2.0, 0.1, 0.01);
        store.insert_dataset(&configuration, &dataset(&configuration)).await.unwrap();

        assert_eq!(store.load_configurations().await.unwrap(), vec![configuration]);

        let mut calls = 0;
        let datasets = store
            .load_raw_data(&[configuration], &mut |_: usize, _: usize| calls += 1)
            .await
            .unwrap();
        assert_eq!(calls, 1);
        assert_eq!(datasets[&configuration.id], dataset(&configuration));
    }

    #[tokio::test]
    async fn test_parameter_list_without_rows_is_not_counted() {
        let store = memory_store().await;
        let listed: Vec<Configuration> =
            (1..=3).map(|id| Configuration::new(id, 2.0, 0.1, 0.1)).collect();
        store.store_configurations(&listed).await.unwrap();
        store.insert_dataset(&listed[1], &dataset(&listed[1])).await.unwrap();

        assert_eq!(store.load_parameter_list().await.unwrap().len(), 3);
        assert_eq!(store.count_configurations().await.unwrap(), 1);
        assert_eq!(store.load_configurations().await.unwrap()[0].id.0, 2);
    }

    #[tokio::test]
    async fn test_reinserting_replaces_rows() {
        let store = memory_store().await;
        let configuration = Configuration::new(1, 1.0, 0.1, 0.1);
        store.insert_dataset(&configuration, &dataset(&configuration)).await.unwrap();

        let smaller = Dataset::new(configuration.id, vec![Topic::with_keywords(0, [("cell", 1.0)])]);
        store.insert_dataset(&configuration, &smaller).await.unwrap();

        let datasets = store.load_raw_data(&[configuration], &mut |_: usize, _: usize| {}).await.unwrap();
        assert_eq!(datasets[&configuration.id].topic_count(), 1);
    }
}
