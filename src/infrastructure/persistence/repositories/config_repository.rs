//! `ConfigRepository` over sqlite: a flat key-value store for runtime
//! overrides such as learned scoring weights (spec §4.1).

use crate::domain::errors::RepositoryError;
use crate::domain::repositories::ConfigRepository;
use crate::infrastructure::persistence::Database;
use async_trait::async_trait;
use sqlx::Row;

pub struct SqliteConfigRepository {
    database: Database,
}

impl SqliteConfigRepository {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl ConfigRepository for SqliteConfigRepository {
    async fn get(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        let row = sqlx::query("SELECT value FROM config_kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.database.pool)
            .await?;
        row.map(|r| r.try_get("value")).transpose().map_err(RepositoryError::from)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO config_kv (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.database.pool)
        .await?;
        Ok(())
    }
}
