//! Namespaced key to byte-blob store.
//!
//! Every write is a single-row upsert; there are no transactions across keys.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;

/// Persistent blob store scoped to one bucket.
#[derive(Clone)]
pub struct BlobStore {
    pool: SqlitePool,
    bucket: String,
}

impl BlobStore {
    pub fn new(pool: SqlitePool, bucket: impl Into<String>) -> Self {
        Self {
            pool,
            bucket: bucket.into(),
        }
    }

    /// Read a blob. An absent key is a `StorageMiss`.
    pub async fn get(&self, key: &str) -> Result<Vec<u8>, AppError> {
        let row = sqlx::query("SELECT data FROM blobs WHERE bucket = ? AND key = ?")
            .bind(&self.bucket)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| row.get::<Vec<u8>, _>("data"))
            .ok_or_else(|| AppError::StorageMiss(format!("{}/{}", self.bucket, key)))
    }

    /// Read a blob as UTF-8 text.
    pub async fn get_text(&self, key: &str) -> Result<String, AppError> {
        let bytes = self.get(key).await?;
        String::from_utf8(bytes).map_err(|e| {
            AppError::Database(format!(
                "Entry {}/{} is not valid UTF-8: {}",
                self.bucket, key, e
            ))
        })
    }

    /// Insert or overwrite a blob.
    pub async fn put(&self, key: &str, data: &[u8]) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO blobs (bucket, key, data, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(bucket, key) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
        )
        .bind(&self.bucket)
        .bind(key)
        .bind(data)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Delete a blob. Returns whether anything was removed.
    pub async fn delete(&self, key: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM blobs WHERE bucket = ? AND key = ?")
            .bind(&self.bucket)
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Size in bytes of a stored blob, if present.
    pub async fn size(&self, key: &str) -> Result<Option<i64>, AppError> {
        let row = sqlx::query("SELECT length(data) AS size FROM blobs WHERE bucket = ? AND key = ?")
            .bind(&self.bucket)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| row.get("size")))
    }
}
