//! Response cache bucket owned by the request interceptor.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::CachedResponse;

/// Cached responses keyed by request URL (or a synthetic key).
#[derive(Clone)]
pub struct ResponseCache {
    pool: SqlitePool,
    bucket: String,
}

impl ResponseCache {
    pub fn new(pool: SqlitePool, bucket: impl Into<String>) -> Self {
        Self {
            pool,
            bucket: bucket.into(),
        }
    }

    /// Look up a cached response.
    pub async fn get(&self, url: &str) -> Result<Option<CachedResponse>, AppError> {
        let row = sqlx::query(
            "SELECT status, content_type, body, stored_at FROM responses WHERE bucket = ? AND url = ?",
        )
        .bind(&self.bucket)
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(response_from_row))
    }

    /// Store a response, replacing any previous entry for the URL.
    pub async fn put(&self, url: &str, response: &CachedResponse) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO responses (bucket, url, status, content_type, body, stored_at) VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(bucket, url) DO UPDATE SET status = excluded.status, content_type = excluded.content_type,
             body = excluded.body, stored_at = excluded.stored_at",
        )
        .bind(&self.bucket)
        .bind(url)
        .bind(response.status as i64)
        .bind(&response.content_type)
        .bind(&response.body)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Remove a cached response. Returns whether anything was removed.
    pub async fn delete(&self, url: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM responses WHERE bucket = ? AND url = ?")
            .bind(&self.bucket)
            .bind(url)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn response_from_row(row: &sqlx::sqlite::SqliteRow) -> CachedResponse {
    let status: i64 = row.get("status");
    CachedResponse {
        status: status as u16,
        content_type: row.get("content_type"),
        body: row.get("body"),
        stored_at: row.get("stored_at"),
    }
}
