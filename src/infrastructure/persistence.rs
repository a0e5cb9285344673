//! SQLite-backed [`StateStore`] (spec §4.5 "Persistence", §6): one blob
//! table holding the latest serialized [`AgentState`](crate::domain::state::AgentState)
//! snapshot and one row tracking the next scheduled wake alarm. Grounded in
//! the teacher's `infrastructure/persistence/database.rs` connect-and-migrate
//! shape.

use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tokio::fs;
use tracing::info;

use crate::domain::ports::StateStore;

#[derive(Clone)]
pub struct SqliteStateStore {
    pool: SqlitePool,
}

impl SqliteStateStore {
    pub async fn new(db_url: &str) -> Result<Self> {
        if let Some(path_part) = db_url.strip_prefix("sqlite://") {
            let path = Path::new(path_part);
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    fs::create_dir_all(parent)
                        .await
                        .context("failed to create database directory")?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(db_url)
            .context("invalid sqlite connection string")?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("failed to connect to sqlite database")?;

        info!(db_url, "connected to agent state database");

        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS agent_state (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                blob BLOB NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("failed to create agent_state table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS alarm (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                fires_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("failed to create alarm table")?;

        // Older snapshot tables predate `updated_at`; ignore the error when
        // the column already exists.
        let _ = sqlx::query("ALTER TABLE agent_state ADD COLUMN updated_at INTEGER NOT NULL DEFAULT 0")
            .execute(&mut *conn)
            .await;

        Ok(())
    }
}

#[async_trait]
impl StateStore for SqliteStateStore {
    async fn load(&self) -> Result<Option<Vec<u8>>> {
        let row: Option<(Vec<u8>,)> = sqlx::query_as("SELECT blob FROM agent_state WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .context("failed to load agent state")?;
        Ok(row.map(|(blob,)| blob))
    }

    async fn save(&self, blob: &[u8]) -> Result<()> {
        let now = Utc::now().timestamp();
        sqlx::query(
            "INSERT INTO agent_state (id, blob, updated_at) VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET blob = excluded.blob, updated_at = excluded.updated_at",
        )
        .bind(blob)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("failed to save agent state")?;
        Ok(())
    }

    async fn load_alarm(&self) -> Result<Option<DateTime<Utc>>> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT fires_at FROM alarm WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .context("failed to load alarm")?;
        Ok(row.and_then(|(ts,)| DateTime::from_timestamp(ts, 0)))
    }

    async fn save_alarm(&self, at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            "INSERT INTO alarm (id, fires_at) VALUES (1, ?1)
             ON CONFLICT(id) DO UPDATE SET fires_at = excluded.fires_at",
        )
        .bind(at.timestamp())
        .execute(&self.pool)
        .await
        .context("failed to save alarm")?;
        Ok(())
    }

    async fn clear_alarm(&self) -> Result<()> {
        sqlx::query("DELETE FROM alarm WHERE id = 1")
            .execute(&self.pool)
            .await
            .context("failed to clear alarm")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_state_blob_and_alarm() {
        let store = SqliteStateStore::new("sqlite::memory:").await.unwrap();

        assert!(store.load().await.unwrap().is_none());
        store.save(b"hello world").await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(b"hello world".to_vec()));

        assert!(store.load_alarm().await.unwrap().is_none());
        let at = Utc::now();
        store.save_alarm(at).await.unwrap();
        let loaded = store.load_alarm().await.unwrap().unwrap();
        assert_eq!(loaded.timestamp(), at.timestamp());

        store.clear_alarm().await.unwrap();
        assert!(store.load_alarm().await.unwrap().is_none());
    }
}
