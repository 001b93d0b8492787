use arc_swap::ArcSwap;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Row, Sqlite};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use super::AppConfig;
use crate::error::Result;

/// Key under which the serialized configuration is stored
const CONFIG_KEY: &str = "app";

/// Configuration store backed by SQLite
///
/// Uses `ArcSwap` for lock-free reads, providing high performance
/// for frequent configuration access in hot paths.
#[derive(Clone)]
pub struct ConfigStore {
    pool: Pool<Sqlite>,
    /// Lock-free cache using ArcSwap for zero-cost reads
    cache: Arc<ArcSwap<AppConfig>>,
    change_tx: broadcast::Sender<ConfigChange>,
}

/// Configuration change event
#[derive(Debug, Clone)]
pub struct ConfigChange {
    pub key: String,
}

impl ConfigStore {
    /// Create a new configuration store
    pub async fn new(db_path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = SqlitePoolOptions::new()
            // SQLite uses single-writer mode, 2 connections is sufficient:
            // one for reads, one for writes to avoid blocking
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(300))
            .connect(&db_url)
            .await?;

        // Initialize database schema
        Self::init_schema(&pool).await?;

        // Load or create default config
        let config = Self::load_config(&pool).await?;
        let cache = Arc::new(ArcSwap::from_pointee(config));

        let (change_tx, _) = broadcast::channel(16);

        Ok(Self {
            pool,
            cache,
            change_tx,
        })
    }

    /// Initialize database schema
    async fn init_schema(pool: &Pool<Sqlite>) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS config (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Load configuration from the database, writing defaults on first run
    async fn load_config(pool: &Pool<Sqlite>) -> Result<AppConfig> {
        let row = sqlx::query("SELECT value FROM config WHERE key = ?")
            .bind(CONFIG_KEY)
            .fetch_optional(pool)
            .await?;

        match row {
            Some(row) => {
                let value: String = row.get("value");
                match serde_json::from_str(&value) {
                    Ok(config) => Ok(config),
                    Err(e) => {
                        // Unreadable config falls back to defaults rather
                        // than refusing to start
                        tracing::warn!("Stored config invalid ({}), using defaults", e);
                        Ok(AppConfig::default())
                    }
                }
            }
            None => {
                let config = AppConfig::default();
                Self::persist(pool, &config).await?;
                Ok(config)
            }
        }
    }

    /// Write configuration to the database
    async fn persist(pool: &Pool<Sqlite>, config: &AppConfig) -> Result<()> {
        let value = serde_json::to_string(config)?;
        sqlx::query(
            r#"
            INSERT INTO config (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(CONFIG_KEY)
        .bind(value)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Get the current configuration (lock-free)
    pub fn get(&self) -> Arc<AppConfig> {
        self.cache.load_full()
    }

    /// Replace the configuration, persisting it and notifying subscribers
    pub async fn set(&self, config: AppConfig) -> Result<()> {
        Self::persist(&self.pool, &config).await?;
        self.cache.store(Arc::new(config));

        let _ = self.change_tx.send(ConfigChange {
            key: CONFIG_KEY.to_string(),
        });

        Ok(())
    }

    /// Subscribe to configuration changes
    pub fn subscribe(&self) -> broadcast::Receiver<ConfigChange> {
        self.change_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_defaults_on_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(&dir.path().join("vigil.db")).await.unwrap();

        let config = store.get();
        assert_eq!(config.gaze.eyes_closed_dwell_ms, 3000);
        assert_eq!(config.web.http_port, 8800);
    }

    #[tokio::test]
    async fn test_set_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("vigil.db");

        {
            let store = ConfigStore::new(&db_path).await.unwrap();
            let mut config = (*store.get()).clone();
            config.signaling.url = "ws://10.0.0.2:8000/api/ws".to_string();
            store.set(config).await.unwrap();
        }

        let store = ConfigStore::new(&db_path).await.unwrap();
        assert_eq!(store.get().signaling.url, "ws://10.0.0.2:8000/api/ws");
    }

    #[tokio::test]
    async fn test_change_notification() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(&dir.path().join("vigil.db")).await.unwrap();

        let mut rx = store.subscribe();
        store.set(AppConfig::default()).await.unwrap();

        let change = rx.recv().await.unwrap();
        assert_eq!(change.key, "app");
    }
}
