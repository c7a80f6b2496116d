// SQLite-backed memorial store.
//
// Tables:
// - memorial_queues: one JSON-encoded queue per memorial, with a version counter
// - memorial_admins: admin token and contact details per memorial
//
// Writes are conditional on the version read earlier, so concurrent moderators
// get a conflict instead of silently overwriting each other.

use crate::core::moderation::{
    AdminRecord, MemorialQueue, MemorialStore, Slug, StoreError, Versioned,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

pub struct SqliteMemorialStore {
    pool: Pool<Sqlite>,
}

impl SqliteMemorialStore {
    /// Open (creating if needed) the database at `database_path` and run migrations.
    ///
    /// `:memory:` gives a private in-memory database.
    pub async fn new(database_path: &str) -> anyhow::Result<Self> {
        // Every connection to :memory: is its own database, so keep exactly one.
        let (conn_str, max_connections) = if database_path.contains(":memory:") {
            ("sqlite::memory:".to_string(), 1)
        } else {
            if let Some(parent) = Path::new(database_path).parent() {
                std::fs::create_dir_all(parent)?;
            }
            (format!("sqlite://{}?mode=rwc", database_path), 5)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(&conn_str)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Run database migrations to create required tables.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS memorial_queues (
                slug TEXT PRIMARY KEY,
                version INTEGER NOT NULL,
                data TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS memorial_admins (
                slug TEXT PRIMARY KEY,
                token TEXT NOT NULL,
                contact_email TEXT,
                contact_name TEXT,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(())
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

#[async_trait]
impl MemorialStore for SqliteMemorialStore {
    async fn load_queue(&self, slug: &Slug) -> Result<Versioned<MemorialQueue>, StoreError> {
        let row = sqlx::query("SELECT version, data FROM memorial_queues WHERE slug = ?")
            .bind(slug.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        let Some(row) = row else {
            return Ok(Versioned {
                version: 0,
                value: MemorialQueue::default(),
            });
        };

        let data: String = row.get("data");
        let queue: MemorialQueue = serde_json::from_str(&data)
            .map_err(|e| StoreError::Backend(format!("corrupt queue for {}: {}", slug, e)))?;

        Ok(Versioned {
            version: row.get::<i64, _>("version") as u64,
            value: queue,
        })
    }

    async fn save_queue(
        &self,
        slug: &Slug,
        expected_version: u64,
        queue: &MemorialQueue,
    ) -> Result<u64, StoreError> {
        let data = serde_json::to_string(queue).map_err(|e| StoreError::Backend(e.to_string()))?;

        let result = if expected_version == 0 {
            sqlx::query(
                r#"
                INSERT INTO memorial_queues (slug, version, data, updated_at)
                VALUES (?, 1, ?, ?)
                ON CONFLICT(slug) DO NOTHING
                "#,
            )
            .bind(slug.as_str())
            .bind(&data)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
        } else {
            sqlx::query(
                r#"
                UPDATE memorial_queues
                SET version = version + 1, data = ?, updated_at = ?
                WHERE slug = ? AND version = ?
                "#,
            )
            .bind(&data)
            .bind(Utc::now().to_rfc3339())
            .bind(slug.as_str())
            .bind(expected_version as i64)
            .execute(&self.pool)
            .await
        };

        if result.map_err(backend)?.rows_affected() == 0 {
            return Err(StoreError::VersionConflict);
        }
        Ok(expected_version + 1)
    }

    async fn get_admin(&self, slug: &Slug) -> Result<Option<AdminRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT token, contact_email, contact_name, created_at FROM memorial_admins WHERE slug = ?",
        )
        .bind(slug.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let created_at_str: String = row.get("created_at");
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(Some(AdminRecord {
            token: row.get("token"),
            contact_email: row.get("contact_email"),
            contact_name: row.get("contact_name"),
            created_at,
        }))
    }

    async fn put_admin(&self, slug: &Slug, record: AdminRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO memorial_admins (slug, token, contact_email, contact_name, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(slug) DO UPDATE SET
                token = excluded.token,
                contact_email = excluded.contact_email,
                contact_name = excluded.contact_name,
                created_at = excluded.created_at
            "#,
        )
        .bind(slug.as_str())
        .bind(&record.token)
        .bind(&record.contact_email)
        .bind(&record.contact_name)
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }
}
