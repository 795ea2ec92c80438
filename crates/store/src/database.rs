//! Read-only SQLite connection pool
//!
//! A [`Database`] is constructed from [`DatabaseConfig`] and does nothing until
//! [`Database::connect`] opens `pool_size` read-only connections. Queries check a
//! connection out of the pool, waiting on a semaphore when every connection is
//! busy, and return it when the guard drops.

use crate::error::{Error, Result};
use crate::executor::QueryExecutor;
use crate::functions;
use crate::migration::MigrationManager;
use crate::record::{Param, Record};

use async_trait::async_trait;
use rusqlite::{OpenFlags, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use teamskills_core::DatabaseConfig;
use teamskills_core::config::MAX_POOL_SIZE;
use tokio::sync::{OwnedSemaphorePermit, RwLock, Semaphore};
use tokio_rusqlite::Connection;
use tracing::instrument;

struct Pool {
    permits: Arc<Semaphore>,
    idle: Mutex<Vec<Arc<Connection>>>,
}

impl Pool {
    async fn checkout(self: &Arc<Self>) -> Result<PooledConnection> {
        let permit = self.permits.clone().acquire_owned().await.map_err(|_| Error::NotConnected)?;
        let conn = self
            .idle
            .lock()
            .map_err(|_| Error::database("connection pool lock poisoned"))?
            .pop()
            .ok_or(Error::NotConnected)?;
        Ok(PooledConnection { conn, pool: Arc::clone(self), _permit: permit })
    }
}

/// A checked-out connection, returned to the pool on drop
struct PooledConnection {
    conn: Arc<Connection>,
    pool: Arc<Pool>,
    _permit: OwnedSemaphorePermit,
}

impl std::ops::Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Ok(mut idle) = self.pool.idle.lock() {
            idle.push(Arc::clone(&self.conn));
        }
    }
}

/// Handle to the skills database
pub struct Database {
    path: PathBuf,
    pool_size: usize,
    pool: RwLock<Option<Arc<Pool>>>,
}

impl Database {
    /// Create an unconnected handle
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            path: config.path.clone(),
            pool_size: config.pool_size.clamp(1, MAX_POOL_SIZE),
            pool: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Open the pool. Calling this while already connected is a no-op.
    ///
    /// Fails if the file cannot be opened or is missing any required table.
    #[instrument(skip(self), fields(db_path = %self.path.display(), pool_size = self.pool_size))]
    pub async fn connect(&self) -> Result<()> {
        let mut guard = self.pool.write().await;
        if guard.is_some() {
            tracing::debug!("Database already connected");
            return Ok(());
        }

        tracing::info!("Opening {} read-only connections to {}", self.pool_size, self.path.display());

        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX | OpenFlags::SQLITE_OPEN_URI;
        let mut connections = Vec::with_capacity(self.pool_size);
        for _ in 0..self.pool_size {
            let conn = Connection::open_with_flags(&self.path, flags)
                .await
                .map_err(|e| Error::database(format!("Failed to open database: {e}")))?;
            conn.call(|conn| functions::register(conn)).await?;
            connections.push(Arc::new(conn));
        }

        if let Some(first) = connections.first() {
            let missing = first
                .call(|conn| {
                    MigrationManager::missing_tables(conn)
                        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
                })
                .await?;
            if !missing.is_empty() {
                return Err(Error::database(format!(
                    "Schema is missing tables: {} (run `teamskills init`)",
                    missing.join(", ")
                )));
            }
        }

        *guard = Some(Arc::new(Pool {
            permits: Arc::new(Semaphore::new(self.pool_size)),
            idle: Mutex::new(connections),
        }));

        tracing::info!("Database connected");
        Ok(())
    }

    /// Close the pool. Calling this while disconnected is a no-op.
    ///
    /// Connections that are checked out close once their query finishes.
    #[instrument(skip(self), fields(db_path = %self.path.display()))]
    pub async fn disconnect(&self) {
        let Some(pool) = self.pool.write().await.take() else {
            tracing::debug!("Database already disconnected");
            return;
        };

        pool.permits.close();
        let idle = match pool.idle.lock() {
            Ok(mut idle) => std::mem::take(&mut *idle),
            Err(_) => Vec::new(),
        };

        for conn in idle {
            if let Ok(conn) = Arc::try_unwrap(conn)
                && let Err(e) = conn.close().await
            {
                tracing::warn!(error = %e, "Failed to close connection cleanly");
            }
        }

        tracing::info!("Database disconnected");
    }

    async fn checkout(&self) -> Result<PooledConnection> {
        let pool = self.pool.read().await.clone().ok_or(Error::NotConnected)?;
        pool.checkout().await
    }
}

#[async_trait]
impl QueryExecutor for Database {
    #[instrument(skip(self, params), fields(params = params.len()))]
    async fn try_fetch_all(&self, sql: &str, params: &[Param]) -> Result<Vec<Record>> {
        tracing::trace!(sql, "fetch_all");
        let conn = self.checkout().await?;
        let sql = sql.to_owned();
        let params = params.to_vec();

        let rows = conn
            .call(move |conn| {
                let mut stmt = conn.prepare_cached(&sql)?;
                let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_owned).collect();
                let rows = stmt
                    .query_map(rusqlite::params_from_iter(params.iter()), |row| Record::from_row(row, &columns))?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok::<_, rusqlite::Error>(rows)
            })
            .await?;

        tracing::debug!("Query returned {} rows", rows.len());
        Ok(rows)
    }

    #[instrument(skip(self, params), fields(params = params.len()))]
    async fn try_fetch_one(&self, sql: &str, params: &[Param]) -> Result<Option<Record>> {
        tracing::trace!(sql, "fetch_one");
        let conn = self.checkout().await?;
        let sql = sql.to_owned();
        let params = params.to_vec();

        let row = conn
            .call(move |conn| {
                let mut stmt = conn.prepare_cached(&sql)?;
                let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_owned).collect();
                let row = stmt
                    .query_row(rusqlite::params_from_iter(params.iter()), |row| Record::from_row(row, &columns))
                    .optional()?;
                Ok::<_, rusqlite::Error>(row)
            })
            .await?;

        Ok(row)
    }

    async fn is_connected(&self) -> bool {
        self.pool.read().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::bootstrap;
    use serde_json::Value;
    use tempfile::TempDir;
    use tokio_test::{assert_err, assert_ok};

    async fn seeded(pool_size: usize) -> (TempDir, Database) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("skills.db");
        bootstrap(&db_path).await.unwrap();

        let conn = rusqlite::Connection::open(&db_path).unwrap();
        conn.execute_batch(
            "INSERT INTO users (id, name, role, team) VALUES (1, 'Alice', 'Engineer', 'Platform');
             INSERT INTO users (id, name) VALUES (2, 'Bob');
             INSERT INTO skills (id, name) VALUES (1, 'Rust');
             INSERT INTO user_skills (user_id, skill_id, proficiency_level) VALUES (1, 1, 'L400');",
        )
        .unwrap();
        drop(conn);

        let db = Database::new(&DatabaseConfig { path: db_path, pool_size });
        (temp_dir, db)
    }

    #[tokio::test]
    async fn test_not_connected_until_connect() {
        let (_dir, db) = seeded(2).await;
        assert!(!db.is_connected().await);

        let err = db.try_fetch_all("SELECT 1", &[]).await.unwrap_err();
        assert!(matches!(err, Error::NotConnected));
        assert!(db.fetch_all("SELECT 1", &[]).await.is_empty());
        assert!(db.fetch_one("SELECT 1", &[]).await.is_none());
    }

    #[tokio::test]
    async fn test_connect_and_query() {
        let (_dir, db) = seeded(2).await;
        db.connect().await.unwrap();
        assert!(db.is_connected().await);

        let rows = db.try_fetch_all("SELECT id, name, team FROM users ORDER BY id", &[]).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("name"), Some(&Value::from("Alice")));
        assert_eq!(rows[1].get("team"), Some(&Value::Null));

        let one = db.try_fetch_one("SELECT name FROM users WHERE id = ?1", &[Param::from(2i64)]).await.unwrap();
        assert_eq!(one.unwrap().get("name"), Some(&Value::from("Bob")));

        let none = db.try_fetch_one("SELECT name FROM users WHERE id = ?1", &[Param::from(99i64)]).await.unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_pooled_connections_fold_unicode() {
        let (_dir, db) = seeded(2).await;
        db.connect().await.unwrap();

        let sql = format!("SELECT {}('ÉLIXIR') AS folded", crate::functions::UNICODE_LOWER);
        let row = assert_ok!(db.try_fetch_one(&sql, &[]).await).unwrap();
        assert_eq!(row.get("folded"), Some(&Value::from("élixir")));
    }

    #[tokio::test]
    async fn test_connect_is_idempotent() {
        let (_dir, db) = seeded(1).await;
        assert_ok!(db.connect().await);
        assert_ok!(db.connect().await);
        assert_eq!(db.fetch_all("SELECT id FROM users", &[]).await.len(), 2);
    }

    #[tokio::test]
    async fn test_disconnect_degrades() {
        let (_dir, db) = seeded(2).await;
        db.connect().await.unwrap();
        db.disconnect().await;
        assert!(!db.is_connected().await);
        assert!(db.fetch_all("SELECT id FROM users", &[]).await.is_empty());

        db.disconnect().await;
        db.connect().await.unwrap();
        assert_eq!(db.fetch_all("SELECT id FROM users", &[]).await.len(), 2);
    }

    #[tokio::test]
    async fn test_sql_error_is_typed_and_degrades() {
        let (_dir, db) = seeded(1).await;
        db.connect().await.unwrap();
        assert_err!(db.try_fetch_all("SELECT * FROM nowhere", &[]).await);
        assert!(db.fetch_all("SELECT * FROM nowhere", &[]).await.is_empty());

        // The connection went back to the pool despite the error
        assert_eq!(db.fetch_all("SELECT id FROM users", &[]).await.len(), 2);
    }

    #[tokio::test]
    async fn test_pool_is_read_only() {
        let (_dir, db) = seeded(1).await;
        db.connect().await.unwrap();
        assert_err!(db.try_fetch_all("INSERT INTO users (name) VALUES ('Mallory') RETURNING id", &[]).await);
    }

    #[tokio::test]
    async fn test_concurrent_queries_share_small_pool() {
        let (_dir, db) = seeded(2).await;
        db.connect().await.unwrap();
        let db = Arc::new(db);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let db = Arc::clone(&db);
            handles.push(tokio::spawn(async move { db.fetch_all("SELECT id FROM users", &[]).await.len() }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), 2);
        }
    }

    #[tokio::test]
    async fn test_connect_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(&DatabaseConfig { path: temp_dir.path().join("absent.db"), pool_size: 1 });
        assert!(db.connect().await.is_err());
        assert!(!db.is_connected().await);
    }

    #[tokio::test]
    async fn test_connect_rejects_missing_schema() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("empty.db");
        rusqlite::Connection::open(&db_path).unwrap().execute_batch("CREATE TABLE other (id INTEGER)").unwrap();

        let db = Database::new(&DatabaseConfig { path: db_path, pool_size: 1 });
        let err = db.connect().await.unwrap_err();
        assert!(err.to_string().contains("missing tables"));
    }

    #[test]
    fn test_pool_size_is_clamped() {
        let db = Database::new(&DatabaseConfig { path: PathBuf::from("x.db"), pool_size: 50 });
        assert_eq!(db.pool_size(), MAX_POOL_SIZE);
    }
}
