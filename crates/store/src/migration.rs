//! Schema migration logic
//!
//! Tracks applied migrations and applies pending ones up to the current schema version.

use crate::error::{Error, Result};
use crate::schema::{REQUIRED_TABLES, SCHEMA_SQL, SCHEMA_VERSION};
use rusqlite::Connection;
use std::path::Path;
use tracing::{debug, info, instrument, trace};

/// Manages schema migrations for the skills database
pub struct MigrationManager;

impl MigrationManager {
    /// Get the current schema version from the database
    ///
    /// Returns 0 if the schema_version table doesn't exist or is empty.
    pub fn get_current_version(conn: &Connection) -> Result<i32> {
        if !Self::table_exists(conn, "schema_version")? {
            trace!("schema_version table does not exist, returning version 0");
            return Ok(0);
        }

        let version: Option<i32> = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
            .map_err(|e| Error::database(format!("Failed to query schema version: {e}")))?;

        Ok(version.unwrap_or(0))
    }

    /// Apply pending migrations up to SCHEMA_VERSION
    ///
    /// Idempotent.
    pub fn migrate(conn: &Connection) -> Result<()> {
        let current_version = Self::get_current_version(conn)?;
        debug!("Current schema version: {}, target: {}", current_version, SCHEMA_VERSION);

        if current_version >= SCHEMA_VERSION {
            trace!("Schema is up to date, no migration needed");
            return Ok(());
        }

        info!("Migrating schema from version {} to {}", current_version, SCHEMA_VERSION);

        if current_version == 0 {
            Self::apply_v1_migration(conn)?;
        }

        info!("Schema migration complete");
        Ok(())
    }

    /// Names of required tables that are missing
    pub fn missing_tables(conn: &Connection) -> Result<Vec<&'static str>> {
        let mut missing = Vec::new();
        for table in REQUIRED_TABLES {
            if !Self::table_exists(conn, table)? {
                missing.push(*table);
            }
        }
        Ok(missing)
    }

    fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1)",
            [name],
            |row| row.get(0),
        )
        .map_err(|e| Error::database(format!("Failed to check table {name}: {e}")))
    }

    fn apply_v1_migration(conn: &Connection) -> Result<()> {
        debug!("Applying v1 migration");

        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::database(format!("Failed to apply v1 schema: {e}")))?;

        trace!("v1 migration applied successfully");
        Ok(())
    }
}

/// Create the database file if needed and bring its schema up to date.
///
/// This is the only place the store opens a writable connection.
#[instrument(skip_all, fields(db_path = %db_path.display()))]
pub async fn bootstrap(db_path: &Path) -> Result<i32> {
    info!("Bootstrapping schema at {}", db_path.display());

    let conn = tokio_rusqlite::Connection::open(db_path)
        .await
        .map_err(|e| Error::database(format!("Failed to open database: {e}")))?;

    let version = conn
        .call(|conn| {
            MigrationManager::migrate(conn).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
            MigrationManager::get_current_version(conn)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
        })
        .await
        .map_err(|e| Error::database(format!("Migration failed: {e}")))?;

    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;
    use tempfile::TempDir;

    #[test]
    fn test_get_current_version_fresh_db() {
        let conn = Connection::open_in_memory().unwrap();
        let version = MigrationManager::get_current_version(&conn).unwrap();
        assert_eq!(version, 0);
    }

    #[test]
    fn test_migrate_applies_schema_and_sets_version() {
        let conn = Connection::open_in_memory().unwrap();
        MigrationManager::migrate(&conn).unwrap();

        let version = MigrationManager::get_current_version(&conn).unwrap();
        assert_eq!(version, SCHEMA_VERSION);
        assert!(MigrationManager::missing_tables(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        MigrationManager::migrate(&conn).unwrap();
        MigrationManager::migrate(&conn).unwrap();

        assert_eq!(MigrationManager::get_current_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_missing_tables_on_empty_db() {
        let conn = Connection::open_in_memory().unwrap();
        let missing = MigrationManager::missing_tables(&conn).unwrap();
        assert_eq!(missing, REQUIRED_TABLES.to_vec());
    }

    #[test]
    fn test_assignments_are_unique_per_user_and_skill() {
        let conn = Connection::open_in_memory().unwrap();
        MigrationManager::migrate(&conn).unwrap();
        conn.execute_batch(
            "INSERT INTO users (id, name) VALUES (1, 'Alice');
             INSERT INTO skills (id, name) VALUES (1, 'Rust');
             INSERT INTO user_skills (user_id, skill_id, proficiency_level) VALUES (1, 1, 'L300');",
        )
        .unwrap();

        let duplicate =
            conn.execute("INSERT INTO user_skills (user_id, skill_id, proficiency_level) VALUES (1, 1, 'L400')", []);
        assert!(duplicate.is_err());
    }

    #[tokio::test]
    async fn test_bootstrap_creates_file() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("skills.db");

        let version = bootstrap(&db_path).await.unwrap();
        assert_eq!(version, SCHEMA_VERSION);
        assert!(db_path.exists());

        let again = bootstrap(&db_path).await.unwrap();
        assert_eq!(again, SCHEMA_VERSION);
    }
}
