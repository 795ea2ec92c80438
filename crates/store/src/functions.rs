//! SQL functions registered on every pooled connection

use rusqlite::Connection;
use rusqlite::functions::FunctionFlags;

/// Unicode-aware lowercase; SQLite's built-in `LOWER` folds ASCII only
pub const UNICODE_LOWER: &str = "unicode_lower";

pub(crate) fn register(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        UNICODE_LOWER,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|s| s.to_lowercase())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folded(conn: &Connection, value: Option<&str>) -> Option<String> {
        conn.query_row(&format!("SELECT {UNICODE_LOWER}(?1)"), [value], |row| row.get(0)).unwrap()
    }

    #[test]
    fn test_folds_non_ascii() {
        let conn = Connection::open_in_memory().unwrap();
        register(&conn).unwrap();
        assert_eq!(folded(&conn, Some("Élixir")), Some("élixir".to_string()));
        assert_eq!(folded(&conn, Some("ÄRGER Straße")), Some("ärger straße".to_string()));
        assert_eq!(folded(&conn, None), None);
    }

    #[test]
    fn test_like_matches_after_folding() {
        let conn = Connection::open_in_memory().unwrap();
        register(&conn).unwrap();
        let hit: bool = conn
            .query_row(&format!("SELECT {UNICODE_LOWER}('ÉLIXIR') LIKE '%élix%'"), [], |row| row.get(0))
            .unwrap();
        assert!(hit);
    }
}
