//! SQLite schema definitions
//!
//! Tables:
//! - api_settings: Singleton row of model API keys (id is always 1)
//! - f1_data: Cached race descriptors with the raw race JSON
//! - predictions: Per-driver predictions referencing f1_data

use rusqlite::{Connection, Result};

/// Create all tables in the database
pub fn create_tables(conn: &Connection) -> Result<()> {
    // The CHECK makes the settings row a true singleton
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS api_settings (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            gemini_api_key TEXT,
            groq_api_key TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
        [],
    )?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS f1_data (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            season INTEGER NOT NULL,
            round_number INTEGER NOT NULL,
            race_name TEXT NOT NULL,
            circuit_name TEXT NOT NULL,
            race_date TEXT,
            data_json TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
        [],
    )?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS predictions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            race_id INTEGER NOT NULL REFERENCES f1_data(id),
            driver_name TEXT NOT NULL,
            predicted_position INTEGER,
            confidence_score REAL,
            prediction_data TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_f1_data_season_round ON f1_data(season, round_number)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_predictions_race ON predictions(race_id)",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_create_tables() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();

        let count: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN
                 ('api_settings', 'f1_data', 'predictions')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_create_tables_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();
    }

    #[test]
    fn test_settings_singleton_enforced() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();

        conn.execute("INSERT INTO api_settings (id) VALUES (1)", [])
            .unwrap();
        assert!(conn
            .execute("INSERT INTO api_settings (id) VALUES (2)", [])
            .is_err());
    }
}
