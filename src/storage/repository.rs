//! SQLite repository for settings, cached races and predictions

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::credentials::{ApiCredentials, CredentialProvider};
use super::schema::create_tables;
use crate::ergast::Race;

const SETTINGS_ID: i64 = 1;

/// The stored settings row
#[derive(Debug, Clone)]
pub struct StoredSettings {
    pub credentials: ApiCredentials,
    pub created_at: String,
    pub updated_at: String,
}

/// Race descriptor to cache
#[derive(Debug, Clone)]
pub struct NewRace {
    pub season: i32,
    pub round_number: u32,
    pub race_name: String,
    pub circuit_name: String,
    pub race_date: Option<NaiveDate>,
    pub data: Value,
}

impl TryFrom<&Race> for NewRace {
    type Error = anyhow::Error;

    fn try_from(race: &Race) -> Result<Self> {
        Ok(Self {
            season: race
                .season
                .parse()
                .with_context(|| format!("Invalid season '{}'", race.season))?,
            round_number: race
                .round
                .parse()
                .with_context(|| format!("Invalid round '{}'", race.round))?,
            race_name: race.race_name.clone(),
            circuit_name: race.circuit.circuit_name.clone(),
            race_date: race
                .date
                .as_deref()
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
            data: serde_json::to_value(race)?,
        })
    }
}

/// Cached race row
#[derive(Debug, Clone, Serialize)]
pub struct StoredRace {
    pub id: i64,
    pub season: i32,
    pub round_number: u32,
    pub race_name: String,
    pub circuit_name: String,
    pub race_date: Option<NaiveDate>,
    #[serde(skip)]
    pub data_json: Option<String>,
    pub created_at: String,
}

impl StoredRace {
    /// Decoded race JSON, if any was stored and it parses.
    pub fn race_data(&self) -> Option<Value> {
        self.data_json
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }
}

/// Prediction row to insert
#[derive(Debug, Clone)]
pub struct NewPrediction {
    pub race_id: i64,
    pub driver_name: String,
    pub predicted_position: Option<i64>,
    pub confidence_score: Option<f64>,
    pub prediction_data: Value,
}

/// Stored prediction row
#[derive(Debug, Clone, Serialize)]
pub struct StoredPrediction {
    pub id: i64,
    pub race_id: i64,
    pub driver_name: String,
    pub predicted_position: Option<i64>,
    pub confidence_score: Option<f64>,
    pub prediction_data: Option<Value>,
    pub created_at: String,
}

/// Repository over a single SQLite connection
pub struct Repository {
    conn: Mutex<Connection>,
}

impl Repository {
    /// Create a new repository, initializing the database if needed
    pub fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create database directory")?;
        }

        let conn = Connection::open(db_path).context("Failed to open database")?;
        Self::from_connection(conn)
    }

    /// Create an in-memory repository
    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        create_tables(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| anyhow!("Database connection poisoned: {}", e))
    }

    // ==================== Settings ====================

    pub fn get_settings(&self) -> Result<Option<StoredSettings>> {
        let conn = self.conn()?;
        let settings = conn
            .query_row(
                r#"
                SELECT gemini_api_key, groq_api_key, created_at, updated_at
                FROM api_settings WHERE id = ?1
                "#,
                [SETTINGS_ID],
                |row| {
                    Ok(StoredSettings {
                        credentials: ApiCredentials {
                            gemini_api_key: row.get(0)?,
                            groq_api_key: row.get(1)?,
                        },
                        created_at: row.get(2)?,
                        updated_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(settings)
    }

    /// Create the settings row on first save, update it afterwards.
    pub fn save_settings(&self, gemini_api_key: &str, groq_api_key: &str) -> Result<()> {
        self.conn()?.execute(
            r#"
            INSERT INTO api_settings (id, gemini_api_key, groq_api_key)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                gemini_api_key = excluded.gemini_api_key,
                groq_api_key = excluded.groq_api_key,
                updated_at = datetime('now')
            "#,
            params![SETTINGS_ID, gemini_api_key, groq_api_key],
        )?;
        Ok(())
    }

    // ==================== Races ====================

    /// Insert a race and return its id
    pub fn insert_race(&self, race: &NewRace) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO f1_data
            (season, round_number, race_name, circuit_name, race_date, data_json)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                race.season,
                race.round_number,
                race.race_name,
                race.circuit_name,
                race.race_date.map(|d| d.to_string()),
                race.data.to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_race(&self, id: i64) -> Result<Option<StoredRace>> {
        let conn = self.conn()?;
        let race = conn
            .query_row(
                &format!("{} WHERE id = ?1", RACE_COLUMNS),
                [id],
                map_race,
            )
            .optional()?;
        Ok(race)
    }

    /// Earliest cached row for a season/round, if any
    pub fn find_race(&self, season: i32, round_number: u32) -> Result<Option<StoredRace>> {
        let conn = self.conn()?;
        let race = conn
            .query_row(
                &format!(
                    "{} WHERE season = ?1 AND round_number = ?2 ORDER BY id LIMIT 1",
                    RACE_COLUMNS
                ),
                params![season, round_number],
                map_race,
            )
            .optional()?;
        Ok(race)
    }

    pub fn list_races(&self) -> Result<Vec<StoredRace>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY season DESC, round_number DESC, id",
            RACE_COLUMNS
        ))?;
        let races = stmt
            .query_map([], map_race)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(races)
    }

    // ==================== Predictions ====================

    pub fn insert_prediction(&self, prediction: &NewPrediction) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO predictions
            (race_id, driver_name, predicted_position, confidence_score, prediction_data)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                prediction.race_id,
                prediction.driver_name,
                prediction.predicted_position,
                prediction.confidence_score,
                prediction.prediction_data.to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_predictions(&self, race_id: i64) -> Result<Vec<StoredPrediction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, race_id, driver_name, predicted_position, confidence_score,
                   prediction_data, created_at
            FROM predictions
            WHERE race_id = ?1
            ORDER BY id
            "#,
        )?;

        let predictions = stmt
            .query_map([race_id], |row| {
                let data: Option<String> = row.get(5)?;
                Ok(StoredPrediction {
                    id: row.get(0)?,
                    race_id: row.get(1)?,
                    driver_name: row.get(2)?,
                    predicted_position: row.get(3)?,
                    confidence_score: row.get(4)?,
                    prediction_data: data.and_then(|raw| serde_json::from_str(&raw).ok()),
                    created_at: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(predictions)
    }
}

const RACE_COLUMNS: &str = r#"
    SELECT id, season, round_number, race_name, circuit_name, race_date, data_json, created_at
    FROM f1_data
"#;

fn map_race(row: &Row<'_>) -> rusqlite::Result<StoredRace> {
    let date: Option<String> = row.get(5)?;
    Ok(StoredRace {
        id: row.get(0)?,
        season: row.get(1)?,
        round_number: row.get(2)?,
        race_name: row.get(3)?,
        circuit_name: row.get(4)?,
        race_date: date.and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        data_json: row.get(6)?,
        created_at: row.get(7)?,
    })
}

impl CredentialProvider for Repository {
    fn credentials(&self) -> Result<Option<ApiCredentials>> {
        Ok(self.get_settings()?.map(|s| s.credentials))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_test_race() -> NewRace {
        NewRace {
            season: 2024,
            round_number: 8,
            race_name: "Monaco Grand Prix".to_string(),
            circuit_name: "Circuit de Monaco".to_string(),
            race_date: NaiveDate::from_ymd_opt(2024, 5, 26),
            data: json!({"raceName": "Monaco Grand Prix", "round": "8"}),
        }
    }

    #[test]
    fn test_settings_upsert_keeps_single_row() {
        let repo = Repository::in_memory().unwrap();
        assert!(repo.get_settings().unwrap().is_none());
        assert!(repo.credentials().unwrap().is_none());

        repo.save_settings("AIza-first", "").unwrap();
        repo.save_settings("AIza-second", "gsk_key").unwrap();

        let settings = repo.get_settings().unwrap().unwrap();
        assert_eq!(settings.credentials.primary(), Some("AIza-second"));
        assert_eq!(settings.credentials.secondary(), Some("gsk_key"));

        let count: i64 = repo
            .conn()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM api_settings", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_settings_update_keeps_created_at() {
        let repo = Repository::in_memory().unwrap();
        repo.save_settings("AIza-first", "").unwrap();
        let first = repo.get_settings().unwrap().unwrap();
        assert_eq!(first.created_at, first.updated_at);

        let earlier = "2020-01-01 00:00:00";
        repo.conn()
            .unwrap()
            .execute(
                "UPDATE api_settings SET created_at = ?1, updated_at = ?1",
                [earlier],
            )
            .unwrap();

        repo.save_settings("AIza-second", "gsk_key").unwrap();
        let second = repo.get_settings().unwrap().unwrap();
        assert_eq!(second.created_at, earlier);
        assert!(second.updated_at.as_str() > earlier);
        assert_eq!(second.credentials.primary(), Some("AIza-second"));
    }

    #[test]
    fn test_insert_and_get_race() {
        let repo = Repository::in_memory().unwrap();
        let id = repo.insert_race(&create_test_race()).unwrap();

        let race = repo.get_race(id).unwrap().unwrap();
        assert_eq!(race.race_name, "Monaco Grand Prix");
        assert_eq!(race.race_date, NaiveDate::from_ymd_opt(2024, 5, 26));
        assert_eq!(race.race_data().unwrap()["round"], "8");

        assert!(repo.get_race(id + 100).unwrap().is_none());
        assert_eq!(repo.find_race(2024, 8).unwrap().unwrap().id, id);
        assert!(repo.find_race(2024, 9).unwrap().is_none());
        assert_eq!(repo.list_races().unwrap().len(), 1);
    }

    #[test]
    fn test_predictions_roundtrip() {
        let repo = Repository::in_memory().unwrap();
        let race_id = repo.insert_race(&create_test_race()).unwrap();

        for (position, driver) in ["Charles Leclerc", "Oscar Piastri"].iter().enumerate() {
            repo.insert_prediction(&NewPrediction {
                race_id,
                driver_name: driver.to_string(),
                predicted_position: Some(position as i64 + 1),
                confidence_score: Some(0.8),
                prediction_data: json!({"driver": driver}),
            })
            .unwrap();
        }

        let stored = repo.get_predictions(race_id).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].driver_name, "Charles Leclerc");
        assert_eq!(stored[1].predicted_position, Some(2));
        assert_eq!(
            stored[1].prediction_data,
            Some(json!({"driver": "Oscar Piastri"}))
        );
    }

    #[test]
    fn test_prediction_requires_existing_race() {
        let repo = Repository::in_memory().unwrap();
        let result = repo.insert_prediction(&NewPrediction {
            race_id: 42,
            driver_name: "Nobody".to_string(),
            predicted_position: None,
            confidence_score: None,
            prediction_data: json!({}),
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_new_race_from_ergast_record() {
        let race: Race = serde_json::from_value(json!({
            "season": "2024",
            "round": "8",
            "raceName": "Monaco Grand Prix",
            "Circuit": {"circuitId": "monaco", "circuitName": "Circuit de Monaco"},
            "date": "2024-05-26"
        }))
        .unwrap();

        let new_race = NewRace::try_from(&race).unwrap();
        assert_eq!(new_race.season, 2024);
        assert_eq!(new_race.round_number, 8);
        assert_eq!(new_race.circuit_name, "Circuit de Monaco");
        assert_eq!(new_race.data["raceName"], "Monaco Grand Prix");
    }
}
