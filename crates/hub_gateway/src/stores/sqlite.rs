//! SqliteHubGateway - stores classified records in a local SQLite file

use std::fs;
use std::path::{Path, PathBuf};

use contracts::{Accelerometer, ClassifiedRecord, Gps, PersistenceGateway, RoadState, SensorSample};
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, error, info, instrument};

use crate::error::{HubError, Result};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS agent_data (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    road_state TEXT NOT NULL,
    x REAL NOT NULL,
    y REAL NOT NULL,
    z REAL NOT NULL,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    timestamp TEXT NOT NULL
)";

const UPSERT: &str = "INSERT OR REPLACE INTO agent_data
    (id, road_state, x, y, z, latitude, longitude, timestamp)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

const SELECT_COLUMNS: &str =
    "SELECT id, road_state, x, y, z, latitude, longitude, timestamp FROM agent_data";

/// Raw column values of one `agent_data` row
type Row = (i64, String, f64, f64, f64, f64, f64, String);

/// Persistence gateway backed by SQLite
///
/// Records without an id get a fresh row; records with an id replace
/// the row with that id.
pub struct SqliteHubGateway {
    name: String,
    path: Option<PathBuf>,
    conn: Option<Connection>,
}

impl SqliteHubGateway {
    /// Open (or create) the database file and ensure the table exists
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let store = Self::with_connection(conn, Some(path.to_path_buf()))?;
        info!(path = %path.display(), "sqlite hub opened");
        Ok(store)
    }

    /// Private in-memory database
    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, None)
    }

    fn with_connection(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.execute(CREATE_TABLE, [])?;
        Ok(Self {
            name: "sqlite".to_string(),
            path,
            conn: Some(conn),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn
            .as_ref()
            .ok_or_else(|| HubError::Closed(self.name.clone()))
    }

    /// Insert or replace a record, returning the row id it was stored under
    pub fn upsert(&self, record: &ClassifiedRecord) -> Result<i64> {
        let conn = self.conn()?;
        let sample = &record.sample;
        conn.execute(
            UPSERT,
            rusqlite::params![
                record.id,
                record.road_state.as_str(),
                sample.accelerometer.x,
                sample.accelerometer.y,
                sample.accelerometer.z,
                sample.gps.latitude,
                sample.gps.longitude,
                contracts::timestamp::format(&sample.timestamp),
            ],
        )?;
        Ok(record.id.unwrap_or_else(|| conn.last_insert_rowid()))
    }

    /// Fetch one record by id
    pub fn get(&self, id: i64) -> Result<Option<ClassifiedRecord>> {
        let row = self
            .conn()?
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                [id],
                read_row,
            )
            .optional()?;
        row.map(into_record).transpose()
    }

    /// Most recent records, newest first
    pub fn recent(&self, limit: usize) -> Result<Vec<ClassifiedRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY id DESC LIMIT ?1"))?;
        let rows = stmt.query_map([limit as i64], read_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(into_record(row?)?);
        }
        Ok(records)
    }

    /// Number of stored records
    pub fn count(&self) -> Result<u64> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM agent_data", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Row> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn into_record(row: Row) -> Result<ClassifiedRecord> {
    let (id, road_state, x, y, z, latitude, longitude, timestamp) = row;
    let road_state = road_state
        .parse::<RoadState>()
        .map_err(|e| HubError::corrupt(id, e.to_string()))?;
    let timestamp = contracts::timestamp::parse(&timestamp)
        .map_err(|e| HubError::corrupt(id, format!("invalid timestamp: {e}")))?;

    let sample = SensorSample::new(
        Accelerometer { x, y, z },
        Gps {
            latitude,
            longitude,
        },
        timestamp,
    );
    Ok(ClassifiedRecord::new(road_state, sample).with_id(id))
}

impl PersistenceGateway for SqliteHubGateway {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "sqlite_hub_save",
        skip(self, record),
        fields(road_state = %record.road_state)
    )]
    async fn save(&mut self, record: &ClassifiedRecord) -> bool {
        match self.upsert(record) {
            Ok(id) => {
                debug!(record_id = id, "record stored");
                true
            }
            Err(e) => {
                error!(store = %self.name, error = %e, "failed to store record");
                false
            }
        }
    }

    #[instrument(name = "sqlite_hub_close", skip(self))]
    async fn close(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        if let Err((_, e)) = conn.close() {
            error!(store = %self.name, error = %e, "failed to close database");
        } else {
            info!(store = %self.name, "sqlite hub closed");
        }
    }
}
