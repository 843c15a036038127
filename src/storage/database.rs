use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::store::{StoreError, WorkoutStore};
use crate::workout::{ExerciseType, NewWorkout, Workout, WorkoutId, WorkoutStatus};

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Invalid stored value in column {column}: {value}")]
    InvalidValue { column: &'static str, value: String },
    #[error("Failed to create database directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database connection lock poisoned")]
    Poisoned,
    #[error("Database task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<DatabaseError> for StoreError {
    fn from(e: DatabaseError) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

const WORKOUT_COLUMNS: &str =
    "id, title, description, date, status, exercise_type, duration_sec, distance_meters, load, created_at";

/// SQLite-backed workout store.
///
/// rusqlite is blocking, so every query runs on tokio's blocking pool with
/// the connection behind a std mutex.
pub struct SqliteWorkoutStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteWorkoutStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn: Arc::new(Mutex::new(conn)) }
    }

    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        create_schema(&conn)?;
        tracing::info!("Opened workout database at {}", path.display());
        Ok(Self::new(conn))
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        create_schema(&conn)?;
        Ok(Self::new(conn))
    }

    async fn with_conn<T, F>(&self, work: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| DatabaseError::Poisoned)?;
            work(&conn)
        })
        .await?
    }

    /// Creates the schema. Safe to call any number of times.
    pub async fn initialize(&self) -> Result<(), DatabaseError> {
        self.with_conn(create_schema).await
    }

    pub async fn table_exists(&self, table_name: &str) -> bool {
        let name = table_name.to_string();
        let count = self
            .with_conn(move |conn| {
                let count: i32 = conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [name],
                    |row| row.get(0),
                )?;
                Ok(count)
            })
            .await;
        count.unwrap_or(0) > 0
    }

    fn load(conn: &Connection, id: WorkoutId) -> Result<Option<Workout>, DatabaseError> {
        let sql = format!("SELECT {WORKOUT_COLUMNS} FROM workouts WHERE id = ?1");
        let raw = conn.query_row(&sql, [id], RawWorkout::from_row).optional()?;
        raw.map(RawWorkout::into_workout).transpose()
    }
}

fn create_schema(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS workouts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT,
            date TEXT NOT NULL,
            status TEXT NOT NULL,
            exercise_type TEXT NOT NULL,
            duration_sec INTEGER NOT NULL DEFAULT 0,
            distance_meters INTEGER NOT NULL DEFAULT 0,
            load REAL NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_workouts_date ON workouts (date)",
        [],
    )?;

    Ok(())
}

/// Column values as stored, before parsing the text columns.
struct RawWorkout {
    id: WorkoutId,
    title: String,
    description: Option<String>,
    date: String,
    status: String,
    exercise_type: String,
    duration_sec: u32,
    distance_meters: u32,
    load: f64,
    created_at: String,
}

impl RawWorkout {
    fn from_row(row: &Row<'_>) -> SqliteResult<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            date: row.get(3)?,
            status: row.get(4)?,
            exercise_type: row.get(5)?,
            duration_sec: row.get(6)?,
            distance_meters: row.get(7)?,
            load: row.get(8)?,
            created_at: row.get(9)?,
        })
    }

    fn into_workout(self) -> Result<Workout, DatabaseError> {
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .map_err(|_| DatabaseError::InvalidValue { column: "date", value: self.date.clone() })?;
        let status: WorkoutStatus = self.status.parse()
            .map_err(|_| DatabaseError::InvalidValue { column: "status", value: self.status.clone() })?;
        let exercise_type: ExerciseType = self.exercise_type.parse()
            .map_err(|_| DatabaseError::InvalidValue {
                column: "exercise_type",
                value: self.exercise_type.clone(),
            })?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| DatabaseError::InvalidValue {
                column: "created_at",
                value: self.created_at.clone(),
            })?;

        Ok(Workout {
            id: self.id,
            title: self.title,
            description: self.description,
            date,
            status,
            exercise_type,
            duration_sec: self.duration_sec,
            distance_meters: self.distance_meters,
            load: self.load,
            created_at,
        })
    }
}

#[async_trait]
impl WorkoutStore for SqliteWorkoutStore {
    async fn list(&self) -> Result<Vec<Workout>, StoreError> {
        let workouts = self
            .with_conn(|conn| {
                let sql = format!("SELECT {WORKOUT_COLUMNS} FROM workouts ORDER BY date DESC, id DESC");
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map([], RawWorkout::from_row)?;

                let mut workouts = Vec::new();
                for raw in rows {
                    workouts.push(raw?.into_workout()?);
                }
                Ok(workouts)
            })
            .await?;
        Ok(workouts)
    }

    async fn create(&self, input: NewWorkout) -> Result<Workout, StoreError> {
        let (id, created) = self
            .with_conn(move |conn| {
                let created_at = Utc::now();
                conn.execute(
                    "INSERT INTO workouts (title, description, date, status, exercise_type,
                                           duration_sec, distance_meters, load, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        &input.title,
                        &input.description,
                        input.date.format("%Y-%m-%d").to_string(),
                        input.status.as_str(),
                        input.exercise_type.as_str(),
                        input.duration_sec,
                        input.distance_meters,
                        input.load.max(0.0),
                        created_at.to_rfc3339(),
                    ],
                )?;

                let id = conn.last_insert_rowid();
                Ok((id, Self::load(conn, id)?))
            })
            .await?;
        created.ok_or(StoreError::NotFound(id))
    }

    async fn update(&self, workout: Workout) -> Result<Workout, StoreError> {
        let id = workout.id;
        let updated = self
            .with_conn(move |conn| {
                let changed = conn.execute(
                    "UPDATE workouts SET title = ?2, description = ?3, date = ?4, status = ?5,
                            exercise_type = ?6, duration_sec = ?7, distance_meters = ?8, load = ?9
                     WHERE id = ?1",
                    params![
                        workout.id,
                        &workout.title,
                        &workout.description,
                        workout.date.format("%Y-%m-%d").to_string(),
                        workout.status.as_str(),
                        workout.exercise_type.as_str(),
                        workout.duration_sec,
                        workout.distance_meters,
                        workout.load.max(0.0),
                    ],
                )?;

                if changed == 0 {
                    return Ok(None);
                }
                Self::load(conn, workout.id)
            })
            .await?;
        updated.ok_or(StoreError::NotFound(id))
    }

    async fn delete(&self, id: WorkoutId) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM workouts WHERE id = ?1", [id])?;
            Ok(())
        })
        .await?;
        Ok(())
    }
}

static SHARED_STORE: OnceCell<Arc<SqliteWorkoutStore>> = OnceCell::const_new();

/// Process-wide store handle. The first call opens the database at `path`
/// and creates the schema; later calls return the same handle.
pub async fn shared_store(path: &Path) -> Result<Arc<SqliteWorkoutStore>, DatabaseError> {
    let store = SHARED_STORE
        .get_or_try_init(|| async {
            let store = SqliteWorkoutStore::open(path)?;
            Ok::<_, DatabaseError>(Arc::new(store))
        })
        .await?;
    Ok(Arc::clone(store))
}
