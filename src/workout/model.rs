use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type WorkoutId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: WorkoutId,
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub status: WorkoutStatus,
    pub exercise_type: ExerciseType,
    pub duration_sec: u32,
    pub distance_meters: u32,
    pub load: f64,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when creating a workout. The store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWorkout {
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub status: WorkoutStatus,
    pub exercise_type: ExerciseType,
    pub duration_sec: u32,
    pub distance_meters: u32,
    pub load: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutStatus {
    Pending,
    Completed,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseType {
    Run,
    Walk,
    Cycle,
    Swim,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind}: {value}")]
pub struct ParseKindError {
    kind: &'static str,
    value: String,
}

impl WorkoutStatus {
    /// Status reached by pressing the status icon once.
    pub fn next(self) -> Self {
        match self {
            WorkoutStatus::Pending => WorkoutStatus::Completed,
            WorkoutStatus::Completed => WorkoutStatus::Error,
            WorkoutStatus::Error => WorkoutStatus::Pending,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkoutStatus::Pending => "pending",
            WorkoutStatus::Completed => "completed",
            WorkoutStatus::Error => "error",
        }
    }
}

impl fmt::Display for WorkoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkoutStatus {
    type Err = ParseKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "pending" => Ok(WorkoutStatus::Pending),
            "completed" => Ok(WorkoutStatus::Completed),
            "error" => Ok(WorkoutStatus::Error),
            _ => Err(ParseKindError { kind: "workout status", value: value.to_string() }),
        }
    }
}

impl ExerciseType {
    pub const ALL: [ExerciseType; 4] = [
        ExerciseType::Run,
        ExerciseType::Walk,
        ExerciseType::Cycle,
        ExerciseType::Swim,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ExerciseType::Run => "run",
            ExerciseType::Walk => "walk",
            ExerciseType::Cycle => "cycle",
            ExerciseType::Swim => "swim",
        }
    }
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseType {
    type Err = ParseKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "run" => Ok(ExerciseType::Run),
            "walk" => Ok(ExerciseType::Walk),
            "cycle" => Ok(ExerciseType::Cycle),
            "swim" => Ok(ExerciseType::Swim),
            _ => Err(ParseKindError { kind: "exercise type", value: value.to_string() }),
        }
    }
}

impl NewWorkout {
    /// A workout typed straight into an empty grid cell.
    pub fn from_cell(title: &str, date: NaiveDate) -> Self {
        Self {
            title: title.trim().to_string(),
            description: None,
            date,
            status: WorkoutStatus::Pending,
            exercise_type: ExerciseType::Run,
            duration_sec: 0,
            distance_meters: 0,
            load: 0.0,
        }
    }

    pub fn into_workout(self, id: WorkoutId, created_at: DateTime<Utc>) -> Workout {
        Workout {
            id,
            title: self.title,
            description: self.description,
            date: self.date,
            status: self.status,
            exercise_type: self.exercise_type,
            duration_sec: self.duration_sec,
            distance_meters: self.distance_meters,
            load: self.load.max(0.0),
            created_at,
        }
    }
}

impl Workout {
    pub fn date_key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    pub fn is_completed(&self) -> bool {
        self.status == WorkoutStatus::Completed
    }

    pub fn with_date(&self, date: NaiveDate) -> Self {
        Self { date, ..self.clone() }
    }

    pub fn with_status(&self, status: WorkoutStatus) -> Self {
        Self { status, ..self.clone() }
    }

    pub fn with_title(&self, title: &str) -> Self {
        Self { title: title.trim().to_string(), ..self.clone() }
    }
}
