use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::calendar::week_index::WeekIndex;
use crate::workout::{Workout, WorkoutStatus};

/// One (week, weekday) position in the grid. Renders as `"{week_index}-{day_index}"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub week_index: WeekIndex,
    pub day_index: u8,
}

impl CellKey {
    pub fn new(week_index: WeekIndex, day_index: u8) -> Self {
        Self { week_index, day_index }
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.week_index, self.day_index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid cell key: {0}")]
pub struct ParseCellKeyError(String);

impl FromStr for CellKey {
    type Err = ParseCellKeyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        // Week indices may be negative, so split on the last dash.
        let (week, day) = value
            .rsplit_once('-')
            .ok_or_else(|| ParseCellKeyError(value.to_string()))?;
        let week_index = week.parse().map_err(|_| ParseCellKeyError(value.to_string()))?;
        let day_index: u8 = day.parse().map_err(|_| ParseCellKeyError(value.to_string()))?;
        if day_index > 6 {
            return Err(ParseCellKeyError(value.to_string()));
        }
        Ok(Self { week_index, day_index })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellPhase {
    Input,
    /// A create for this cell is in flight. Shown as pending.
    Submitting,
    Pending,
    Completed,
    Error,
}

impl CellPhase {
    pub fn from_status(status: WorkoutStatus) -> Self {
        match status {
            WorkoutStatus::Pending => CellPhase::Pending,
            WorkoutStatus::Completed => CellPhase::Completed,
            WorkoutStatus::Error => CellPhase::Error,
        }
    }

    /// Status shown by the icon. `Input` has none.
    pub fn status(self) -> Option<WorkoutStatus> {
        match self {
            CellPhase::Input => None,
            CellPhase::Submitting | CellPhase::Pending => Some(WorkoutStatus::Pending),
            CellPhase::Completed => Some(WorkoutStatus::Completed),
            CellPhase::Error => Some(WorkoutStatus::Error),
        }
    }
}

/// Ephemeral state of a cell that is being edited or has no backing workout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellCardData {
    pub state: CellPhase,
    pub value: String,
    pub date: NaiveDate,
}

impl CellCardData {
    pub fn input(date: NaiveDate, value: impl Into<String>) -> Self {
        Self { state: CellPhase::Input, value: value.into(), date }
    }

    pub fn with_state(&self, state: CellPhase) -> Self {
        Self { state, ..self.clone() }
    }

    pub fn date_key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Keyed cell state with copy-on-write updates.
///
/// Every change produces a new map; untouched clones keep seeing the old
/// contents, and two maps can be compared by pointer.
#[derive(Debug, Clone, Default)]
pub struct CellEditMap {
    cells: Arc<HashMap<CellKey, CellCardData>>,
}

impl CellEditMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CellKey) -> Option<&CellCardData> {
        self.cells.get(key)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CellKey, &CellCardData)> {
        self.cells.iter()
    }

    pub fn with(&self, key: CellKey, data: CellCardData) -> Self {
        let mut cells = HashMap::clone(&self.cells);
        cells.insert(key, data);
        Self { cells: Arc::new(cells) }
    }

    pub fn without(&self, key: &CellKey) -> Self {
        if !self.cells.contains_key(key) {
            return self.clone();
        }
        let mut cells = HashMap::clone(&self.cells);
        cells.remove(key);
        Self { cells: Arc::new(cells) }
    }

    pub fn same_as(&self, other: &CellEditMap) -> bool {
        Arc::ptr_eq(&self.cells, &other.cells)
    }

    /// True while the cell holds typed text or an unsettled submission.
    pub fn is_mid_edit(&self, key: &CellKey) -> bool {
        matches!(
            self.cells.get(key).map(|c| c.state),
            Some(CellPhase::Input | CellPhase::Submitting)
        )
    }
}

/// What a grid cell displays, resolved from the edit map and the workout cache.
#[derive(Debug, Clone, PartialEq)]
pub enum CellView {
    Empty { date: NaiveDate },
    Editing { date: NaiveDate, value: String },
    Draft { date: NaiveDate, title: String, status: WorkoutStatus },
    Workout { workout: Workout, status: WorkoutStatus },
}

impl CellView {
    pub fn resolve(date: NaiveDate, edit: Option<&CellCardData>, backing: Option<&Workout>) -> Self {
        match (edit, backing) {
            (Some(card), _) if card.state == CellPhase::Input => CellView::Editing {
                date,
                value: card.value.clone(),
            },
            (Some(card), Some(workout)) => CellView::Workout {
                workout: workout.clone(),
                status: card.state.status().unwrap_or(workout.status),
            },
            (Some(card), None) => CellView::Draft {
                date,
                title: card.value.clone(),
                status: card.state.status().unwrap_or(WorkoutStatus::Pending),
            },
            (None, Some(workout)) => CellView::Workout {
                workout: workout.clone(),
                status: workout.status,
            },
            (None, None) => CellView::Empty { date },
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            CellView::Empty { .. } => None,
            CellView::Editing { value, .. } => Some(value),
            CellView::Draft { title, .. } => Some(title),
            CellView::Workout { workout, .. } => Some(&workout.title),
        }
    }

    pub fn status(&self) -> Option<WorkoutStatus> {
        match self {
            CellView::Draft { status, .. } | CellView::Workout { status, .. } => Some(*status),
            _ => None,
        }
    }
}
