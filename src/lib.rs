pub mod calendar;
pub mod grid;
pub mod storage;
pub mod store;
pub mod workout;

pub use calendar::{WeekCalendar, WeekIndex};
pub use grid::{CellKey, CellView, WorkoutGrid};
pub use store::{StoreError, WorkoutClient, WorkoutStore};
pub use workout::{ExerciseType, NewWorkout, Workout, WorkoutId, WorkoutStatus};
