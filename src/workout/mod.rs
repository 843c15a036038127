pub mod model;

pub use model::{ExerciseType, NewWorkout, ParseKindError, Workout, WorkoutId, WorkoutStatus};
