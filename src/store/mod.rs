pub mod client;

use async_trait::async_trait;
use thiserror::Error;

use crate::workout::{NewWorkout, Workout, WorkoutId};

pub use client::{execute, WorkoutClient};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("Workout not found: {0}")]
    NotFound(WorkoutId),
    #[error("Workout store unavailable: {0}")]
    Unavailable(String),
}

/// A single store call, planned on the UI side and run on a background task.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCommand {
    Create(NewWorkout),
    Update(Workout),
    Delete(WorkoutId),
}

/// Async CRUD contract over persisted workouts.
///
/// `list` returns workouts ordered by date descending, then id descending.
/// `delete` of an id that does not exist succeeds.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkoutStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Workout>, StoreError>;

    async fn create(&self, input: NewWorkout) -> Result<Workout, StoreError>;

    async fn update(&self, workout: Workout) -> Result<Workout, StoreError>;

    async fn delete(&self, id: WorkoutId) -> Result<(), StoreError>;
}

/// Sorts workouts into the order `WorkoutStore::list` promises.
pub fn sort_store_order(workouts: &mut [Workout]) {
    workouts.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
}
