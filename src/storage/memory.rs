use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;

use crate::store::{sort_store_order, StoreError, WorkoutStore};
use crate::workout::{NewWorkout, Workout, WorkoutId};

/// Volatile store used for `--sample` sessions and tests.
#[derive(Default)]
pub struct InMemoryWorkoutStore {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    next_id: WorkoutId,
    workouts: Vec<Workout>,
}

impl InMemoryWorkoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workouts(inputs: impl IntoIterator<Item = NewWorkout>) -> Self {
        let store = Self::new();
        if let Ok(mut state) = store.state.lock() {
            for input in inputs {
                state.insert(input);
            }
        }
        store
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory store poisoned".to_string()))
    }
}

impl MemoryState {
    fn insert(&mut self, input: NewWorkout) -> Workout {
        self.next_id += 1;
        let workout = input.into_workout(self.next_id, Utc::now());
        self.workouts.push(workout.clone());
        workout
    }
}

#[async_trait]
impl WorkoutStore for InMemoryWorkoutStore {
    async fn list(&self) -> Result<Vec<Workout>, StoreError> {
        let mut workouts = self.lock()?.workouts.clone();
        sort_store_order(&mut workouts);
        Ok(workouts)
    }

    async fn create(&self, input: NewWorkout) -> Result<Workout, StoreError> {
        Ok(self.lock()?.insert(input))
    }

    async fn update(&self, workout: Workout) -> Result<Workout, StoreError> {
        let mut state = self.lock()?;
        let slot = state
            .workouts
            .iter_mut()
            .find(|w| w.id == workout.id)
            .ok_or(StoreError::NotFound(workout.id))?;
        *slot = Workout { created_at: slot.created_at, ..workout };
        Ok(slot.clone())
    }

    async fn delete(&self, id: WorkoutId) -> Result<(), StoreError> {
        self.lock()?.workouts.retain(|w| w.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[tokio::test]
    async fn ids_are_unique_and_increasing() {
        let store = InMemoryWorkoutStore::new();
        let a = store.create(NewWorkout::from_cell("A", date(2026, 1, 1))).await.unwrap();
        let b = store.create(NewWorkout::from_cell("B", date(2026, 1, 1))).await.unwrap();

        assert!(b.id > a.id);
    }

    #[tokio::test]
    async fn update_keeps_creation_timestamp() {
        let store = InMemoryWorkoutStore::with_workouts([NewWorkout::from_cell("A", date(2026, 1, 1))]);
        let original = store.list().await.unwrap().remove(0);
        let mut edited = original.with_title("B");
        edited.created_at = Utc::now() + chrono::Duration::days(3);

        let updated = store.update(edited).await.unwrap();

        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(updated.title, "B");
    }

    #[tokio::test]
    async fn update_of_missing_id_is_not_found() {
        let store = InMemoryWorkoutStore::new();
        let ghost = NewWorkout::from_cell("Ghost", date(2026, 1, 1)).into_workout(12, Utc::now());

        assert_eq!(store.update(ghost).await, Err(StoreError::NotFound(12)));
    }

    #[tokio::test]
    async fn delete_of_missing_id_succeeds() {
        let store = InMemoryWorkoutStore::new();
        tokio_test::assert_ok!(store.delete(99).await);
    }
}
