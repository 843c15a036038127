use std::sync::Arc;

use crate::store::{sort_store_order, StoreCommand, StoreError, WorkoutStore};
use crate::workout::{Workout, WorkoutId};

/// Cached view over a `WorkoutStore`.
///
/// Store calls run off the UI loop. `begin` applies the optimistic change,
/// `execute` performs the call on whatever task the caller picks, and
/// `finish` folds the result back into the cache.
pub struct WorkoutClient {
    store: Arc<dyn WorkoutStore>,
    cache: Vec<Workout>,
}

impl WorkoutClient {
    pub fn new(store: Arc<dyn WorkoutStore>) -> Self {
        Self { store, cache: Vec::new() }
    }

    /// Handle for running calls away from the cache owner.
    pub fn store(&self) -> Arc<dyn WorkoutStore> {
        Arc::clone(&self.store)
    }

    pub fn workouts(&self) -> &[Workout] {
        &self.cache
    }

    pub fn get(&self, id: WorkoutId) -> Option<&Workout> {
        self.cache.iter().find(|w| w.id == id)
    }

    pub async fn refresh(&mut self) -> Result<&[Workout], StoreError> {
        let workouts = self.store.list().await?;
        self.replace(workouts);
        Ok(&self.cache)
    }

    /// Swaps in a freshly listed set of workouts.
    pub fn replace(&mut self, workouts: Vec<Workout>) {
        tracing::debug!("Loaded {} workouts", workouts.len());
        self.cache = workouts;
    }

    /// Replaces the cached record with the same id, or inserts it.
    pub fn apply_optimistic(&mut self, workout: Workout) {
        match self.cache.iter_mut().find(|w| w.id == workout.id) {
            Some(slot) => *slot = workout,
            None => self.cache.push(workout),
        }
        sort_store_order(&mut self.cache);
    }

    /// Applies an update to the cache before the store sees it. Returns the
    /// record it replaced so `finish` can roll back.
    pub fn begin(&mut self, command: &StoreCommand) -> Option<Workout> {
        let StoreCommand::Update(workout) = command else {
            return None;
        };
        let previous = self.get(workout.id).cloned();
        self.apply_optimistic(workout.clone());
        previous
    }

    /// Folds a finished call into the cache. `current` is false when a newer
    /// call for the same cell was issued since; its optimistic state wins.
    pub fn finish(
        &mut self,
        command: &StoreCommand,
        previous: Option<Workout>,
        result: &Result<Option<Workout>, StoreError>,
        current: bool,
    ) {
        match (command, result) {
            (StoreCommand::Create(_), Ok(Some(created))) => self.apply_optimistic(created.clone()),
            (StoreCommand::Update(_), Ok(Some(updated))) if current => {
                self.apply_optimistic(updated.clone())
            }
            (StoreCommand::Update(sent), Err(_)) if current => match previous {
                Some(previous) => self.apply_optimistic(previous),
                None => self.cache.retain(|w| w.id != sent.id),
            },
            (StoreCommand::Delete(id), Ok(_)) => self.cache.retain(|w| w.id != *id),
            _ => {}
        }
    }
}

/// Runs one store call. Returns the stored record for creates and updates.
pub async fn execute(
    store: &dyn WorkoutStore,
    command: StoreCommand,
) -> Result<Option<Workout>, StoreError> {
    let result = match command {
        StoreCommand::Create(input) => store.create(input).await.map(Some),
        StoreCommand::Update(workout) => store.update(workout).await.map(Some),
        StoreCommand::Delete(id) => store.delete(id).await.map(|_| None),
    };

    match &result {
        Ok(Some(workout)) => tracing::info!("Saved workout {} on {}", workout.id, workout.date),
        Ok(None) => tracing::info!("Deleted workout"),
        Err(e) => tracing::error!("Store call failed: {}", e),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockWorkoutStore;
    use crate::workout::{NewWorkout, WorkoutStatus};
    use chrono::{NaiveDate, Utc};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn workout(id: WorkoutId, title: &str, on: NaiveDate) -> Workout {
        NewWorkout::from_cell(title, on).into_workout(id, Utc::now())
    }

    #[tokio::test]
    async fn refresh_replaces_cache() {
        let mut store = MockWorkoutStore::new();
        let listed = vec![workout(2, "Ride", date(2026, 1, 5)), workout(1, "Run", date(2026, 1, 4))];
        let returned = listed.clone();
        store.expect_list().times(1).returning(move || Ok(returned.clone()));

        let mut client = WorkoutClient::new(Arc::new(store));
        client.refresh().await.unwrap();

        assert_eq!(client.workouts(), listed.as_slice());
    }

    #[tokio::test]
    async fn failed_update_restores_previous_record() {
        let original = workout(1, "Run", date(2026, 1, 4));
        let listed = vec![original.clone()];
        let mut store = MockWorkoutStore::new();
        store.expect_list().returning(move || Ok(listed.clone()));
        store
            .expect_update()
            .times(1)
            .returning(|w| Err(StoreError::NotFound(w.id)));

        let mut client = WorkoutClient::new(Arc::new(store));
        client.refresh().await.unwrap();

        let command = StoreCommand::Update(original.with_status(WorkoutStatus::Completed));
        let previous = client.begin(&command);
        assert_eq!(client.get(1).map(|w| w.status), Some(WorkoutStatus::Completed));

        let result = execute(client.store().as_ref(), command.clone()).await;
        client.finish(&command, previous, &result, true);

        assert_eq!(result, Err(StoreError::NotFound(1)));
        assert_eq!(client.get(1), Some(&original));
    }

    #[tokio::test]
    async fn superseded_failure_keeps_newer_optimistic_state() {
        let original = workout(1, "Run", date(2026, 1, 4));
        let mut client = WorkoutClient::new(Arc::new(MockWorkoutStore::new()));
        client.apply_optimistic(original.clone());

        let first = StoreCommand::Update(original.with_status(WorkoutStatus::Completed));
        let first_previous = client.begin(&first);
        let second = StoreCommand::Update(original.with_status(WorkoutStatus::Error));
        client.begin(&second);

        client.finish(&first, first_previous, &Err(StoreError::NotFound(1)), false);

        assert_eq!(client.get(1).map(|w| w.status), Some(WorkoutStatus::Error));
    }

    #[tokio::test]
    async fn created_record_is_merged_into_cache() {
        let mut store = MockWorkoutStore::new();
        store
            .expect_create()
            .times(1)
            .returning(|input| Ok(input.into_workout(9, Utc::now())));

        let mut client = WorkoutClient::new(Arc::new(store));
        let command = StoreCommand::Create(NewWorkout::from_cell("Swim", date(2026, 2, 1)));
        let result = execute(client.store().as_ref(), command.clone()).await;
        client.finish(&command, None, &result, true);

        let created = result.unwrap().unwrap();
        assert_eq!(client.workouts(), &[created]);
    }

    #[tokio::test]
    async fn delete_drops_cached_record() {
        let mut store = MockWorkoutStore::new();
        store.expect_delete().times(1).returning(|_| Ok(()));

        let mut client = WorkoutClient::new(Arc::new(store));
        client.apply_optimistic(workout(1, "Run", date(2026, 1, 4)));
        client.apply_optimistic(workout(2, "Ride", date(2026, 1, 5)));

        let command = StoreCommand::Delete(1);
        let result = execute(client.store().as_ref(), command.clone()).await;
        client.finish(&command, None, &result, true);

        assert_eq!(result, Ok(None));
        let ids: Vec<_> = client.workouts().iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[tokio::test]
    async fn optimistic_apply_keeps_store_order() {
        let store = MockWorkoutStore::new();
        let mut client = WorkoutClient::new(Arc::new(store));

        client.apply_optimistic(workout(1, "Old", date(2026, 1, 1)));
        client.apply_optimistic(workout(2, "New", date(2026, 1, 8)));
        client.apply_optimistic(workout(3, "Same day", date(2026, 1, 8)));

        let ids: Vec<_> = client.workouts().iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }
}
