use chrono::{Days, NaiveDate};
use workout_grid::workout::{ExerciseType, NewWorkout, WorkoutStatus};

/// A fortnight of workouts around `today` for `--sample` sessions.
pub fn sample_workouts(today: NaiveDate) -> Vec<NewWorkout> {
    let plan: [(i64, &str, ExerciseType, WorkoutStatus, u32, u32, f64); 9] = [
        (-6, "Easy run", ExerciseType::Run, WorkoutStatus::Completed, 1800, 5000, 30.0),
        (-5, "Pool laps", ExerciseType::Swim, WorkoutStatus::Completed, 2400, 1500, 35.0),
        (-3, "Intervals", ExerciseType::Run, WorkoutStatus::Error, 2700, 7000, 60.0),
        (-2, "Commute ride", ExerciseType::Cycle, WorkoutStatus::Completed, 3600, 20000, 40.0),
        (-1, "Recovery walk", ExerciseType::Walk, WorkoutStatus::Completed, 2700, 3500, 10.0),
        (0, "Tempo run", ExerciseType::Run, WorkoutStatus::Pending, 2700, 8000, 55.0),
        (2, "Long ride", ExerciseType::Cycle, WorkoutStatus::Pending, 7200, 50000, 90.0),
        (4, "Open water", ExerciseType::Swim, WorkoutStatus::Pending, 1800, 1200, 30.0),
        (6, "Long run", ExerciseType::Run, WorkoutStatus::Pending, 5400, 16000, 100.0),
    ];

    plan.into_iter()
        .filter_map(|(offset, title, exercise_type, status, duration_sec, distance_meters, load)| {
            let date = if offset < 0 {
                today.checked_sub_days(Days::new(offset.unsigned_abs()))
            } else {
                today.checked_add_days(Days::new(offset as u64))
            }?;
            Some(NewWorkout {
                title: title.to_string(),
                description: Some("Sample workout".to_string()),
                date,
                status,
                exercise_type,
                duration_sec,
                distance_meters,
                load,
            })
        })
        .collect()
}
