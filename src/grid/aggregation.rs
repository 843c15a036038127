//! Derived statistics. Nothing here is stored; every value is recomputed
//! from the cached workout list.

use chrono::{Datelike, NaiveDate};

use crate::calendar::week_index::{WeekCalendar, WeekIndex};
use crate::workout::{ExerciseType, Workout, WorkoutStatus};

/// Completed amount against the planned amount.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MetricProgress<T> {
    pub value: T,
    pub target: T,
}

impl MetricProgress<u64> {
    pub fn ratio(&self) -> f64 {
        if self.target == 0 { 0.0 } else { self.value as f64 / self.target as f64 }
    }
}

impl MetricProgress<f64> {
    pub fn ratio(&self) -> f64 {
        if self.target <= 0.0 { 0.0 } else { self.value / self.target }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusCounts {
    pub pending: usize,
    pub completed: usize,
    pub error: usize,
}

impl StatusCounts {
    fn record(&mut self, status: WorkoutStatus) {
        match status {
            WorkoutStatus::Pending => self.pending += 1,
            WorkoutStatus::Completed => self.completed += 1,
            WorkoutStatus::Error => self.error += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.pending + self.completed + self.error
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeekSummary {
    pub week_index: WeekIndex,
    pub start_date: NaiveDate,
    pub duration_sec: MetricProgress<u64>,
    pub distance_meters: MetricProgress<u64>,
    pub load: MetricProgress<f64>,
    pub counts: StatusCounts,
}

impl WeekSummary {
    pub fn is_empty(&self) -> bool {
        self.counts.total() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Duration,
    Distance,
    Load,
}

impl Metric {
    pub fn of(self, workout: &Workout) -> f64 {
        match self {
            Metric::Duration => f64::from(workout.duration_sec),
            Metric::Distance => f64::from(workout.distance_meters),
            Metric::Load => workout.load,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::Duration => "duration",
            Metric::Distance => "distance",
            Metric::Load => "load",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StatusBreakdown {
    pub pending: f64,
    pub completed: f64,
    pub error: f64,
}

/// One bar of a per-day chart.
#[derive(Debug, Clone, PartialEq)]
pub struct BarBucket {
    pub label: String,
    pub date: NaiveDate,
    pub value: f64,
    pub by_status: StatusBreakdown,
}

fn in_week<'a>(
    calendar: &WeekCalendar,
    week_index: WeekIndex,
    workouts: &'a [Workout],
) -> (NaiveDate, NaiveDate, impl Iterator<Item = &'a Workout>) {
    let dates = calendar.week_dates(week_index);
    let (first, last) = (dates[0], dates[6]);
    let members = workouts.iter().filter(move |w| w.date >= first && w.date <= last);
    (first, last, members)
}

/// Sums the week's completed workouts against all of its workouts.
pub fn summarize_week(calendar: &WeekCalendar, week_index: WeekIndex, workouts: &[Workout]) -> WeekSummary {
    let (start_date, _, members) = in_week(calendar, week_index, workouts);
    let mut summary = WeekSummary {
        week_index,
        start_date,
        duration_sec: MetricProgress::default(),
        distance_meters: MetricProgress::default(),
        load: MetricProgress::default(),
        counts: StatusCounts::default(),
    };

    for workout in members {
        summary.counts.record(workout.status);

        summary.duration_sec.target += u64::from(workout.duration_sec);
        summary.distance_meters.target += u64::from(workout.distance_meters);
        summary.load.target += workout.load;

        if workout.is_completed() {
            summary.duration_sec.value += u64::from(workout.duration_sec);
            summary.distance_meters.value += u64::from(workout.distance_meters);
            summary.load.value += workout.load;
        }
    }

    summary
}

pub fn daily_buckets(
    calendar: &WeekCalendar,
    week_index: WeekIndex,
    workouts: &[Workout],
    metric: Metric,
) -> [BarBucket; 7] {
    let dates = calendar.week_dates(week_index);
    let mut buckets = dates.map(|date| BarBucket {
        label: date.weekday().to_string(),
        date,
        value: 0.0,
        by_status: StatusBreakdown::default(),
    });

    let (first, _, members) = in_week(calendar, week_index, workouts);
    for workout in members {
        let day = (workout.date - first).num_days() as usize;
        let amount = metric.of(workout);
        let bucket = &mut buckets[day];
        bucket.value += amount;
        match workout.status {
            WorkoutStatus::Pending => bucket.by_status.pending += amount,
            WorkoutStatus::Completed => bucket.by_status.completed += amount,
            WorkoutStatus::Error => bucket.by_status.error += amount,
        }
    }

    buckets
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TypeTotals {
    pub workouts: usize,
    pub duration_sec: u64,
    pub distance_meters: u64,
    pub load: f64,
}

/// All-time completed totals.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingTotals {
    pub by_type: Vec<(ExerciseType, TypeTotals)>,
    pub counts: StatusCounts,
}

impl TrainingTotals {
    pub fn completion_rate(&self) -> f64 {
        let total = self.counts.total();
        if total == 0 { 0.0 } else { self.counts.completed as f64 / total as f64 }
    }

    pub fn for_type(&self, exercise_type: ExerciseType) -> TypeTotals {
        self.by_type
            .iter()
            .find(|(kind, _)| *kind == exercise_type)
            .map(|(_, totals)| *totals)
            .unwrap_or_default()
    }

    pub fn overall(&self) -> TypeTotals {
        self.by_type.iter().fold(TypeTotals::default(), |mut acc, (_, t)| {
            acc.workouts += t.workouts;
            acc.duration_sec += t.duration_sec;
            acc.distance_meters += t.distance_meters;
            acc.load += t.load;
            acc
        })
    }
}

pub fn training_totals(workouts: &[Workout]) -> TrainingTotals {
    let mut by_type: Vec<(ExerciseType, TypeTotals)> =
        ExerciseType::ALL.iter().map(|kind| (*kind, TypeTotals::default())).collect();
    let mut counts = StatusCounts::default();

    for workout in workouts {
        counts.record(workout.status);
        if !workout.is_completed() {
            continue;
        }
        if let Some((_, totals)) = by_type.iter_mut().find(|(kind, _)| *kind == workout.exercise_type) {
            totals.workouts += 1;
            totals.duration_sec += u64::from(workout.duration_sec);
            totals.distance_meters += u64::from(workout.distance_meters);
            totals.load += workout.load;
        }
    }

    TrainingTotals { by_type, counts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workout::NewWorkout;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn workout(id: i64, on: NaiveDate, status: WorkoutStatus, duration_sec: u32) -> Workout {
        let mut input = NewWorkout::from_cell("Run", on);
        input.status = status;
        input.duration_sec = duration_sec;
        input.into_workout(id, Utc::now())
    }

    fn week_of(calendar: &WeekCalendar, on: NaiveDate) -> WeekIndex {
        calendar.date_to_week_index(on)
    }

    #[test]
    fn completed_duration_against_weekly_total() {
        let calendar = WeekCalendar::default();
        let workouts = vec![
            workout(1, date(2026, 1, 12), WorkoutStatus::Completed, 1800),
            workout(2, date(2026, 1, 14), WorkoutStatus::Completed, 2700),
            workout(3, date(2026, 1, 16), WorkoutStatus::Pending, 900),
        ];

        let summary = summarize_week(&calendar, week_of(&calendar, date(2026, 1, 12)), &workouts);

        assert_eq!(summary.duration_sec, MetricProgress { value: 4500, target: 5400 });
        assert_eq!(summary.counts, StatusCounts { pending: 1, completed: 2, error: 0 });
        assert_eq!(summary.start_date, date(2026, 1, 12));
    }

    #[test]
    fn workouts_outside_the_week_are_ignored() {
        let calendar = WeekCalendar::default();
        let workouts = vec![
            workout(1, date(2026, 1, 11), WorkoutStatus::Completed, 600),
            workout(2, date(2026, 1, 18), WorkoutStatus::Completed, 1200),
            workout(3, date(2026, 1, 19), WorkoutStatus::Completed, 600),
        ];

        let summary = summarize_week(&calendar, week_of(&calendar, date(2026, 1, 12)), &workouts);

        assert_eq!(summary.duration_sec, MetricProgress { value: 1200, target: 1200 });
        assert_eq!(summary.counts.total(), 1);
    }

    #[test]
    fn empty_week_has_zero_ratio() {
        let calendar = WeekCalendar::default();
        let summary = summarize_week(&calendar, 0, &[]);

        assert!(summary.is_empty());
        assert_eq!(summary.duration_sec.ratio(), 0.0);
        assert_eq!(summary.load.ratio(), 0.0);
    }

    #[test]
    fn load_and_distance_follow_completion() {
        let calendar = WeekCalendar::default();
        let mut done = workout(1, date(2026, 1, 13), WorkoutStatus::Completed, 0);
        done.distance_meters = 5000;
        done.load = 40.0;
        let mut failed = workout(2, date(2026, 1, 15), WorkoutStatus::Error, 0);
        failed.distance_meters = 3000;
        failed.load = 20.0;

        let summary = summarize_week(&calendar, week_of(&calendar, done.date), &[done, failed]);

        assert_eq!(summary.distance_meters, MetricProgress { value: 5000, target: 8000 });
        assert_eq!(summary.load, MetricProgress { value: 40.0, target: 60.0 });
    }

    #[test]
    fn daily_buckets_stack_by_status() {
        let calendar = WeekCalendar::default();
        let workouts = vec![
            workout(1, date(2026, 1, 12), WorkoutStatus::Completed, 1800),
            workout(2, date(2026, 1, 12), WorkoutStatus::Pending, 600),
            workout(3, date(2026, 1, 18), WorkoutStatus::Error, 300),
        ];

        let buckets = daily_buckets(&calendar, week_of(&calendar, date(2026, 1, 12)), &workouts, Metric::Duration);

        assert_eq!(buckets[0].label, "Mon");
        assert_eq!(buckets[0].value, 2400.0);
        assert_eq!(buckets[0].by_status, StatusBreakdown { pending: 600.0, completed: 1800.0, error: 0.0 });
        assert_eq!(buckets[3].value, 0.0);
        assert_eq!(buckets[6].date, date(2026, 1, 18));
        assert_eq!(buckets[6].by_status.error, 300.0);
    }

    #[test]
    fn buckets_follow_configured_week_start() {
        let calendar = WeekCalendar::new(chrono::Weekday::Sun);
        let buckets = daily_buckets(&calendar, week_of(&calendar, date(2026, 1, 12)), &[], Metric::Load);

        assert_eq!(buckets[0].label, "Sun");
        assert_eq!(buckets[0].date, date(2026, 1, 11));
    }

    #[test]
    fn training_totals_count_only_completed_work() {
        let mut swim = workout(3, date(2026, 2, 1), WorkoutStatus::Completed, 1200);
        swim.exercise_type = ExerciseType::Swim;
        let workouts = vec![
            workout(1, date(2026, 1, 12), WorkoutStatus::Completed, 1800),
            workout(2, date(2026, 1, 13), WorkoutStatus::Pending, 900),
            swim,
        ];

        let totals = training_totals(&workouts);

        assert_eq!(totals.for_type(ExerciseType::Run).duration_sec, 1800);
        assert_eq!(totals.for_type(ExerciseType::Swim).workouts, 1);
        assert_eq!(totals.for_type(ExerciseType::Walk), TypeTotals::default());
        assert_eq!(totals.overall().duration_sec, 3000);
        assert!((totals.completion_rate() - 2.0 / 3.0).abs() < 1e-9);
    }
}
