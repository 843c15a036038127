//! Drag-and-drop rescheduling.
//!
//! Two input modalities feed one reassignment: a pointer drag that is live as
//! soon as it starts, and a touch drag that needs a long press before it takes
//! over the gesture. Both hand back a `DropIntent`; `validate_drop` decides
//! whether it becomes a store update.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::calendar::week_index::WeekIndex;
use crate::grid::cell::{CellCardData, CellKey, CellPhase};
use crate::grid::week_list::{LayoutMode, WeekListView, GRID_COLUMNS};
use crate::workout::Workout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragModality {
    Pointer,
    Touch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    fn distance(self, other: Point) -> u32 {
        (self.x - other.x).unsigned_abs().max((self.y - other.y).unsigned_abs())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragPayload {
    pub workout: Workout,
    pub source: CellKey,
    pub source_date_key: String,
}

impl DragPayload {
    pub fn new(workout: Workout, source: CellKey) -> Self {
        let source_date_key = workout.date_key();
        Self { workout, source, source_date_key }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropIntent {
    pub payload: DragPayload,
    pub target: CellKey,
}

/// Side effects a gesture asks the host to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragEffect {
    LockScroll,
    ReleaseScroll,
    Haptic,
    MoveProxy(Point),
    HideProxy,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DragRelease {
    pub intent: Option<DropIntent>,
    pub effects: Vec<DragEffect>,
}

/// One drag input modality.
pub trait DragSource: Send {
    fn modality(&self) -> DragModality;

    /// Payload of a gesture that has taken over as a drag.
    fn payload(&self) -> Option<&DragPayload>;

    fn press(&mut self, payload: DragPayload, at: Point, now: Instant) -> Vec<DragEffect>;

    fn tick(&mut self, now: Instant) -> Vec<DragEffect>;

    fn motion(&mut self, at: Point, now: Instant) -> Vec<DragEffect>;

    fn release(&mut self, at: Point, geometry: &GridGeometry) -> DragRelease;

    /// Gesture interrupted by the host. Must undo any lock it holds.
    fn terminate(&mut self) -> Vec<DragEffect>;

    fn is_active(&self) -> bool {
        self.payload().is_some()
    }
}

pub fn drag_source(modality: DragModality, long_press: Duration, slop: u32) -> Box<dyn DragSource> {
    match modality {
        DragModality::Pointer => Box::new(PointerDrag::new()),
        DragModality::Touch => Box::new(TouchDrag::new(long_press, slop)),
    }
}

/// Snapshot of the grid container used to turn points into cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridGeometry {
    pub origin: Point,
    pub width: u32,
    pub layout: LayoutMode,
    pub row_height: u32,
    pub stacked_cell_height: u32,
    pub first_week: WeekIndex,
    pub window_weeks: u32,
    pub scroll_offset: u32,
}

impl GridGeometry {
    pub fn from_list(list: &WeekListView, origin: Point, width: u32) -> Self {
        Self {
            origin,
            width,
            layout: list.layout(),
            row_height: list.row_height().max(1),
            stacked_cell_height: list.settings().stacked_cell_height.max(1),
            first_week: list.window().start,
            window_weeks: list.settings().window_weeks,
            scroll_offset: list.scroll_offset(),
        }
    }

    pub fn column_width(&self) -> u32 {
        (self.width / GRID_COLUMNS).max(1)
    }

    /// Day cell under `point`, or `None` for the summary column, the gaps
    /// outside the container, and rows outside the window.
    pub fn cell_at(&self, point: Point) -> Option<CellKey> {
        let dx = point.x - self.origin.x;
        let dy = point.y - self.origin.y;
        if dx < 0 || dy < 0 || dx as u32 >= self.width {
            return None;
        }

        let content_y = dy as u32 + self.scroll_offset;
        let row = content_y / self.row_height;
        if row >= self.window_weeks {
            return None;
        }
        let week_index = self.first_week + i64::from(row);

        let day = match self.layout {
            LayoutMode::MultiColumn => dx as u32 / self.column_width(),
            LayoutMode::SingleColumn => (content_y % self.row_height) / self.stacked_cell_height,
        };
        (day < 7).then(|| CellKey::new(week_index, day as u8))
    }

    /// Screen rectangle of a day cell (`slot` 0..7) or the week summary (`slot` 7).
    pub fn slot_rect(&self, week_index: WeekIndex, slot: u32) -> Option<CellRect> {
        let row = week_index.checked_sub(self.first_week)?;
        if row < 0 || row >= i64::from(self.window_weeks) || slot > 7 {
            return None;
        }
        let row_top = self.origin.y as i64 + row * i64::from(self.row_height) - i64::from(self.scroll_offset);

        let rect = match self.layout {
            LayoutMode::MultiColumn => {
                let column = self.column_width();
                CellRect {
                    x: self.origin.x + (slot * column) as i32,
                    y: row_top as i32,
                    width: column,
                    height: self.row_height,
                }
            }
            LayoutMode::SingleColumn => CellRect {
                x: self.origin.x,
                y: (row_top + i64::from(slot * self.stacked_cell_height)) as i32,
                width: self.width,
                height: self.stacked_cell_height,
            },
        };
        Some(rect)
    }

    pub fn cell_rect(&self, key: CellKey) -> Option<CellRect> {
        self.slot_rect(key.week_index, u32::from(key.day_index))
    }
}

/// Pointer drag: live from the first press, target is the cell under the
/// pointer at release.
#[derive(Debug, Default)]
pub struct PointerDrag {
    payload: Option<DragPayload>,
}

impl PointerDrag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop onto a cell the host already resolved.
    pub fn drop_on(&mut self, target: CellKey) -> Option<DropIntent> {
        self.payload.take().map(|payload| DropIntent { payload, target })
    }
}

impl DragSource for PointerDrag {
    fn modality(&self) -> DragModality {
        DragModality::Pointer
    }

    fn payload(&self) -> Option<&DragPayload> {
        self.payload.as_ref()
    }

    fn press(&mut self, payload: DragPayload, _at: Point, _now: Instant) -> Vec<DragEffect> {
        self.payload = Some(payload);
        Vec::new()
    }

    fn tick(&mut self, _now: Instant) -> Vec<DragEffect> {
        Vec::new()
    }

    fn motion(&mut self, _at: Point, _now: Instant) -> Vec<DragEffect> {
        Vec::new()
    }

    fn release(&mut self, at: Point, geometry: &GridGeometry) -> DragRelease {
        let intent = geometry.cell_at(at).and_then(|target| self.drop_on(target));
        self.payload = None;
        DragRelease { intent, effects: Vec::new() }
    }

    fn terminate(&mut self) -> Vec<DragEffect> {
        self.payload = None;
        Vec::new()
    }
}

#[derive(Debug)]
enum TouchPhase {
    Idle,
    Armed { payload: DragPayload, origin: Point, since: Instant },
    Dragging { payload: DragPayload, proxy: Point },
}

/// Touch drag: a long press arms it, then the finger carries a floating proxy.
/// Holds the scroll lock from activation until release or termination.
#[derive(Debug)]
pub struct TouchDrag {
    delay: Duration,
    slop: u32,
    phase: TouchPhase,
}

impl TouchDrag {
    pub fn new(delay: Duration, slop: u32) -> Self {
        Self { delay, slop, phase: TouchPhase::Idle }
    }

    pub fn proxy(&self) -> Option<Point> {
        match &self.phase {
            TouchPhase::Dragging { proxy, .. } => Some(*proxy),
            _ => None,
        }
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.phase, TouchPhase::Armed { .. })
    }

    fn activate_if_due(&mut self, now: Instant) -> Vec<DragEffect> {
        let due = match &self.phase {
            TouchPhase::Armed { since, .. } => now.saturating_duration_since(*since) >= self.delay,
            _ => false,
        };
        if !due {
            return Vec::new();
        }

        match std::mem::replace(&mut self.phase, TouchPhase::Idle) {
            TouchPhase::Armed { payload, origin, .. } => {
                tracing::debug!("Touch drag activated for workout {}", payload.workout.id);
                self.phase = TouchPhase::Dragging { payload, proxy: origin };
                vec![DragEffect::LockScroll, DragEffect::Haptic, DragEffect::MoveProxy(origin)]
            }
            other => {
                self.phase = other;
                Vec::new()
            }
        }
    }
}

impl DragSource for TouchDrag {
    fn modality(&self) -> DragModality {
        DragModality::Touch
    }

    fn payload(&self) -> Option<&DragPayload> {
        match &self.phase {
            TouchPhase::Dragging { payload, .. } => Some(payload),
            _ => None,
        }
    }

    fn press(&mut self, payload: DragPayload, at: Point, now: Instant) -> Vec<DragEffect> {
        let effects = self.terminate();
        self.phase = TouchPhase::Armed { payload, origin: at, since: now };
        effects
    }

    fn tick(&mut self, now: Instant) -> Vec<DragEffect> {
        self.activate_if_due(now)
    }

    fn motion(&mut self, at: Point, now: Instant) -> Vec<DragEffect> {
        let mut effects = self.activate_if_due(now);
        let slop = self.slop;
        let scrolled = match &mut self.phase {
            TouchPhase::Armed { origin, .. } => origin.distance(at) > slop,
            TouchPhase::Dragging { proxy, .. } => {
                *proxy = at;
                effects.push(DragEffect::MoveProxy(at));
                false
            }
            TouchPhase::Idle => false,
        };
        if scrolled {
            // Moved before the long press fired: this is a scroll.
            self.phase = TouchPhase::Idle;
        }
        effects
    }

    fn release(&mut self, at: Point, geometry: &GridGeometry) -> DragRelease {
        match std::mem::replace(&mut self.phase, TouchPhase::Idle) {
            TouchPhase::Dragging { payload, .. } => DragRelease {
                intent: geometry.cell_at(at).map(|target| DropIntent { payload, target }),
                effects: vec![DragEffect::HideProxy, DragEffect::ReleaseScroll],
            },
            _ => DragRelease::default(),
        }
    }

    fn terminate(&mut self) -> Vec<DragEffect> {
        match std::mem::replace(&mut self.phase, TouchPhase::Idle) {
            TouchPhase::Dragging { .. } => vec![DragEffect::HideProxy, DragEffect::ReleaseScroll],
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DropRejection {
    #[error("Workout is already on that date")]
    SameDate,
    #[error("Target date already has a workout")]
    Occupied,
    #[error("Target cell is being edited")]
    TargetEditing,
    #[error("Target date holds an unsaved workout")]
    TargetHasDraft,
}

/// Checks a drop and returns the workout with only its date changed.
///
/// Any card on the target blocks the drop: typed text or an in-flight
/// create counts as editing, anything else is an unsaved draft.
pub fn validate_drop(
    payload: &DragPayload,
    target_date: NaiveDate,
    target_backing: Option<&Workout>,
    target_card: Option<&CellCardData>,
) -> Result<Workout, DropRejection> {
    if target_date == payload.workout.date {
        return Err(DropRejection::SameDate);
    }
    if target_backing.is_some() {
        return Err(DropRejection::Occupied);
    }
    match target_card.map(|card| card.state) {
        Some(CellPhase::Input | CellPhase::Submitting) => Err(DropRejection::TargetEditing),
        Some(_) => Err(DropRejection::TargetHasDraft),
        None => Ok(payload.workout.with_date(target_date)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workout::NewWorkout;
    use chrono::Utc;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn payload() -> DragPayload {
        let workout = NewWorkout::from_cell("Intervals", date(2026, 1, 12)).into_workout(4, Utc::now());
        DragPayload::new(workout, CellKey::new(106, 0))
    }

    fn geometry(layout: LayoutMode) -> GridGeometry {
        GridGeometry {
            origin: Point::new(2, 3),
            width: 80,
            layout,
            row_height: match layout {
                LayoutMode::MultiColumn => 4,
                LayoutMode::SingleColumn => 16,
            },
            stacked_cell_height: 2,
            first_week: 100,
            window_weeks: 20,
            scroll_offset: 8,
        }
    }

    #[test]
    fn multi_column_hit_test_accounts_for_scroll() {
        let geo = geometry(LayoutMode::MultiColumn);

        assert_eq!(geo.cell_at(Point::new(2, 3)), Some(CellKey::new(102, 0)));
        assert_eq!(geo.cell_at(Point::new(2 + 10 * 3 + 1, 3 + 5)), Some(CellKey::new(103, 3)));
    }

    #[test]
    fn summary_column_and_outside_points_are_not_targets() {
        let geo = geometry(LayoutMode::MultiColumn);

        assert_eq!(geo.cell_at(Point::new(2 + 70, 3)), None);
        assert_eq!(geo.cell_at(Point::new(1, 3)), None);
        assert_eq!(geo.cell_at(Point::new(2, 2)), None);
        assert_eq!(geo.cell_at(Point::new(2 + 80, 3)), None);
    }

    #[test]
    fn single_column_hit_test_uses_stacked_slots() {
        let geo = geometry(LayoutMode::SingleColumn);

        // Content y 8 is slot 4 of the first row.
        assert_eq!(geo.cell_at(Point::new(40, 3)), Some(CellKey::new(100, 4)));
        // Content y 22 is slot 3 of the second row.
        assert_eq!(geo.cell_at(Point::new(40, 3 + 14)), Some(CellKey::new(101, 3)));
        // Content y 14 is the summary block.
        assert_eq!(geo.cell_at(Point::new(40, 3 + 6)), None);
    }

    #[test]
    fn cell_rect_round_trips_through_hit_test() {
        for layout in [LayoutMode::MultiColumn, LayoutMode::SingleColumn] {
            let geo = geometry(layout);
            let key = CellKey::new(104, 5);
            let rect = geo.cell_rect(key).unwrap();

            assert_eq!(geo.cell_at(Point::new(rect.x, rect.y)), Some(key));
        }
    }

    #[test]
    fn pointer_drag_resolves_target_at_release() {
        let mut drag = PointerDrag::new();
        let geo = geometry(LayoutMode::MultiColumn);

        assert!(drag.press(payload(), Point::new(3, 3), Instant::now()).is_empty());
        assert!(drag.is_active());

        let release = drag.release(Point::new(2 + 10, 3), &geo);

        assert_eq!(release.intent.map(|i| i.target), Some(CellKey::new(102, 1)));
        assert!(release.effects.is_empty());
        assert!(!drag.is_active());
    }

    #[test]
    fn pointer_drop_on_resolved_cell() {
        let mut drag = PointerDrag::new();
        drag.press(payload(), Point::default(), Instant::now());

        let intent = drag.drop_on(CellKey::new(106, 1)).unwrap();

        assert_eq!(intent.payload.source_date_key, "2026-01-12");
        assert!(drag.drop_on(CellKey::new(106, 1)).is_none());
    }

    #[test]
    fn touch_drag_activates_after_long_press() {
        let start = Instant::now();
        let mut drag = TouchDrag::new(Duration::from_millis(300), 2);
        drag.press(payload(), Point::new(5, 5), start);

        assert!(drag.tick(start + Duration::from_millis(100)).is_empty());
        assert!(!drag.is_active());

        let effects = drag.tick(start + Duration::from_millis(300));
        assert_eq!(effects, vec![
            DragEffect::LockScroll,
            DragEffect::Haptic,
            DragEffect::MoveProxy(Point::new(5, 5)),
        ]);
        assert!(drag.is_active());

        let moved = drag.motion(Point::new(30, 9), start + Duration::from_millis(400));
        assert_eq!(moved, vec![DragEffect::MoveProxy(Point::new(30, 9))]);
        assert_eq!(drag.proxy(), Some(Point::new(30, 9)));
    }

    #[test]
    fn touch_motion_before_activation_becomes_scroll() {
        let start = Instant::now();
        let mut drag = TouchDrag::new(Duration::from_millis(300), 2);
        drag.press(payload(), Point::new(5, 5), start);

        drag.motion(Point::new(5, 12), start + Duration::from_millis(50));

        assert!(!drag.is_armed());
        assert!(drag.tick(start + Duration::from_secs(1)).is_empty());
        assert!(!drag.is_active());
    }

    #[test]
    fn touch_release_always_releases_scroll_lock() {
        let start = Instant::now();
        let mut drag = TouchDrag::new(Duration::from_millis(300), 2);
        let geo = geometry(LayoutMode::MultiColumn);
        drag.press(payload(), Point::new(5, 5), start);
        drag.tick(start + Duration::from_millis(300));

        // Released over the summary column: no target, lock still released.
        let release = drag.release(Point::new(2 + 75, 3), &geo);

        assert!(release.intent.is_none());
        assert_eq!(release.effects, vec![DragEffect::HideProxy, DragEffect::ReleaseScroll]);
    }

    #[test]
    fn touch_release_hit_tests_release_point() {
        let start = Instant::now();
        let mut drag = TouchDrag::new(Duration::from_millis(300), 2);
        let geo = geometry(LayoutMode::SingleColumn);
        drag.press(payload(), Point::new(5, 5), start);
        drag.tick(start + Duration::from_millis(300));

        let release = drag.release(Point::new(40, 3 + 14), &geo);

        assert_eq!(release.intent.map(|i| i.target), Some(CellKey::new(101, 3)));
    }

    #[test]
    fn terminated_touch_drag_releases_lock_once() {
        let start = Instant::now();
        let mut drag = TouchDrag::new(Duration::from_millis(300), 2);
        drag.press(payload(), Point::new(5, 5), start);
        drag.tick(start + Duration::from_millis(300));

        assert_eq!(drag.terminate(), vec![DragEffect::HideProxy, DragEffect::ReleaseScroll]);
        assert!(drag.terminate().is_empty());
    }

    #[test]
    fn drop_on_same_date_is_rejected() {
        let result = validate_drop(&payload(), date(2026, 1, 12), None, None);
        assert_eq!(result, Err(DropRejection::SameDate));
    }

    #[test]
    fn drop_on_occupied_date_is_rejected() {
        let other = NewWorkout::from_cell("Swim", date(2026, 1, 13)).into_workout(5, Utc::now());
        let result = validate_drop(&payload(), date(2026, 1, 13), Some(&other), None);
        assert_eq!(result, Err(DropRejection::Occupied));
    }

    #[test]
    fn drop_on_cell_being_edited_is_rejected() {
        let typing = CellCardData::input(date(2026, 1, 13), "Hil");
        let submitting = typing.with_state(CellPhase::Submitting);

        assert_eq!(
            validate_drop(&payload(), date(2026, 1, 13), None, Some(&typing)),
            Err(DropRejection::TargetEditing)
        );
        assert_eq!(
            validate_drop(&payload(), date(2026, 1, 13), None, Some(&submitting)),
            Err(DropRejection::TargetEditing)
        );
    }

    #[test]
    fn drop_on_failed_draft_is_rejected() {
        let draft = CellCardData::input(date(2026, 1, 13), "Hills").with_state(CellPhase::Error);

        let result = validate_drop(&payload(), date(2026, 1, 13), None, Some(&draft));

        assert_eq!(result, Err(DropRejection::TargetHasDraft));
    }

    #[test]
    fn valid_drop_changes_only_the_date() {
        let source = payload();
        let moved = validate_drop(&source, date(2026, 1, 13), None, None).unwrap();

        assert_eq!(moved, Workout { date: date(2026, 1, 13), ..source.workout });
    }
}
