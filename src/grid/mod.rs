pub mod aggregation;
pub mod cell;
pub mod drag;
pub mod editing;
pub mod week_list;

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::{JoinError, JoinSet};

use crate::calendar::week_index::{WeekCalendar, WeekIndex};
use crate::storage::Config;
use crate::store::{execute, StoreCommand, StoreError, WorkoutClient, WorkoutStore};
use crate::workout::{Workout, WorkoutId};

pub use aggregation::{daily_buckets, summarize_week, training_totals, MetricProgress, WeekSummary};
pub use cell::{CellCardData, CellEditMap, CellKey, CellPhase, CellView};
pub use drag::{
    drag_source, validate_drop, DragEffect, DragModality, DragPayload, DragSource, DropIntent,
    DropRejection, GridGeometry, Point,
};
pub use editing::{CellEditor, Mutation, MutationKind, SubmitOutcome};
pub use week_list::{LayoutMode, ListSettings, VisibleWeek, WeekListView};

pub type HapticCallback = Box<dyn FnMut() + Send>;

#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    /// Released outside any day cell.
    NoTarget,
    Rejected(DropRejection),
    /// The move was issued; the workout already shows on its new date.
    Moved(Workout),
}

/// A finished store call, reported once it has been folded into the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub key: CellKey,
    pub kind: MutationKind,
    pub result: Result<Option<Workout>, StoreError>,
}

enum StoreReply {
    Settled {
        mutation: Mutation,
        previous: Option<Workout>,
        result: Result<Option<Workout>, StoreError>,
    },
    Refreshed {
        epoch: u64,
        result: Result<Vec<Workout>, StoreError>,
    },
}

/// Owner of the grid's shared state: the workout cache, the cell edit map,
/// the week list and the active drag gesture.
///
/// Rows only read through `cell_view` and `week_summary`; every change goes
/// through the methods here. Store calls run on background tasks and come
/// back through `poll_store` or `wait_idle`.
pub struct WorkoutGrid {
    client: WorkoutClient,
    editor: CellEditor,
    list: WeekListView,
    drag: Box<dyn DragSource>,
    by_date: HashMap<NaiveDate, WorkoutId>,
    proxy: Option<Point>,
    haptic: Option<HapticCallback>,
    calls: JoinSet<StoreReply>,
    in_flight: usize,
    /// Bumped per dispatched mutation; a listing taken before the latest
    /// mutation is discarded.
    epoch: u64,
}

impl WorkoutGrid {
    pub fn new(store: Arc<dyn WorkoutStore>, list: WeekListView, drag: Box<dyn DragSource>) -> Self {
        Self {
            client: WorkoutClient::new(store),
            editor: CellEditor::new(),
            list,
            drag,
            by_date: HashMap::new(),
            proxy: None,
            haptic: None,
            calls: JoinSet::new(),
            in_flight: 0,
            epoch: 0,
        }
    }

    pub fn from_config(
        store: Arc<dyn WorkoutStore>,
        config: &Config,
        today: NaiveDate,
        width: u16,
        height: u32,
    ) -> Self {
        let list = WeekListView::mount(config.week_calendar(), config.list_settings(), today, width, height);
        let drag = drag_source(
            config.drag.modality,
            config.long_press_delay(),
            u32::from(config.drag.touch_slop),
        );
        Self::new(store, list, drag)
    }

    pub async fn load(&mut self) -> Result<(), StoreError> {
        let result = self.client.refresh().await.map(|_| ());
        self.reindex();
        result
    }

    pub fn workouts(&self) -> &[Workout] {
        self.client.workouts()
    }

    pub fn calendar(&self) -> &WeekCalendar {
        self.list.calendar()
    }

    pub fn list(&self) -> &WeekListView {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut WeekListView {
        &mut self.list
    }

    pub fn edits(&self) -> &CellEditMap {
        self.editor.cells()
    }

    pub fn set_haptic(&mut self, haptic: HapticCallback) {
        self.haptic = Some(haptic);
    }

    /// The grid's workout for `date`: the first one in store order.
    pub fn backing(&self, date: NaiveDate) -> Option<&Workout> {
        self.by_date.get(&date).and_then(|id| self.client.get(*id))
    }

    pub fn cell_date(&self, key: CellKey) -> NaiveDate {
        self.calendar().cell_date(key)
    }

    pub fn cell_view(&self, key: CellKey) -> CellView {
        let date = self.cell_date(key);
        CellView::resolve(date, self.editor.get(&key), self.backing(date))
    }

    pub fn week_summary(&self, week_index: WeekIndex) -> WeekSummary {
        summarize_week(self.calendar(), week_index, self.client.workouts())
    }

    fn reindex(&mut self) {
        let mut by_date = HashMap::new();
        for workout in self.client.workouts() {
            by_date.entry(workout.date).or_insert(workout.id);
        }
        self.by_date = by_date;
    }

    fn backing_at(&self, key: CellKey) -> (NaiveDate, Option<Workout>) {
        let date = self.cell_date(key);
        (date, self.backing(date).cloned())
    }

    /// Press on a cell body: empty cells open for typing, cells with a
    /// workout or a status reopen with their title.
    pub fn press_cell(&mut self, key: CellKey) -> bool {
        let (date, backing) = self.backing_at(key);
        if backing.is_none() && self.editor.get(&key).is_none() {
            self.editor.press_empty(key, date, None)
        } else {
            self.editor.press_title(key, date, backing.as_ref())
        }
    }

    pub fn change_text(&mut self, key: CellKey, text: &str) -> bool {
        self.editor.change_text(key, text)
    }

    pub fn cancel_edit(&mut self, key: CellKey) -> bool {
        self.editor.cancel(key)
    }

    pub fn submit(&mut self, key: CellKey) -> SubmitOutcome {
        let (_, backing) = self.backing_at(key);
        let outcome = self.editor.submit(key, backing.as_ref());
        if let SubmitOutcome::Mutate(mutation) = &outcome {
            self.dispatch(mutation.clone());
        }
        outcome
    }

    /// Status icon press. Returns whether a store update was issued.
    pub fn cycle_status(&mut self, key: CellKey) -> bool {
        let (date, backing) = self.backing_at(key);
        let Some(mutation) = self.editor.cycle_status(key, backing.as_ref()) else {
            return false;
        };
        if let StoreCommand::Update(updated) = &mutation.command {
            tracing::debug!("Cell {} on {} now {}", key, date, updated.status);
        }
        self.dispatch(mutation);
        true
    }

    /// Returns whether a store delete was issued.
    pub fn delete(&mut self, key: CellKey) -> bool {
        let (_, backing) = self.backing_at(key);
        match self.editor.delete(key, backing.as_ref()) {
            Some(mutation) => {
                self.dispatch(mutation);
                true
            }
            None => false,
        }
    }

    /// Number of mutations whose store call has not come back yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// True while any store call, including a follow-up refresh, is running.
    pub fn is_busy(&self) -> bool {
        !self.calls.is_empty()
    }

    /// Applies the optimistic part of a mutation and starts its store call
    /// on a background task.
    fn dispatch(&mut self, mutation: Mutation) {
        let previous = self.client.begin(&mutation.command);
        self.reindex();
        self.in_flight += 1;
        self.epoch += 1;

        tracing::debug!("{:?} on cell {} sent to store", mutation.kind, mutation.key);
        let store = self.client.store();
        self.calls.spawn(async move {
            let result = execute(store.as_ref(), mutation.command.clone()).await;
            StoreReply::Settled { mutation, previous, result }
        });
    }

    fn spawn_refresh(&mut self) {
        let store = self.client.store();
        let epoch = self.epoch;
        self.calls.spawn(async move {
            let result = store.list().await;
            StoreReply::Refreshed { epoch, result }
        });
    }

    /// Folds every store call that has already finished into the grid.
    /// Never waits.
    pub fn poll_store(&mut self) -> Vec<Settlement> {
        let mut settled = Vec::new();
        while let Some(joined) = self.calls.try_join_next() {
            settled.extend(self.apply_joined(joined));
        }
        settled
    }

    /// Waits for every outstanding store call, folding each one in as it
    /// finishes.
    pub async fn wait_idle(&mut self) -> Vec<Settlement> {
        let mut settled = Vec::new();
        while let Some(joined) = self.calls.join_next().await {
            settled.extend(self.apply_joined(joined));
        }
        settled
    }

    fn apply_joined(&mut self, joined: Result<StoreReply, JoinError>) -> Option<Settlement> {
        match joined {
            Ok(reply) => self.apply_reply(reply),
            Err(e) => {
                tracing::error!("Store task ended abnormally: {}", e);
                None
            }
        }
    }

    /// Reports a finished call to the cell it was planned for. Store
    /// failures end here as error cell state.
    fn apply_reply(&mut self, reply: StoreReply) -> Option<Settlement> {
        match reply {
            StoreReply::Settled { mutation, previous, result } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                let current = self.editor.generation(&mutation.key) == mutation.generation;
                self.client.finish(&mutation.command, previous, &result, current);
                self.reindex();

                if let Err(e) = &result {
                    tracing::error!("{:?} on cell {} failed: {}", mutation.kind, mutation.key, e);
                }
                let date = self.cell_date(mutation.key);
                let outcome = result.as_ref().map(|_| ()).map_err(Clone::clone);
                self.editor.settle(&mutation, &outcome, date);

                if self.in_flight == 0 {
                    self.spawn_refresh();
                }
                Some(Settlement { key: mutation.key, kind: mutation.kind, result })
            }
            StoreReply::Refreshed { epoch, result } => {
                if epoch != self.epoch || self.in_flight > 0 {
                    tracing::debug!("Dropping listing taken before the latest mutation");
                    return None;
                }
                match result {
                    Ok(workouts) => {
                        self.client.replace(workouts);
                        self.reindex();
                    }
                    Err(e) => tracing::warn!("Refresh after mutation failed, keeping merged cache: {}", e),
                }
                None
            }
        }
    }

    pub fn drag_modality(&self) -> DragModality {
        self.drag.modality()
    }

    pub fn dragged(&self) -> Option<&DragPayload> {
        self.drag.payload()
    }

    pub fn proxy(&self) -> Option<Point> {
        self.proxy
    }

    /// Starts a gesture on a cell. Only cells showing a stored workout can
    /// be dragged.
    pub fn drag_begin(&mut self, key: CellKey, at: Point, now: Instant) -> bool {
        if self.editor.is_mid_edit(&key) {
            return false;
        }
        let (_, backing) = self.backing_at(key);
        let Some(workout) = backing else {
            return false;
        };
        let effects = self.drag.press(DragPayload::new(workout, key), at, now);
        self.apply_effects(effects);
        true
    }

    pub fn drag_tick(&mut self, now: Instant) {
        let effects = self.drag.tick(now);
        self.apply_effects(effects);
    }

    pub fn drag_motion(&mut self, at: Point, now: Instant) {
        let effects = self.drag.motion(at, now);
        self.apply_effects(effects);
    }

    pub fn drag_end(&mut self, at: Point, geometry: &GridGeometry) -> DropOutcome {
        let release = self.drag.release(at, geometry);
        self.apply_effects(release.effects);
        match release.intent {
            Some(intent) => self.drop_onto(intent),
            None => DropOutcome::NoTarget,
        }
    }

    pub fn drag_terminate(&mut self) {
        let effects = self.drag.terminate();
        self.apply_effects(effects);
    }

    /// Validates a drop and moves the workout to the target date.
    pub fn drop_onto(&mut self, intent: DropIntent) -> DropOutcome {
        let target_date = self.cell_date(intent.target);
        let checked = validate_drop(
            &intent.payload,
            target_date,
            self.backing(target_date),
            self.editor.get(&intent.target),
        );
        let moved = match checked {
            Ok(moved) => moved,
            Err(rejection) => {
                tracing::debug!("Drop on {} rejected: {}", intent.target, rejection);
                return DropOutcome::Rejected(rejection);
            }
        };

        tracing::info!(
            "Moving workout {} from {} to {}",
            moved.id,
            intent.payload.source_date_key,
            moved.date
        );
        let mutation = self.editor.reassign(intent.payload.source, moved.clone());
        self.dispatch(mutation);
        DropOutcome::Moved(moved)
    }

    fn apply_effects(&mut self, effects: Vec<DragEffect>) {
        for effect in effects {
            match effect {
                DragEffect::LockScroll => self.list.set_scroll_enabled(false),
                DragEffect::ReleaseScroll => self.list.set_scroll_enabled(true),
                DragEffect::Haptic => {
                    if let Some(haptic) = self.haptic.as_mut() {
                        haptic();
                    }
                }
                DragEffect::MoveProxy(point) => self.proxy = Some(point),
                DragEffect::HideProxy => self.proxy = None,
            }
        }
    }
}
