use chrono::NaiveDate;
use std::collections::HashMap;

use crate::grid::cell::{CellCardData, CellEditMap, CellKey, CellPhase};
use crate::store::{StoreCommand, StoreError};
use crate::workout::{NewWorkout, Workout};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Submit,
    StatusCycle,
    Delete,
    Reassign,
}

/// A store call planned by a cell transition, tagged with the cell
/// generation it was planned against.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub key: CellKey,
    pub generation: u64,
    pub kind: MutationKind,
    pub command: StoreCommand,
    /// Title shown on the cell if the call fails.
    pub title: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The cell was not accepting a submit (no input, or already pending).
    Ignored,
    /// Empty text; the cell state was dropped without a store call.
    Discarded,
    Mutate(Mutation),
}

/// Per-cell editing state machine.
///
/// Transitions only touch local state and return the store call to make;
/// the caller performs the call and reports back through `settle`.
#[derive(Debug, Default)]
pub struct CellEditor {
    cells: CellEditMap,
    generations: HashMap<CellKey, u64>,
}

impl CellEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cells(&self) -> &CellEditMap {
        &self.cells
    }

    pub fn get(&self, key: &CellKey) -> Option<&CellCardData> {
        self.cells.get(key)
    }

    pub fn is_mid_edit(&self, key: &CellKey) -> bool {
        self.cells.is_mid_edit(key)
    }

    pub fn generation(&self, key: &CellKey) -> u64 {
        self.generations.get(key).copied().unwrap_or(0)
    }

    fn touch(&mut self, key: CellKey) -> u64 {
        let generation = self.generations.entry(key).or_insert(0);
        *generation += 1;
        *generation
    }

    fn put(&mut self, key: CellKey, data: CellCardData) {
        self.cells = self.cells.with(key, data);
    }

    fn drop_cell(&mut self, key: &CellKey) {
        self.cells = self.cells.without(key);
    }

    /// Opens an empty cell for typing. Cells with a workout or existing
    /// state are left alone.
    pub fn press_empty(&mut self, key: CellKey, date: NaiveDate, backing: Option<&Workout>) -> bool {
        if backing.is_some() || self.cells.get(&key).is_some() {
            return false;
        }
        self.touch(key);
        self.put(key, CellCardData::input(date, ""));
        tracing::debug!("Cell {} opened for input", key);
        true
    }

    /// Reopens a cell showing a status for editing, prefilled with its title.
    pub fn press_title(&mut self, key: CellKey, date: NaiveDate, backing: Option<&Workout>) -> bool {
        let title = match (self.cells.get(&key), backing) {
            (Some(card), _) if card.state == CellPhase::Input => return false,
            (Some(card), _) => card.value.clone(),
            (None, Some(workout)) => workout.title.clone(),
            (None, None) => return false,
        };
        self.touch(key);
        self.put(key, CellCardData::input(date, title));
        true
    }

    pub fn change_text(&mut self, key: CellKey, text: &str) -> bool {
        let Some(card) = self.cells.get(&key) else {
            return false;
        };
        if card.state != CellPhase::Input {
            return false;
        }
        let updated = CellCardData { value: text.to_string(), ..card.clone() };
        self.put(key, updated);
        true
    }

    /// Drops typed text without saving.
    pub fn cancel(&mut self, key: CellKey) -> bool {
        if self.cells.get(&key).map(|c| c.state) != Some(CellPhase::Input) {
            return false;
        }
        self.touch(key);
        self.drop_cell(&key);
        true
    }

    pub fn submit(&mut self, key: CellKey, backing: Option<&Workout>) -> SubmitOutcome {
        let Some(card) = self.cells.get(&key).cloned() else {
            return SubmitOutcome::Ignored;
        };
        if card.state != CellPhase::Input {
            return SubmitOutcome::Ignored;
        }

        let generation = self.touch(key);
        let title = card.value.trim();
        if title.is_empty() {
            self.drop_cell(&key);
            tracing::debug!("Cell {} submitted empty, discarded", key);
            return SubmitOutcome::Discarded;
        }

        let command = match backing {
            Some(workout) => {
                self.drop_cell(&key);
                StoreCommand::Update(workout.with_title(title))
            }
            None => {
                self.put(key, card.with_state(CellPhase::Submitting));
                StoreCommand::Create(NewWorkout::from_cell(title, card.date))
            }
        };

        SubmitOutcome::Mutate(Mutation {
            key,
            generation,
            kind: MutationKind::Submit,
            command,
            title: title.to_string(),
        })
    }

    /// Advances the status icon. Returns the update to send when the cell is
    /// bound to a workout; unbound cells cycle locally.
    pub fn cycle_status(&mut self, key: CellKey, backing: Option<&Workout>) -> Option<Mutation> {
        let card = self.cells.get(&key).cloned();
        if card.as_ref().is_some_and(|c| c.state == CellPhase::Input) {
            return None;
        }

        match (backing, card) {
            (Some(workout), card) => {
                let shown = card
                    .and_then(|c| c.state.status())
                    .unwrap_or(workout.status);
                let generation = self.touch(key);
                self.drop_cell(&key);
                Some(Mutation {
                    key,
                    generation,
                    kind: MutationKind::StatusCycle,
                    command: StoreCommand::Update(workout.with_status(shown.next())),
                    title: workout.title.clone(),
                })
            }
            // Local only. An in-flight create keeps its phase until it settles.
            (None, Some(card)) if card.state == CellPhase::Submitting => None,
            (None, Some(card)) => {
                if let Some(status) = card.state.status() {
                    self.put(key, card.with_state(CellPhase::from_status(status.next())));
                }
                None
            }
            (None, None) => None,
        }
    }

    /// Deletes the cell's workout, or drops local state when there is none.
    pub fn delete(&mut self, key: CellKey, backing: Option<&Workout>) -> Option<Mutation> {
        let generation = self.touch(key);
        match backing {
            Some(workout) => Some(Mutation {
                key,
                generation,
                kind: MutationKind::Delete,
                command: StoreCommand::Delete(workout.id),
                title: workout.title.clone(),
            }),
            None => {
                self.drop_cell(&key);
                None
            }
        }
    }

    /// Plans a date reassignment for a dragged workout. Validation lives in
    /// the drag engine; this only records the mutation against the source.
    pub fn reassign(&mut self, source: CellKey, moved: Workout) -> Mutation {
        let generation = self.touch(source);
        Mutation {
            key: source,
            generation,
            kind: MutationKind::Reassign,
            title: moved.title.clone(),
            command: StoreCommand::Update(moved),
        }
    }

    /// Applies a finished store call to the cell it was planned for. Results
    /// for cells the user has changed since are ignored. `date` is the cell's
    /// calendar date.
    pub fn settle(&mut self, mutation: &Mutation, result: &Result<(), StoreError>, date: NaiveDate) {
        if self.generation(&mutation.key) != mutation.generation {
            tracing::debug!("Stale result for cell {}, keeping newer state", mutation.key);
            return;
        }

        match result {
            Ok(()) => self.drop_cell(&mutation.key),
            Err(e) => {
                tracing::warn!("Cell {} failed to save: {}", mutation.key, e);
                self.put(mutation.key, CellCardData {
                    state: CellPhase::Error,
                    value: mutation.title.clone(),
                    date,
                });
            }
        }
    }
}
