use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event as TermEvent, KeyCode, KeyEventKind,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};

use workout_grid::{
    grid::{CellKey, CellView, DropOutcome, DropRejection, GridGeometry, MutationKind, Settlement, WorkoutGrid},
    storage::Config,
    store::WorkoutStore,
};

use crate::tui::presentation::{areas, geometry, ui, Areas};

const TICK: Duration = Duration::from_millis(50);

pub struct Session {
    pub grid: WorkoutGrid,
    pub selected: CellKey,
    pub today: NaiveDate,
    pub status: Option<String>,
    pub areas: Areas,
}

impl Session {
    fn new(grid: WorkoutGrid, today: NaiveDate, areas: Areas) -> Self {
        let selected = grid.calendar().cell_key(today);
        Self { grid, selected, today, status: None, areas }
    }

    pub fn geometry(&self) -> GridGeometry {
        geometry(&self.grid, self.areas.grid)
    }

    fn is_typing(&self) -> bool {
        matches!(self.grid.cell_view(self.selected), CellView::Editing { .. })
    }

    fn typed_text(&self) -> String {
        match self.grid.cell_view(self.selected) {
            CellView::Editing { value, .. } => value,
            _ => String::new(),
        }
    }

    fn resize(&mut self, size: Rect) {
        self.areas = areas(size);
        self.grid
            .list_mut()
            .set_viewport(self.areas.grid.width, u32::from(self.areas.grid.height));
    }

    fn move_selection(&mut self, weeks: i64, days: i64) {
        let mut week = self.selected.week_index + weeks;
        let mut day = i64::from(self.selected.day_index) + days;
        if day < 0 {
            week -= 1;
            day = 6;
        } else if day > 6 {
            week += 1;
            day = 0;
        }
        if !self.grid.list().contains(week) {
            return;
        }
        self.selected = CellKey::new(week, day as u8);
        self.ensure_visible(week);
    }

    fn ensure_visible(&mut self, week: i64) {
        let list = self.grid.list_mut();
        let row_height = i64::from(list.row_height());
        let viewport = i64::from(list.viewport_height());
        let Some(top) = list.row_top(week) else {
            return;
        };
        if top < 0 {
            list.scroll_by(top);
        } else if top + row_height > viewport {
            list.scroll_by(top + row_height - viewport);
        }
    }

    fn page(&mut self, direction: i64) {
        let row_height = i64::from(self.grid.list().row_height());
        self.grid.list_mut().scroll_by(direction * row_height);
        self.move_selection(direction, 0);
    }

    fn jump_to_today(&mut self) {
        self.selected = self.grid.calendar().cell_key(self.today);
        self.grid.list_mut().scroll_to_week_index(self.selected.week_index);
    }

    fn report_settlement(&mut self, settled: Settlement) {
        let date = self.grid.cell_date(settled.key);
        self.status = match (settled.kind, settled.result) {
            (MutationKind::Delete, Ok(_)) => Some(format!("Deleted workout on {}", date)),
            (MutationKind::Reassign, Ok(Some(workout))) => {
                Some(format!("Moved {} to {}", workout.title, workout.date))
            }
            (MutationKind::Reassign, Err(e)) => Some(format!("Failed to move workout: {}", e)),
            (_, Err(e)) => Some(format!("Could not save {}: {}", date, e)),
            (_, Ok(_)) => return,
        };
    }

    fn report_drop(&mut self, outcome: DropOutcome) {
        self.status = match outcome {
            DropOutcome::Moved(workout) => Some(format!("Moving {} to {}", workout.title, workout.date)),
            DropOutcome::Rejected(DropRejection::Occupied) => Some("That day already has a workout".to_string()),
            DropOutcome::Rejected(DropRejection::TargetEditing) => Some("That day is being edited".to_string()),
            DropOutcome::Rejected(DropRejection::TargetHasDraft) => {
                Some("That day has an unsaved workout".to_string())
            }
            DropOutcome::Rejected(DropRejection::SameDate) | DropOutcome::NoTarget => return,
        };
    }
}

pub async fn run_tui(store: Arc<dyn WorkoutStore>, config: &Config) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let today = Local::now().date_naive();
    let layout = areas(terminal.size()?);
    let mut grid = WorkoutGrid::from_config(
        store,
        config,
        today,
        layout.grid.width,
        u32::from(layout.grid.height),
    );
    grid.set_haptic(Box::new(|| tracing::debug!("Drag activated")));
    grid.list_mut().on_visible_week_change(Box::new(|week| {
        tracing::debug!("Showing week {} ({}/{})", week.week_index, week.month, week.year);
    }));

    let mut session = Session::new(grid, today, layout);
    if let Err(e) = session.grid.load().await {
        tracing::error!("Failed to load workouts: {}", e);
        session.status = Some(format!("Failed to load workouts: {}", e));
    }

    let res = run_app(&mut terminal, &mut session).await;
    if session.grid.is_busy() {
        tracing::info!("Waiting for {} store calls before exit", session.grid.in_flight());
        session.grid.wait_idle().await;
    }

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    session: &mut Session,
) -> io::Result<()> {
    loop {
        for settled in session.grid.poll_store() {
            session.report_settlement(settled);
        }
        session.grid.list_mut().settle();
        terminal.draw(|f| ui(f, session))?;

        if event::poll(TICK)? {
            match event::read()? {
                TermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                    if handle_key(key.code, session) {
                        return Ok(());
                    }
                }
                TermEvent::Mouse(mouse) => handle_mouse(mouse, session),
                TermEvent::Resize(width, height) => session.resize(Rect::new(0, 0, width, height)),
                _ => {}
            }
        }

        session.grid.drag_tick(Instant::now());
    }
}

fn handle_key(code: KeyCode, session: &mut Session) -> bool {
    let key = session.selected;

    if session.is_typing() {
        match code {
            KeyCode::Enter => {
                session.grid.submit(key);
                session.status = None;
            }
            KeyCode::Esc => {
                session.grid.cancel_edit(key);
            }
            KeyCode::Backspace => {
                let mut text = session.typed_text();
                text.pop();
                session.grid.change_text(key, &text);
            }
            KeyCode::Char(c) => {
                let mut text = session.typed_text();
                text.push(c);
                session.grid.change_text(key, &text);
            }
            _ => {}
        }
        return false;
    }

    match code {
        KeyCode::Char('q') => return true,
        KeyCode::Left | KeyCode::Char('h') => session.move_selection(0, -1),
        KeyCode::Right | KeyCode::Char('l') => session.move_selection(0, 1),
        KeyCode::Up | KeyCode::Char('k') => session.move_selection(-1, 0),
        KeyCode::Down | KeyCode::Char('j') => session.move_selection(1, 0),
        KeyCode::PageUp => session.page(-1),
        KeyCode::PageDown => session.page(1),
        KeyCode::Char('t') => session.jump_to_today(),
        KeyCode::Enter => {
            session.grid.press_cell(key);
        }
        KeyCode::Char(' ') => {
            session.grid.cycle_status(key);
        }
        KeyCode::Char('x') => {
            session.grid.delete(key);
        }
        KeyCode::Esc => {
            session.grid.drag_terminate();
            session.status = None;
        }
        _ => {}
    }
    false
}

fn handle_mouse(mouse: MouseEvent, session: &mut Session) {
    let at = workout_grid::grid::Point::new(i32::from(mouse.column), i32::from(mouse.row));
    let now = Instant::now();

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some(key) = session.geometry().cell_at(at) {
                session.selected = key;
                session.grid.drag_begin(key, at, now);
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => session.grid.drag_motion(at, now),
        MouseEventKind::Up(MouseButton::Left) => {
            let geometry = session.geometry();
            let outcome = session.grid.drag_end(at, &geometry);
            session.report_drop(outcome);
        }
        MouseEventKind::ScrollUp => {
            session.grid.list_mut().scroll_by(-1);
        }
        MouseEventKind::ScrollDown => {
            session.grid.list_mut().scroll_by(1);
        }
        _ => {}
    }
}
