use chrono::Datelike;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use workout_grid::{
    calendar::{week_number, DayInfo},
    grid::{
        aggregation::{daily_buckets, training_totals, BarBucket, Metric},
        drag::CellRect,
        CellKey, CellView, GridGeometry, LayoutMode, Point, WeekSummary, WorkoutGrid,
    },
    workout::WorkoutStatus,
};

use crate::tui::session::Session;

#[derive(Debug, Clone, Copy)]
pub struct Areas {
    pub header: Rect,
    pub weekdays: Rect,
    pub grid: Rect,
    pub status: Rect,
}

pub fn areas(size: Rect) -> Areas {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(size);

    Areas {
        header: chunks[0],
        weekdays: chunks[1],
        grid: chunks[2],
        status: chunks[3],
    }
}

pub fn geometry(grid: &WorkoutGrid, area: Rect) -> GridGeometry {
    GridGeometry::from_list(
        grid.list(),
        Point::new(i32::from(area.x), i32::from(area.y)),
        u32::from(area.width),
    )
}

pub fn ui(f: &mut Frame, session: &Session) {
    let areas = session.areas;
    render_header(f, session, areas.header);
    render_weekdays(f, session, areas.weekdays);
    render_grid(f, session, areas.grid);
    render_proxy(f, session);

    let status_text = session.status.clone().unwrap_or_else(|| {
        "Enter edit | Space status | x delete | t today | drag to move | q quit".to_string()
    });
    let status = Paragraph::new(status_text)
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Center);
    f.render_widget(status, areas.status);
}

fn render_header(f: &mut Frame, session: &Session, area: Rect) {
    let list = session.grid.list();
    let shown = list.last_reported().or_else(|| list.first_visible_week());
    let period = match shown {
        Some(week) => format!(
            "{} {} - week {}",
            month_name(week.month),
            week.year,
            week_number(week.start_date)
        ),
        None => String::new(),
    };
    let totals = training_totals(session.grid.workouts());

    let title = Paragraph::new(format!(
        "workout-grid | {} | {:.0}% completed",
        period,
        totals.completion_rate() * 100.0
    ))
    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, area);
}

fn render_weekdays(f: &mut Frame, session: &Session, area: Rect) {
    let geometry = session.geometry();
    if geometry.layout == LayoutMode::SingleColumn {
        return;
    }
    let column = geometry.column_width();
    let grid = &session.grid;
    let buckets = daily_buckets(grid.calendar(), session.selected.week_index, grid.workouts(), Metric::Duration);
    let bars = day_bars(&buckets);

    for slot in 0..8u32 {
        let label = match buckets.get(slot as usize) {
            Some(bucket) => format!("{} {}", bucket.label, bars[slot as usize]),
            None => "Week".to_string(),
        };
        let x = area.x.saturating_add((slot * column) as u16);
        let cell = Rect::new(x, area.y, column as u16, 1).intersection(area);
        let header = Paragraph::new(label).style(Style::default().fg(Color::Yellow));
        f.render_widget(header, cell);
    }
}

fn render_grid(f: &mut Frame, session: &Session, area: Rect) {
    let geometry = session.geometry();
    let grid = &session.grid;

    for week in grid.list().visible_range() {
        let start = grid.calendar().week_index_to_start_date(week);
        let days = grid.calendar().week_info(start, session.today);
        for slot in 0..8u32 {
            let Some(rect) = geometry.slot_rect(week, slot).and_then(|r| clip(r, area)) else {
                continue;
            };
            if slot == 7 {
                let lines = summary_lines(&grid.week_summary(week), geometry.layout);
                let summary = Paragraph::new(lines).style(Style::default().fg(Color::DarkGray));
                f.render_widget(summary, rect);
                continue;
            }

            let key = CellKey::new(week, slot as u8);
            let day = &days[slot as usize];
            let view = grid.cell_view(key);
            let lines = cell_lines(day, &view, geometry.layout);
            let paragraph = Paragraph::new(lines).style(cell_style(session, key, day, &view));
            f.render_widget(paragraph, rect);
        }
    }
}

fn render_proxy(f: &mut Frame, session: &Session) {
    let (Some(point), Some(payload)) = (session.grid.proxy(), session.grid.dragged()) else {
        return;
    };
    let frame = f.size();
    let width = (payload.workout.title.chars().count() as u16 + 2).min(frame.width);
    let rect = Rect::new(point.x.max(0) as u16, point.y.max(0) as u16, width, 1).intersection(frame);
    if rect.is_empty() {
        return;
    }
    f.render_widget(Clear, rect);
    let proxy = Paragraph::new(format!(" {}", payload.workout.title))
        .style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_widget(proxy, rect);
}

const BAR_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// One bar per day, scaled to the week's busiest day. Days with nothing
/// planned get a blank.
fn day_bars(buckets: &[BarBucket; 7]) -> [char; 7] {
    let max = buckets.iter().map(|b| b.value).fold(0.0, f64::max);
    buckets.each_ref().map(|bucket| {
        if bucket.value <= 0.0 || max <= 0.0 {
            return ' ';
        }
        let level = ((bucket.value / max) * (BAR_LEVELS.len() - 1) as f64).round() as usize;
        BAR_LEVELS[level.min(BAR_LEVELS.len() - 1)]
    })
}

fn clip(rect: CellRect, area: Rect) -> Option<Rect> {
    let top = i64::from(rect.y).max(i64::from(area.y));
    let bottom = (i64::from(rect.y) + i64::from(rect.height)).min(i64::from(area.bottom()));
    let left = i64::from(rect.x).max(i64::from(area.x));
    let right = (i64::from(rect.x) + i64::from(rect.width)).min(i64::from(area.right()));
    if bottom <= top || right <= left {
        return None;
    }
    Some(Rect::new(left as u16, top as u16, (right - left) as u16, (bottom - top) as u16))
}

fn status_icon(status: WorkoutStatus) -> &'static str {
    match status {
        WorkoutStatus::Pending => "○",
        WorkoutStatus::Completed => "●",
        WorkoutStatus::Error => "✗",
    }
}

fn cell_lines(info: &DayInfo, view: &CellView, layout: LayoutMode) -> Vec<Line<'static>> {
    let marker = if info.is_today { "*" } else { " " };
    let day = match layout {
        LayoutMode::MultiColumn => format!("{:>2}{}", info.day_of_month, marker),
        LayoutMode::SingleColumn => format!("{} {:>2}{}", info.date.weekday(), info.day_of_month, marker),
    };

    let body = match view {
        CellView::Empty { .. } => String::new(),
        CellView::Editing { value, .. } => format!("> {}_", value),
        CellView::Draft { title, status, .. } => format!("{} {}", status_icon(*status), title),
        CellView::Workout { workout, status } => format!("{} {}", status_icon(*status), workout.title),
    };
    let detail = match view {
        CellView::Workout { workout, .. } if workout.duration_sec > 0 => format!(
            "  {}m {:.1}km",
            workout.duration_sec / 60,
            f64::from(workout.distance_meters) / 1000.0
        ),
        _ => String::new(),
    };

    match layout {
        LayoutMode::MultiColumn => vec![Line::from(day), Line::from(body), Line::from(detail)],
        LayoutMode::SingleColumn => vec![Line::from(format!("{} {}{}", day, body, detail))],
    }
}

fn cell_style(session: &Session, key: CellKey, info: &DayInfo, view: &CellView) -> Style {
    let mut style = Style::default();
    if view.status() == Some(WorkoutStatus::Error) {
        style = style.fg(Color::Red);
    } else if view.status() == Some(WorkoutStatus::Completed) {
        style = style.fg(Color::Green);
    } else if info.is_weekend {
        style = style.fg(Color::Gray);
    }
    if info.is_today {
        style = style.add_modifier(Modifier::BOLD);
    }
    if session.grid.dragged().is_some_and(|payload| payload.source == key) {
        style = style.add_modifier(Modifier::DIM);
    }
    if key == session.selected {
        style = style.bg(Color::Blue).fg(Color::White);
    }
    style
}

fn summary_lines(summary: &WeekSummary, layout: LayoutMode) -> Vec<Line<'static>> {
    let minutes = format!(
        "{}/{} min",
        summary.duration_sec.value / 60,
        summary.duration_sec.target / 60
    );
    let km = format!(
        "{:.1}/{:.1} km",
        summary.distance_meters.value as f64 / 1000.0,
        summary.distance_meters.target as f64 / 1000.0
    );
    let load = format!("load {:.0}/{:.0}", summary.load.value, summary.load.target);

    match layout {
        LayoutMode::MultiColumn => vec![Line::from(minutes), Line::from(km), Line::from(load)],
        LayoutMode::SingleColumn => vec![Line::from(format!("{} | {} | {}", minutes, km, load))],
    }
}

fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use workout_grid::grid::aggregation::StatusBreakdown;

    fn bucket(day: u32, value: f64) -> BarBucket {
        let date = NaiveDate::from_ymd_opt(2026, 1, 11 + day).unwrap();
        BarBucket {
            label: date.weekday().to_string(),
            date,
            value,
            by_status: StatusBreakdown::default(),
        }
    }

    #[test]
    fn bars_scale_to_busiest_day() {
        let buckets = [0.0, 2700.0, 5400.0, 0.0, 1350.0, 0.0, 0.0]
            .into_iter()
            .enumerate()
            .map(|(day, value)| bucket(day as u32 + 1, value))
            .collect::<Vec<_>>();
        let buckets: [BarBucket; 7] = buckets.try_into().unwrap();

        assert_eq!(day_bars(&buckets), [' ', '▅', '█', ' ', '▃', ' ', ' ']);
    }

    #[test]
    fn empty_week_has_no_bars() {
        let buckets: [BarBucket; 7] = std::array::from_fn(|day| bucket(day as u32 + 1, 0.0));

        assert_eq!(day_bars(&buckets), [' '; 7]);
    }
}
