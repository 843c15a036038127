//! Windowed list of week rows.
//!
//! The list covers a fixed window of week indices centred on the week that
//! was current at mount time. Rows have a fixed height per layout mode, so
//! every offset is computed rather than measured.

use chrono::{Datelike, NaiveDate};
use std::ops::Range;

use crate::calendar::week_index::{WeekCalendar, WeekIndex};

/// Columns in the multi-column layout: seven weekdays plus the summary.
pub const GRID_COLUMNS: u32 = 8;
/// Stacked blocks per week in the single-column layout.
pub const STACKED_SLOTS: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListSettings {
    pub window_weeks: u32,
    pub visibility_threshold_percent: u8,
    pub layout_breakpoint: u16,
    pub row_height: u32,
    pub stacked_cell_height: u32,
    pub overscan: u32,
}

impl Default for ListSettings {
    fn default() -> Self {
        Self {
            window_weeks: 520,
            visibility_threshold_percent: 50,
            layout_breakpoint: 100,
            row_height: 4,
            stacked_cell_height: 2,
            overscan: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    MultiColumn,
    SingleColumn,
}

impl LayoutMode {
    pub fn for_width(width: u16, breakpoint: u16) -> Self {
        if width >= breakpoint {
            LayoutMode::MultiColumn
        } else {
            LayoutMode::SingleColumn
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleWeek {
    pub week_index: WeekIndex,
    pub start_date: NaiveDate,
    pub month: u32,
    pub year: i32,
}

pub type VisibleWeekListener = Box<dyn FnMut(&VisibleWeek) + Send>;

pub struct WeekListView {
    calendar: WeekCalendar,
    settings: ListSettings,
    first_week: WeekIndex,
    layout: LayoutMode,
    viewport_height: u32,
    scroll_offset: u32,
    scroll_enabled: bool,
    last_reported: Option<VisibleWeek>,
    listeners: Vec<VisibleWeekListener>,
}

impl WeekListView {
    pub fn new(calendar: WeekCalendar, settings: ListSettings, today: NaiveDate) -> Self {
        let center = calendar.date_to_week_index(today);
        let first_week = center - i64::from(settings.window_weeks / 2);
        Self {
            calendar,
            settings,
            first_week,
            layout: LayoutMode::MultiColumn,
            viewport_height: 0,
            scroll_offset: 0,
            scroll_enabled: true,
            last_reported: None,
            listeners: Vec::new(),
        }
    }

    /// Builds the list for a viewport and scrolls to the current week.
    pub fn mount(
        calendar: WeekCalendar,
        settings: ListSettings,
        today: NaiveDate,
        width: u16,
        height: u32,
    ) -> Self {
        let mut list = Self::new(calendar, settings, today);
        list.set_viewport(width, height);
        list.scroll_to_week_index(calendar.date_to_week_index(today));
        list
    }

    pub fn calendar(&self) -> &WeekCalendar {
        &self.calendar
    }

    pub fn settings(&self) -> &ListSettings {
        &self.settings
    }

    pub fn window(&self) -> Range<WeekIndex> {
        self.first_week..self.first_week + i64::from(self.settings.window_weeks)
    }

    pub fn contains(&self, week_index: WeekIndex) -> bool {
        self.window().contains(&week_index)
    }

    pub fn layout(&self) -> LayoutMode {
        self.layout
    }

    pub fn row_height(&self) -> u32 {
        match self.layout {
            LayoutMode::MultiColumn => self.settings.row_height,
            LayoutMode::SingleColumn => self.settings.stacked_cell_height * STACKED_SLOTS,
        }
    }

    pub fn viewport_height(&self) -> u32 {
        self.viewport_height
    }

    pub fn scroll_offset(&self) -> u32 {
        self.scroll_offset
    }

    pub fn is_scroll_enabled(&self) -> bool {
        self.scroll_enabled
    }

    pub fn set_scroll_enabled(&mut self, enabled: bool) {
        self.scroll_enabled = enabled;
    }

    pub fn content_height(&self) -> u32 {
        self.settings.window_weeks.saturating_mul(self.row_height())
    }

    fn max_offset(&self) -> u32 {
        self.content_height().saturating_sub(self.viewport_height)
    }

    /// Offset of a row's top edge from the top of the content.
    pub fn offset_for(&self, week_index: WeekIndex) -> Option<u32> {
        if !self.contains(week_index) {
            return None;
        }
        let row = (week_index - self.first_week) as u32;
        Some(row.saturating_mul(self.row_height()))
    }

    /// Offset of a row's top edge from the top of the viewport.
    pub fn row_top(&self, week_index: WeekIndex) -> Option<i64> {
        self.offset_for(week_index)
            .map(|offset| i64::from(offset) - i64::from(self.scroll_offset))
    }

    /// Returns `false` and leaves the position alone when the week lies
    /// outside the rendered window.
    pub fn scroll_to_week_index(&mut self, week_index: WeekIndex) -> bool {
        let Some(offset) = self.offset_for(week_index) else {
            tracing::debug!("Week {} is outside the rendered window", week_index);
            return false;
        };
        self.scroll_offset = offset.min(self.max_offset());
        true
    }

    /// User scroll. Ignored while a drag holds the scroll lock.
    pub fn scroll_by(&mut self, delta: i64) -> bool {
        if !self.scroll_enabled {
            return false;
        }
        let target = (i64::from(self.scroll_offset) + delta).clamp(0, i64::from(self.max_offset()));
        let changed = target as u32 != self.scroll_offset;
        self.scroll_offset = target as u32;
        changed
    }

    pub fn set_viewport(&mut self, width: u16, height: u32) {
        let anchor = self.top_week();
        self.layout = LayoutMode::for_width(width, self.settings.layout_breakpoint);
        self.viewport_height = height;

        if let Some(offset) = anchor.and_then(|week| self.offset_for(week)) {
            self.scroll_offset = offset;
        }
        self.scroll_offset = self.scroll_offset.min(self.max_offset());
    }

    fn top_week(&self) -> Option<WeekIndex> {
        let row_height = self.row_height();
        if row_height == 0 || self.viewport_height == 0 {
            return None;
        }
        Some(self.first_week + i64::from(self.scroll_offset / row_height))
    }

    /// Week indices to render: the rows on screen plus overscan, clamped to
    /// the window.
    pub fn visible_range(&self) -> Range<WeekIndex> {
        let row_height = self.row_height();
        if row_height == 0 || self.viewport_height == 0 {
            return self.first_week..self.first_week;
        }
        let first_row = self.scroll_offset / row_height;
        let end_row = (self.scroll_offset + self.viewport_height).div_ceil(row_height);

        let start = first_row.saturating_sub(self.settings.overscan);
        let end = (end_row + self.settings.overscan).min(self.settings.window_weeks);

        self.first_week + i64::from(start)..self.first_week + i64::from(end)
    }

    /// First row whose on-screen share reaches the visibility threshold. When
    /// no row does (a viewport shorter than the threshold share of a row), the
    /// most visible row is used.
    pub fn first_visible_week(&self) -> Option<VisibleWeek> {
        let row_height = self.row_height();
        if row_height == 0 || self.viewport_height == 0 {
            return None;
        }
        let threshold = u64::from(self.settings.visibility_threshold_percent);
        let viewport_end = self.scroll_offset + self.viewport_height;
        let mut best: Option<(u32, WeekIndex)> = None;

        let mut row = self.scroll_offset / row_height;
        while row < self.settings.window_weeks {
            let top = row * row_height;
            if top >= viewport_end {
                break;
            }
            let bottom = top + row_height;
            let shown = bottom.min(viewport_end) - top.max(self.scroll_offset);
            let week_index = self.first_week + i64::from(row);

            if u64::from(shown) * 100 >= threshold * u64::from(row_height) {
                return Some(self.describe(week_index));
            }
            if best.is_none_or(|(most, _)| shown > most) {
                best = Some((shown, week_index));
            }
            row += 1;
        }

        best.map(|(_, week_index)| self.describe(week_index))
    }

    fn describe(&self, week_index: WeekIndex) -> VisibleWeek {
        let start_date = self.calendar.week_index_to_start_date(week_index);
        VisibleWeek {
            week_index,
            start_date,
            month: start_date.month(),
            year: start_date.year(),
        }
    }

    pub fn on_visible_week_change(&mut self, listener: VisibleWeekListener) {
        self.listeners.push(listener);
    }

    /// Called once scrolling has come to rest. Notifies listeners when the
    /// first visible week changed since the previous report.
    pub fn settle(&mut self) -> Option<VisibleWeek> {
        let current = self.first_visible_week()?;
        if self.last_reported == Some(current) {
            return None;
        }
        self.last_reported = Some(current);
        for listener in &mut self.listeners {
            listener(&current);
        }
        Some(current)
    }

    pub fn last_reported(&self) -> Option<VisibleWeek> {
        self.last_reported
    }
}
