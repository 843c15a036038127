use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::grid::cell::CellKey;

/// Week index zero is the week containing this date (2024-01-01).
pub fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}

pub type WeekIndex = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayInfo {
    pub date: NaiveDate,
    pub day_of_month: u32,
    pub is_today: bool,
    pub is_weekend: bool,
}

/// Maps calendar dates to week indices for a given first day of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekCalendar {
    first_day: Weekday,
}

impl Default for WeekCalendar {
    fn default() -> Self {
        Self::new(Weekday::Mon)
    }
}

impl WeekCalendar {
    pub fn new(first_day: Weekday) -> Self {
        Self { first_day }
    }

    pub fn first_day(&self) -> Weekday {
        self.first_day
    }

    pub fn week_start(&self, date: NaiveDate) -> NaiveDate {
        let offset = self.day_offset(date);
        date.checked_sub_days(Days::new(offset as u64))
            .unwrap_or(date)
    }

    pub fn week_index_to_start_date(&self, index: WeekIndex) -> NaiveDate {
        let reference = self.week_start(reference_date());
        let days = index.saturating_mul(7);
        let shifted = if days >= 0 {
            reference.checked_add_days(Days::new(days as u64))
        } else {
            reference.checked_sub_days(Days::new(days.unsigned_abs()))
        };

        match shifted {
            Some(date) => date,
            None if days >= 0 => self.week_start(NaiveDate::MAX),
            None => self.week_start(NaiveDate::MIN),
        }
    }

    pub fn date_to_week_index(&self, date: NaiveDate) -> WeekIndex {
        let reference = self.week_start(reference_date());
        let days = (self.week_start(date) - reference).num_days();
        days.div_euclid(7)
    }

    pub fn week_info(&self, week_start: NaiveDate, today: NaiveDate) -> [DayInfo; 7] {
        std::array::from_fn(|offset| {
            let date = week_start
                .checked_add_days(Days::new(offset as u64))
                .unwrap_or(week_start);
            DayInfo {
                date,
                day_of_month: date.day(),
                is_today: date == today,
                is_weekend: matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
            }
        })
    }

    /// Dates of the week with the given index, first day first.
    pub fn week_dates(&self, index: WeekIndex) -> [NaiveDate; 7] {
        let start = self.week_index_to_start_date(index);
        std::array::from_fn(|offset| {
            start.checked_add_days(Days::new(offset as u64)).unwrap_or(start)
        })
    }

    pub fn cell_date(&self, key: CellKey) -> NaiveDate {
        let start = self.week_index_to_start_date(key.week_index);
        start.checked_add_days(Days::new(u64::from(key.day_index.min(6))))
            .unwrap_or(start)
    }

    pub fn cell_key(&self, date: NaiveDate) -> CellKey {
        CellKey::new(self.date_to_week_index(date), self.day_offset(date) as u8)
    }

    fn day_offset(&self, date: NaiveDate) -> u32 {
        let day = date.weekday().num_days_from_monday();
        let first = self.first_day.num_days_from_monday();
        (day + 7 - first) % 7
    }
}

/// ISO-8601 week of the year, starting at 1.
pub fn week_number(date: NaiveDate) -> u32 {
    date.iso_week().week()
}
