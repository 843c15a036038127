pub mod week_index;

pub use week_index::{reference_date, week_number, DayInfo, WeekCalendar, WeekIndex};
