use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::calendar::WeekCalendar;
use crate::grid::drag::DragModality;
use crate::grid::week_list::ListSettings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub calendar: CalendarConfig,
    pub grid: GridConfig,
    pub drag: DragConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarConfig {
    pub first_day_of_week: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GridConfig {
    pub window_weeks: u32,
    pub visibility_threshold_percent: u8,
    pub layout_breakpoint: u16,
    pub row_height: u16,
    pub stacked_cell_height: u16,
    pub overscan: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DragConfig {
    pub modality: DragModality,
    pub long_press_ms: u64,
    pub touch_slop: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    pub database_path: PathBuf,
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }

    pub fn load_or_create() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("workout-grid")
            .join("config.toml")
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    pub fn first_day_of_week(&self) -> Weekday {
        match self.calendar.first_day_of_week.parse::<Weekday>() {
            Ok(day) => day,
            Err(_) => {
                tracing::warn!(
                    "Unknown first_day_of_week '{}', using Monday",
                    self.calendar.first_day_of_week
                );
                Weekday::Mon
            }
        }
    }

    pub fn week_calendar(&self) -> WeekCalendar {
        WeekCalendar::new(self.first_day_of_week())
    }

    pub fn list_settings(&self) -> ListSettings {
        ListSettings {
            window_weeks: self.grid.window_weeks.max(1),
            visibility_threshold_percent: self.grid.visibility_threshold_percent.clamp(1, 100),
            layout_breakpoint: self.grid.layout_breakpoint,
            row_height: u32::from(self.grid.row_height.max(1)),
            stacked_cell_height: u32::from(self.grid.stacked_cell_height.max(1)),
            overscan: u32::from(self.grid.overscan),
        }
    }

    pub fn long_press_delay(&self) -> Duration {
        Duration::from_millis(self.drag.long_press_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("workout-grid");

        Self {
            calendar: CalendarConfig {
                first_day_of_week: "Monday".to_string(),
            },
            grid: GridConfig {
                window_weeks: 520,
                visibility_threshold_percent: 50,
                layout_breakpoint: 100,
                row_height: 4,
                stacked_cell_height: 2,
                overscan: 2,
            },
            drag: DragConfig {
                modality: DragModality::Pointer,
                long_press_ms: 300,
                touch_slop: 2,
            },
            storage: StorageConfig {
                database_path: data_dir.join("workouts.db"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_starts_weeks_on_monday() {
        let config = Config::default();
        assert_eq!(config.first_day_of_week(), Weekday::Mon);
    }

    #[test]
    fn default_config_renders_ten_years_of_weeks() {
        let config = Config::default();
        assert_eq!(config.grid.window_weeks, 520);
    }

    #[test]
    fn default_config_uses_pointer_drag() {
        let config = Config::default();
        assert_eq!(config.drag.modality, DragModality::Pointer);
        assert_eq!(config.long_press_delay(), Duration::from_millis(300));
    }

    #[test]
    fn parse_valid_toml_config() {
        let toml_content = r#"
            [calendar]
            first_day_of_week = "Sunday"

            [grid]
            window_weeks = 104
            visibility_threshold_percent = 60
            layout_breakpoint = 120
            row_height = 5
            stacked_cell_height = 3
            overscan = 1

            [drag]
            modality = "touch"
            long_press_ms = 450
            touch_slop = 3

            [storage]
            database_path = "/tmp/workouts.db"
        "#;

        let config = Config::from_toml(toml_content).unwrap();

        assert_eq!(config.first_day_of_week(), Weekday::Sun);
        assert_eq!(config.grid.window_weeks, 104);
        assert_eq!(config.drag.modality, DragModality::Touch);
        assert_eq!(config.storage.database_path, PathBuf::from("/tmp/workouts.db"));
        assert_eq!(config.list_settings().row_height, 5);
    }

    #[test]
    fn unknown_week_start_falls_back_to_monday() {
        let mut config = Config::default();
        config.calendar.first_day_of_week = "Someday".to_string();
        assert_eq!(config.first_day_of_week(), Weekday::Mon);
    }

    #[test]
    fn parse_invalid_toml_returns_error() {
        let invalid_toml = "this is not valid toml";
        let result = Config::from_toml(invalid_toml);
        assert!(result.is_err());
    }

    #[test]
    fn default_config_survives_toml_round_trip() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(Config::from_toml(&text).unwrap(), config);
    }
}
