mod presentation;
mod sample_workouts;
mod session;

pub use sample_workouts::sample_workouts;
pub use session::run_tui;
