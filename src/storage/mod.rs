pub mod config;
pub mod database;
pub mod memory;

pub use config::Config;
pub use database::{shared_store, DatabaseError, SqliteWorkoutStore};
pub use memory::InMemoryWorkoutStore;
