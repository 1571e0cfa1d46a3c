//! Tournament lifecycle engine: registration, seeding, round robin and
//! bracket play, live standings, career stats and tournament teardown.

pub mod actions;
pub mod config;
pub mod deletion;
pub mod error;
pub mod events;
pub mod importer;
pub mod live;
pub mod matchgen;
pub mod phase;
pub mod registration;
pub mod scoring;
pub mod seeding;
pub mod state;
pub mod stats;

pub use error::{EngineError, Result};
pub use state::AppState;
