pub mod activity;
pub mod config;
pub mod drill;
pub mod embed;
pub mod error;
pub mod io;
pub mod ordering;
pub mod paths;
pub mod plan;
pub mod play;
pub mod queue;
pub mod record;
pub mod roster;
pub mod scouting;
pub mod sequencer;
pub mod session;
pub mod store;
pub mod types;

#[cfg(test)]
mod testing;

pub use error::{CourtflowError, Result};
