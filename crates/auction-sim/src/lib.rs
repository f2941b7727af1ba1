//! Replays a scenario of timed trades against a Dutch auction pool and
//! writes the slug layout after every trade as JSON lines.
pub mod cli;
pub mod config;
mod run;
pub mod snapshot;

pub use run::{Summary, run, start};
