//! Presence tracking for a single user: samples system idle time on a fixed interval, flips
//! between online and away, and notifies subscribers on every transition as well as while the
//! user stays in a status past a chosen duration (`away:5000`, `online:3600000`).
//!

pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod idle;
pub mod status;
pub mod tracker;
pub mod utils;

pub use config::TrackerConfig;
pub use error::{PresenceError, Result};
pub use events::{emitter::Listener, Event, StatusChange};
pub use status::Status;
pub use tracker::PresenceTracker;
