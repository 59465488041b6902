//! Domain types for TickLab

pub mod ids;
pub mod time;
pub mod update;

pub use ids::InstrumentId;
pub use time::{Interval, Timestamp};
pub use update::{BookData, InstrumentKind, InstrumentUpdate};
