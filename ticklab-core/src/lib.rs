//! TickLab Core — domain types, instruments, features, and the update-driven event loop.
//!
//! This crate contains the heart of the backtesting engine:
//! - Domain types (instrument ids, logical time, updates, book data)
//! - Instruments with lazily computed derived features
//! - Instrument registry with insert-if-absent registration
//! - Feature throttle bounding recomputation to one pass per interval
//! - Update scheduler sequencing apply → recompute → execute
//! - Execution resolver and sink seams, update source seam

pub mod domain;
pub mod engine;
pub mod execution;
pub mod features;
pub mod instrument;
pub mod source;

pub use domain::{BookData, InstrumentId, InstrumentKind, InstrumentUpdate, Interval, Timestamp};
pub use engine::{
    EngineError, InstrumentRegistry, OrderingPolicy, RunSummary, SystemParameters, UpdateOutcome,
    UpdateScheduler,
};
