//! Backtesting engine — instrument registry, feature throttle and the
//! update-driven event loop.
//!
//! The engine consumes a stream of instrument updates and decides *when* to
//! apply them, *when* to recompute features across all instruments, and
//! *when* to ask the execution resolver for decisions. It never decides
//! *how* features or executions are computed.

pub mod error;
pub mod params;
pub mod registry;
pub mod scheduler;
pub mod stats;
pub mod throttle;

pub use error::EngineError;
pub use params::{OrderingPolicy, SystemParameters};
pub use registry::{InstrumentRegistry, RegistryError};
pub use scheduler::{RunSummary, UpdateOutcome, UpdateScheduler};
pub use stats::FeaturePassStats;
pub use throttle::FeatureThrottle;
