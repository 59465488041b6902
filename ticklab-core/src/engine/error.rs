use thiserror::Error;

use crate::domain::{InstrumentId, Timestamp};
use crate::execution::{ExecutionError, SinkError};
use crate::instrument::InstrumentError;
use crate::source::SourceError;

use super::registry::RegistryError;

/// Anything that halts a run.
///
/// The only condition the scheduler swallows is an update no instrument can
/// be created for; every other downstream failure ends up here.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Instrument(#[from] InstrumentError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("update for '{instrument}' at {timestamp} is older than the latest processed time {latest}")]
    OutOfOrder {
        instrument: InstrumentId,
        timestamp: Timestamp,
        latest: Timestamp,
    },
}
