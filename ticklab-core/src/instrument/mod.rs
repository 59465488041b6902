//! Instruments — tradable entities with raw book state and derived features.
//!
//! An instrument is created lazily from the first update that references an
//! unknown id, then owned by the registry for the rest of the run. It is
//! mutated only through `update` (raw data) and `update_features` (derived
//! computation).

pub mod book;
pub mod factory;

pub use book::BookInstrument;
pub use factory::{BookInstrumentFactory, InstrumentFactory};

use thiserror::Error;

use crate::domain::{BookData, InstrumentId, InstrumentKind, InstrumentUpdate, Timestamp};
use crate::features::{FeatureError, FeatureValues};

/// Trait for instruments held by the registry.
pub trait Instrument: Send {
    fn id(&self) -> &InstrumentId;

    fn kind(&self) -> InstrumentKind;

    /// Apply one raw update to the instrument's state.
    fn update(&mut self, update: &InstrumentUpdate) -> Result<(), InstrumentError>;

    /// Recompute derived features as of `time`.
    fn update_features(&mut self, time: Timestamp) -> Result<(), InstrumentError>;

    fn features(&self) -> &FeatureValues;

    /// Latest merged book.
    fn book(&self) -> &BookData;

    fn last_update_time(&self) -> Option<Timestamp>;
}

#[derive(Debug, Error, PartialEq)]
pub enum InstrumentError {
    #[error("update for '{got}' applied to instrument '{expected}'")]
    WrongInstrument {
        expected: InstrumentId,
        got: InstrumentId,
    },

    #[error("instrument '{instrument}': {source}")]
    Feature {
        instrument: InstrumentId,
        #[source]
        source: FeatureError,
    },

    #[error("instrument '{instrument}' rejected update: {reason}")]
    Rejected {
        instrument: InstrumentId,
        reason: String,
    },
}
