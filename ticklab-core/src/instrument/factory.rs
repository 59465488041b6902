//! Instrument factories — seed a new instrument from its first update.

use std::sync::Arc;

use crate::domain::{InstrumentKind, InstrumentUpdate};
use crate::features::Feature;

use super::{BookInstrument, Instrument, InstrumentError};

/// Builds instruments for ids the registry has not seen yet.
///
/// `Ok(None)` means the update cannot seed a valid instrument (for example an
/// unsupported type). The scheduler skips such updates silently. `Err` is a
/// genuine failure and halts the run.
pub trait InstrumentFactory: Send {
    fn create(&self, update: &InstrumentUpdate)
        -> Result<Option<Box<dyn Instrument>>, InstrumentError>;
}

impl<F> InstrumentFactory for F
where
    F: Fn(&InstrumentUpdate) -> Result<Option<Box<dyn Instrument>>, InstrumentError> + Send,
{
    fn create(
        &self,
        update: &InstrumentUpdate,
    ) -> Result<Option<Box<dyn Instrument>>, InstrumentError> {
        self(update)
    }
}

/// Creates a `BookInstrument` for every supported kind.
#[derive(Clone)]
pub struct BookInstrumentFactory {
    supported: Vec<InstrumentKind>,
    features: Arc<[Arc<dyn Feature>]>,
    history_len: usize,
}

impl BookInstrumentFactory {
    pub fn new(
        supported: Vec<InstrumentKind>,
        features: Vec<Arc<dyn Feature>>,
        history_len: usize,
    ) -> Self {
        Self {
            supported,
            features: features.into(),
            history_len,
        }
    }

    pub fn supports(&self, kind: InstrumentKind) -> bool {
        kind != InstrumentKind::Unknown && self.supported.contains(&kind)
    }
}

impl InstrumentFactory for BookInstrumentFactory {
    fn create(
        &self,
        update: &InstrumentUpdate,
    ) -> Result<Option<Box<dyn Instrument>>, InstrumentError> {
        if !self.supports(update.kind) {
            return Ok(None);
        }
        Ok(Some(Box::new(BookInstrument::new(
            update.instrument_id.clone(),
            update.kind,
            Arc::clone(&self.features),
            self.history_len,
        ))))
    }
}
