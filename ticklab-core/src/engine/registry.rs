//! Instrument registry — owns every tracked instrument, keyed by id.
//!
//! Invariant: an id is present iff an instrument was successfully created for
//! it, and there is never more than one entry per id.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use thiserror::Error;

use crate::domain::{InstrumentId, InstrumentUpdate, Timestamp};
use crate::instrument::{Instrument, InstrumentError};

use super::params::SystemParameters;

#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("instrument '{0}' is already registered")]
    Duplicate(InstrumentId),

    #[error("instrument '{0}' is not registered")]
    Missing(InstrumentId),
}

#[derive(Default)]
pub struct InstrumentRegistry {
    instruments: HashMap<InstrumentId, Box<dyn Instrument>>,
}

impl InstrumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &InstrumentId) -> Option<&dyn Instrument> {
        self.instruments.get(id).map(|i| &**i)
    }

    pub fn get_mut(&mut self, id: &InstrumentId) -> Option<&mut (dyn Instrument + 'static)> {
        self.instruments.get_mut(id).map(|i| &mut **i)
    }

    pub fn contains(&self, id: &InstrumentId) -> bool {
        self.instruments.contains_key(id)
    }

    /// Ask the configured factory for a new instrument. Does not register it.
    pub fn create_instrument_from_update(
        &self,
        update: &InstrumentUpdate,
        params: &SystemParameters,
    ) -> Result<Option<Box<dyn Instrument>>, InstrumentError> {
        params.instrument_factory().create(update)
    }

    /// Insert-if-absent. A second insert for the same id fails and leaves the
    /// registered instrument untouched.
    pub fn insert(
        &mut self,
        instrument: Box<dyn Instrument>,
    ) -> Result<&mut (dyn Instrument + 'static), RegistryError> {
        match self.instruments.entry(instrument.id().clone()) {
            Entry::Occupied(e) => Err(RegistryError::Duplicate(e.key().clone())),
            Entry::Vacant(e) => Ok(&mut **e.insert(instrument)),
        }
    }

    /// Recompute features of every registered instrument as of `time`.
    ///
    /// The first failure aborts the pass; instruments visited before it keep
    /// their new values.
    pub fn update_features(&mut self, time: Timestamp) -> Result<(), InstrumentError> {
        for instrument in self.instruments.values_mut() {
            instrument.update_features(time)?;
        }
        Ok(())
    }

    pub fn ids(&self) -> impl Iterator<Item = &InstrumentId> {
        self.instruments.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&InstrumentId, &dyn Instrument)> {
        self.instruments.iter().map(|(id, i)| (id, &**i))
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}

impl std::fmt::Debug for InstrumentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<&InstrumentId> = self.instruments.keys().collect();
        ids.sort();
        f.debug_struct("InstrumentRegistry").field("instruments", &ids).finish()
    }
}
