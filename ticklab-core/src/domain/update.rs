//! InstrumentUpdate — the fundamental market data event.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::ids::InstrumentId;
use super::time::Timestamp;

/// Instrument type carried by an update.
///
/// Any type string the engine does not recognize deserializes to `Unknown`,
/// which no built-in factory accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentKind {
    Stock,
    Future,
    Crypto,
    #[serde(other)]
    Unknown,
}

impl InstrumentKind {
    /// Parse a type string, case-insensitively. Never fails.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "stock" => InstrumentKind::Stock,
            "future" => InstrumentKind::Future,
            "crypto" => InstrumentKind::Crypto,
            _ => InstrumentKind::Unknown,
        }
    }
}

impl fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InstrumentKind::Stock => "stock",
            InstrumentKind::Future => "future",
            InstrumentKind::Crypto => "crypto",
            InstrumentKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Book fields by name (`price`, `bid`, `ask`, `volume`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookData(BTreeMap<String, f64>);

impl BookData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: f64) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: f64) {
        self.0.insert(field.into(), value);
    }

    pub fn get(&self, field: &str) -> Option<f64> {
        self.0.get(field).copied()
    }

    /// Overwrite fields present in `other`; fields absent from `other` keep their value.
    pub fn merge(&mut self, other: &BookData) {
        for (field, value) in &other.0 {
            self.0.insert(field.clone(), *value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, f64)> for BookData {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One timestamped raw data event for a single instrument.
///
/// Immutable once produced; the scheduler consumes each update exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentUpdate {
    pub instrument_id: InstrumentId,
    pub kind: InstrumentKind,
    pub timestamp: Timestamp,
    pub book: BookData,
}

impl InstrumentUpdate {
    pub fn new(
        instrument_id: impl Into<InstrumentId>,
        kind: InstrumentKind,
        timestamp: Timestamp,
        book: BookData,
    ) -> Self {
        Self {
            instrument_id: instrument_id.into(),
            kind,
            timestamp,
            book,
        }
    }

    pub fn instrument_id(&self) -> &InstrumentId {
        &self.instrument_id
    }

    pub fn time_of_update(&self) -> Timestamp {
        self.timestamp
    }
}
