//! Feature trait and per-instrument feature value store.
//!
//! Features are derived values computed from one instrument's accumulated
//! book history. They are recomputed only during a feature pass, never on
//! every raw update. A feature reads its own instrument's history and
//! nothing else, so the order in which instruments are visited during a
//! pass does not matter.

pub mod builtin;
pub mod factory;
pub mod history;

pub use builtin::{Last, Momentum, MovingAverage, Spread, Vwap};
pub use factory::{create_feature, create_features, FactoryError, FeatureConfig};
pub use history::{BookHistory, Snapshot};

use std::collections::HashMap;
use thiserror::Error;

use crate::domain::Timestamp;

/// Trait for features.
///
/// `compute` returns `Ok(None)` while the history is too short (warmup) or the
/// inputs are not yet present.
pub trait Feature: Send + Sync {
    /// Key under which the value is stored (e.g., "ma_20").
    fn name(&self) -> &str;

    /// Number of snapshots needed before the feature produces a value.
    fn lookback(&self) -> usize;

    fn compute(&self, history: &BookHistory) -> Result<Option<f64>, FeatureError>;
}

#[derive(Debug, Error, PartialEq)]
pub enum FeatureError {
    #[error("feature '{feature}': division by zero ({detail})")]
    DivisionByZero { feature: String, detail: String },

    #[error("feature '{feature}' produced a non-finite value")]
    NonFinite { feature: String },
}

/// A computed feature value and the pass time it belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureValue {
    pub value: Option<f64>,
    pub computed_at: Timestamp,
}

/// Latest feature values for one instrument.
#[derive(Debug, Clone, Default)]
pub struct FeatureValues {
    values: HashMap<String, FeatureValue>,
}

impl FeatureValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: Option<f64>, computed_at: Timestamp) {
        self.values
            .insert(name.into(), FeatureValue { value, computed_at });
    }

    /// Current value, `None` if missing or still warming up.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(|v| v.value)
    }

    pub fn entry(&self, name: &str) -> Option<&FeatureValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_values_set_and_get() {
        let mut fv = FeatureValues::new();
        fv.set("ma_5", Some(101.5), Timestamp(10));
        fv.set("vwap_5", None, Timestamp(10));
        assert_eq!(fv.get("ma_5"), Some(101.5));
        assert_eq!(fv.get("vwap_5"), None);
        assert_eq!(fv.entry("vwap_5").unwrap().computed_at, Timestamp(10));
        assert_eq!(fv.len(), 2);
    }

    #[test]
    fn feature_values_missing_name() {
        let fv = FeatureValues::new();
        assert!(fv.is_empty());
        assert_eq!(fv.get("nonexistent"), None);
    }
}
