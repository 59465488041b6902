//! Feature factory — converts `FeatureConfig` into shared runtime features.

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::builtin::{Last, Momentum, MovingAverage, Spread, Vwap};
use super::Feature;

// ─── Error type ──────────────────────────────────────────────────────

/// Errors that can occur during feature construction.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FactoryError {
    #[error("Unknown feature type: {0}")]
    UnknownFeature(String),
    #[error("Feature '{name}': parameter '{param}' must be a positive integer, got {value}")]
    InvalidPeriod {
        name: String,
        param: String,
        value: f64,
    },
    #[error("Duplicate feature name: {0}")]
    DuplicateName(String),
}

// ─── Config ──────────────────────────────────────────────────────────

fn default_field() -> String {
    "price".to_string()
}

/// Serializable description of one feature.
///
/// ```toml
/// [[features]]
/// name = "ma_fast"
/// type = "moving_average"
/// field = "price"
/// params = { period = 5 }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureConfig {
    /// Storage key; defaults to `{type}_{period}` (or `{type}`).
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub feature_type: String,
    #[serde(default = "default_field")]
    pub field: String,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

impl FeatureConfig {
    pub fn new(feature_type: impl Into<String>) -> Self {
        Self {
            name: None,
            feature_type: feature_type.into(),
            field: default_field(),
            params: BTreeMap::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: f64) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Resolved storage key.
    pub fn resolved_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        match self.params.get("period") {
            Some(p) => format!("{}_{}", self.feature_type, *p as i64),
            None => self.feature_type.clone(),
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────

/// Extract a positive integer parameter, falling back to `default`.
fn period(config: &FeatureConfig, name: &str, key: &str, default: usize) -> Result<usize, FactoryError> {
    match config.params.get(key).copied() {
        None => Ok(default),
        Some(v) if v >= 1.0 && v.fract() == 0.0 => Ok(v as usize),
        Some(v) => Err(FactoryError::InvalidPeriod {
            name: name.to_string(),
            param: key.to_string(),
            value: v,
        }),
    }
}

// ─── Factory ─────────────────────────────────────────────────────────

/// Create a feature from a `FeatureConfig`.
pub fn create_feature(config: &FeatureConfig) -> Result<Arc<dyn Feature>, FactoryError> {
    let name = config.resolved_name();
    match config.feature_type.as_str() {
        "moving_average" => {
            let p = period(config, &name, "period", 20)?;
            Ok(Arc::new(MovingAverage::new(name, config.field.clone(), p)))
        }
        "momentum" => {
            let p = period(config, &name, "period", 10)?;
            Ok(Arc::new(Momentum::new(name, config.field.clone(), p)))
        }
        "vwap" => {
            let p = period(config, &name, "period", 20)?;
            Ok(Arc::new(Vwap::new(name, p)))
        }
        "spread" => Ok(Arc::new(Spread::new(name))),
        "last" => Ok(Arc::new(Last::new(name, config.field.clone()))),
        other => Err(FactoryError::UnknownFeature(other.to_string())),
    }
}

/// Create every configured feature, rejecting duplicate storage keys.
pub fn create_features(configs: &[FeatureConfig]) -> Result<Vec<Arc<dyn Feature>>, FactoryError> {
    let mut seen = HashSet::new();
    let mut features = Vec::with_capacity(configs.len());
    for config in configs {
        let feature = create_feature(config)?;
        if !seen.insert(feature.name().to_string()) {
            return Err(FactoryError::DuplicateName(feature.name().to_string()));
        }
        features.push(feature);
    }
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_every_builtin() {
        for ty in ["moving_average", "momentum", "vwap", "spread", "last"] {
            let f = create_feature(&FeatureConfig::new(ty)).unwrap();
            assert!(f.lookback() >= 1, "{ty}");
        }
    }

    #[test]
    fn default_name_includes_period() {
        let cfg = FeatureConfig::new("moving_average").param("period", 5.0);
        assert_eq!(cfg.resolved_name(), "moving_average_5");
        let f = create_feature(&cfg).unwrap();
        assert_eq!(f.name(), "moving_average_5");
        assert_eq!(f.lookback(), 5);
    }

    #[test]
    fn explicit_name_wins() {
        let cfg = FeatureConfig::new("spread").named("bbo");
        assert_eq!(create_feature(&cfg).unwrap().name(), "bbo");
    }

    #[test]
    fn unknown_type_rejected() {
        let err = create_feature(&FeatureConfig::new("rsi")).err().unwrap();
        assert_eq!(err, FactoryError::UnknownFeature("rsi".into()));
    }

    #[test]
    fn fractional_or_zero_period_rejected() {
        let cfg = FeatureConfig::new("momentum").param("period", 0.0);
        assert!(matches!(create_feature(&cfg), Err(FactoryError::InvalidPeriod { .. })));
        let cfg = FeatureConfig::new("momentum").param("period", 2.5);
        assert!(matches!(create_feature(&cfg), Err(FactoryError::InvalidPeriod { .. })));
    }

    #[test]
    fn duplicate_names_rejected() {
        let configs = vec![
            FeatureConfig::new("last").named("px"),
            FeatureConfig::new("moving_average").named("px"),
        ];
        let err = create_features(&configs).err().unwrap();
        assert_eq!(err, FactoryError::DuplicateName("px".into()));
    }

    #[test]
    fn config_deserializes_from_toml_shape() {
        let json = r#"{"type":"vwap","params":{"period":3}}"#;
        let cfg: FeatureConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.field, "price");
        assert_eq!(cfg.resolved_name(), "vwap_3");
    }
}
