//! Built-in features.
//!
//! - `MovingAverage`: mean of `field` over the last `period` snapshots
//! - `Momentum`: fractional change of `field` over `period` snapshots
//! - `Vwap`: volume-weighted average `price` over `period` snapshots
//! - `Spread`: latest `ask - bid`
//! - `Last`: latest value of `field`

use super::{BookHistory, Feature, FeatureError};

fn finite(name: &str, value: f64) -> Result<Option<f64>, FeatureError> {
    if value.is_finite() {
        Ok(Some(value))
    } else {
        Err(FeatureError::NonFinite {
            feature: name.to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct MovingAverage {
    name: String,
    field: String,
    period: usize,
}

impl MovingAverage {
    pub fn new(name: impl Into<String>, field: impl Into<String>, period: usize) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
            period: period.max(1),
        }
    }
}

impl Feature for MovingAverage {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, history: &BookHistory) -> Result<Option<f64>, FeatureError> {
        let Some(window) = history.last_values(&self.field, self.period) else {
            return Ok(None);
        };
        let mean = window.iter().sum::<f64>() / self.period as f64;
        finite(&self.name, mean)
    }
}

/// momentum = field[t] / field[t - period] - 1
#[derive(Debug, Clone)]
pub struct Momentum {
    name: String,
    field: String,
    period: usize,
}

impl Momentum {
    pub fn new(name: impl Into<String>, field: impl Into<String>, period: usize) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
            period: period.max(1),
        }
    }
}

impl Feature for Momentum {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period + 1
    }

    fn compute(&self, history: &BookHistory) -> Result<Option<f64>, FeatureError> {
        let (Some(current), Some(base)) = (
            history.value_back(&self.field, 0),
            history.value_back(&self.field, self.period),
        ) else {
            return Ok(None);
        };
        if base == 0.0 {
            return Err(FeatureError::DivisionByZero {
                feature: self.name.clone(),
                detail: format!("{} was 0 {} snapshots back", self.field, self.period),
            });
        }
        finite(&self.name, current / base - 1.0)
    }
}

#[derive(Debug, Clone)]
pub struct Vwap {
    name: String,
    period: usize,
}

impl Vwap {
    pub fn new(name: impl Into<String>, period: usize) -> Self {
        Self {
            name: name.into(),
            period: period.max(1),
        }
    }
}

impl Feature for Vwap {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, history: &BookHistory) -> Result<Option<f64>, FeatureError> {
        let (Some(prices), Some(volumes)) = (
            history.last_values("price", self.period),
            history.last_values("volume", self.period),
        ) else {
            return Ok(None);
        };
        let total_volume: f64 = volumes.iter().sum();
        // No traded volume in the window: nothing to weight.
        if total_volume == 0.0 {
            return Ok(None);
        }
        let notional: f64 = prices.iter().zip(&volumes).map(|(p, v)| p * v).sum();
        finite(&self.name, notional / total_volume)
    }
}

#[derive(Debug, Clone)]
pub struct Spread {
    name: String,
}

impl Spread {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Feature for Spread {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        1
    }

    fn compute(&self, history: &BookHistory) -> Result<Option<f64>, FeatureError> {
        match (history.value_back("ask", 0), history.value_back("bid", 0)) {
            (Some(ask), Some(bid)) => finite(&self.name, ask - bid),
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Last {
    name: String,
    field: String,
}

impl Last {
    pub fn new(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
        }
    }
}

impl Feature for Last {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        1
    }

    fn compute(&self, history: &BookHistory) -> Result<Option<f64>, FeatureError> {
        match history.value_back(&self.field, 0) {
            Some(v) => finite(&self.name, v),
            None => Ok(None),
        }
    }
}
