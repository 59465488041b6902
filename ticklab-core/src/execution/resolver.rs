//! Execution resolvers.

use std::collections::HashSet;

use crate::domain::{InstrumentId, Timestamp};
use crate::engine::registry::InstrumentRegistry;

use super::{Execution, ExecutionError, Side};

/// Translates current time and registry state into trade decisions.
///
/// Invoked synchronously right after each feature pass.
pub trait ExecutionResolver: Send {
    fn get_executions(
        &mut self,
        time: Timestamp,
        registry: &InstrumentRegistry,
    ) -> Result<Vec<Execution>, ExecutionError>;
}

/// Never trades.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExecutions;

impl ExecutionResolver for NoExecutions {
    fn get_executions(
        &mut self,
        _time: Timestamp,
        _registry: &InstrumentRegistry,
    ) -> Result<Vec<Execution>, ExecutionError> {
        Ok(Vec::new())
    }
}

/// Long/flat threshold rule on a single feature.
///
/// Buys `quantity` when flat and the feature is above `enter_above`; sells the
/// position when long and the feature is below `exit_below`. Instruments whose
/// feature has no value yet are left alone.
#[derive(Debug, Clone)]
pub struct ThresholdResolver {
    feature: String,
    enter_above: f64,
    exit_below: f64,
    quantity: f64,
    long: HashSet<InstrumentId>,
}

impl ThresholdResolver {
    pub fn new(feature: impl Into<String>, enter_above: f64, exit_below: f64, quantity: f64) -> Self {
        Self {
            feature: feature.into(),
            enter_above,
            exit_below,
            quantity,
            long: HashSet::new(),
        }
    }

    pub fn is_long(&self, id: &InstrumentId) -> bool {
        self.long.contains(id)
    }
}

impl ExecutionResolver for ThresholdResolver {
    fn get_executions(
        &mut self,
        time: Timestamp,
        registry: &InstrumentRegistry,
    ) -> Result<Vec<Execution>, ExecutionError> {
        let mut ids: Vec<&InstrumentId> = registry.ids().collect();
        ids.sort();

        let mut executions = Vec::new();
        for id in ids {
            let Some(value) = registry.get(id).and_then(|i| i.features().get(&self.feature)) else {
                continue;
            };
            let side = if self.long.contains(id) {
                if value >= self.exit_below {
                    continue;
                }
                self.long.remove(id);
                Side::Sell
            } else {
                if value <= self.enter_above {
                    continue;
                }
                self.long.insert(id.clone());
                Side::Buy
            };
            executions.push(Execution {
                instrument_id: id.clone(),
                timestamp: time,
                side,
                quantity: self.quantity,
            });
        }
        Ok(executions)
    }
}
