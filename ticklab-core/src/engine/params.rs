//! Trading system parameters — read-only configuration handed to the scheduler.

use serde::{Deserialize, Serialize};

use crate::domain::Interval;
use crate::execution::{ExecutionResolver, NoExecutions};
use crate::instrument::InstrumentFactory;

/// What the scheduler does with an update older than the latest one seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingPolicy {
    /// Process it. The throttle is order-sensitive, so the source is trusted
    /// to deliver non-decreasing timestamps.
    #[default]
    Trust,
    /// Fail the run with `EngineError::OutOfOrder`.
    Reject,
}

/// Parameter set for one run.
pub struct SystemParameters {
    feature_update_interval: Interval,
    ordering: OrderingPolicy,
    factory: Box<dyn InstrumentFactory>,
    resolver: Box<dyn ExecutionResolver>,
}

impl SystemParameters {
    /// Parameters with no execution logic and trusted ordering.
    pub fn new(feature_update_interval: Interval, factory: Box<dyn InstrumentFactory>) -> Self {
        Self {
            feature_update_interval,
            ordering: OrderingPolicy::Trust,
            factory,
            resolver: Box::new(NoExecutions),
        }
    }

    pub fn with_resolver(mut self, resolver: Box<dyn ExecutionResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_ordering(mut self, ordering: OrderingPolicy) -> Self {
        self.ordering = ordering;
        self
    }

    /// Minimum logical-time gap between two feature passes.
    pub fn frequency_of_feature_updates(&self) -> Interval {
        self.feature_update_interval
    }

    pub fn ordering(&self) -> OrderingPolicy {
        self.ordering
    }

    pub fn instrument_factory(&self) -> &dyn InstrumentFactory {
        self.factory.as_ref()
    }

    pub fn execution_system(&mut self) -> &mut dyn ExecutionResolver {
        self.resolver.as_mut()
    }
}

impl std::fmt::Debug for SystemParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemParameters")
            .field("feature_update_interval", &self.feature_update_interval)
            .field("ordering", &self.ordering)
            .finish_non_exhaustive()
    }
}
