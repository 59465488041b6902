//! Execution decisions — the resolver that proposes trades after a feature
//! pass, and the sinks that receive them.

pub mod resolver;
pub mod sink;

pub use resolver::{ExecutionResolver, NoExecutions, ThresholdResolver};
pub use sink::{
    ChannelSink, CollectingSink, DiscardSink, ExecutionBatch, ExecutionSink, FnSink, SinkError,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{InstrumentId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Buy,
    Sell,
}

/// One trade decision produced by an `ExecutionResolver`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub instrument_id: InstrumentId,
    pub timestamp: Timestamp,
    pub side: Side,
    pub quantity: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum ExecutionError {
    #[error("execution resolver failed: {0}")]
    Resolver(String),
}
