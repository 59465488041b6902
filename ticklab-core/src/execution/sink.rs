//! Execution sinks — consumers of the decisions produced after each pass.

use std::sync::mpsc::Sender;

use thiserror::Error;

use crate::domain::Timestamp;

use super::Execution;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sink serialization error: {0}")]
    Serialize(String),

    #[error("execution channel closed")]
    Disconnected,
}

/// Receives the decision set of every feature pass, in pass order.
///
/// Called once per pass, including passes that produced no decisions.
pub trait ExecutionSink: Send {
    fn consume(&mut self, time: Timestamp, executions: &[Execution]) -> Result<(), SinkError>;

    /// Called once after the update stream is exhausted.
    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl<S: ExecutionSink + ?Sized> ExecutionSink for Box<S> {
    fn consume(&mut self, time: Timestamp, executions: &[Execution]) -> Result<(), SinkError> {
        (**self).consume(time, executions)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        (**self).flush()
    }
}

/// Drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl ExecutionSink for DiscardSink {
    fn consume(&mut self, _time: Timestamp, _executions: &[Execution]) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Keeps every execution in memory.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    executions: Vec<Execution>,
    batches: usize,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn executions(&self) -> &[Execution] {
        &self.executions
    }

    /// Number of `consume` calls (one per feature pass).
    pub fn batches(&self) -> usize {
        self.batches
    }

    pub fn into_executions(self) -> Vec<Execution> {
        self.executions
    }
}

impl ExecutionSink for CollectingSink {
    fn consume(&mut self, _time: Timestamp, executions: &[Execution]) -> Result<(), SinkError> {
        self.batches += 1;
        self.executions.extend_from_slice(executions);
        Ok(())
    }
}

/// Adapts a callback into a sink.
pub struct FnSink<F>(pub F);

impl<F> ExecutionSink for FnSink<F>
where
    F: FnMut(Timestamp, &[Execution]) + Send,
{
    fn consume(&mut self, time: Timestamp, executions: &[Execution]) -> Result<(), SinkError> {
        (self.0)(time, executions);
        Ok(())
    }
}

/// Decisions of one feature pass, as sent over a channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionBatch {
    pub time: Timestamp,
    pub executions: Vec<Execution>,
}

/// Forwards each pass's decisions to a receiver on another thread.
///
/// A dropped receiver fails the run with `SinkError::Disconnected`.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<ExecutionBatch>,
}

impl ChannelSink {
    pub fn new(tx: Sender<ExecutionBatch>) -> Self {
        Self { tx }
    }
}

impl ExecutionSink for ChannelSink {
    fn consume(&mut self, time: Timestamp, executions: &[Execution]) -> Result<(), SinkError> {
        self.tx
            .send(ExecutionBatch {
                time,
                executions: executions.to_vec(),
            })
            .map_err(|_| SinkError::Disconnected)
    }
}
