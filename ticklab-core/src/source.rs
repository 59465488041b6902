//! Update source trait and structured error types.
//!
//! The UpdateSource trait abstracts over where updates come from (CSV file,
//! synthetic generator, in-memory vector) so the scheduler can consume any of
//! them, once, front to back.

use thiserror::Error;

use crate::domain::InstrumentUpdate;

/// Lazy stream of updates in arrival order.
pub type UpdateStream<'a> = Box<dyn Iterator<Item = Result<InstrumentUpdate, SourceError>> + 'a>;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {message}")]
    Parse { line: u64, message: String },

    #[error("source error: {0}")]
    Other(String),
}

/// Trait for update sources.
pub trait UpdateSource {
    /// Open the stream. Errors here mean the source could not start at all;
    /// per-item errors arrive through the stream.
    fn emit_updates(&mut self) -> Result<UpdateStream<'_>, SourceError>;
}

/// In-memory source, drained on first use.
#[derive(Debug, Clone, Default)]
pub struct VecSource {
    updates: Vec<InstrumentUpdate>,
}

impl VecSource {
    pub fn new(updates: Vec<InstrumentUpdate>) -> Self {
        Self { updates }
    }
}

impl UpdateSource for VecSource {
    fn emit_updates(&mut self) -> Result<UpdateStream<'_>, SourceError> {
        let updates = std::mem::take(&mut self.updates);
        Ok(Box::new(updates.into_iter().map(Ok)))
    }
}
