//! Update scheduler — the event loop of the backtest.
//!
//! Two steps per update:
//! 1. Apply: resolve the instrument (creating it on first sight) and apply
//!    the raw update to it
//! 2. Maybe recompute: if the throttle is due, run a feature pass over the
//!    whole registry, then ask the resolver for executions and hand them to
//!    the sink
//!
//! Updates are processed strictly in arrival order, one at a time.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::domain::{InstrumentUpdate, Timestamp};
use crate::execution::{DiscardSink, ExecutionSink};
use crate::source::UpdateSource;

use super::error::EngineError;
use super::params::{OrderingPolicy, SystemParameters};
use super::registry::{InstrumentRegistry, RegistryError};
use super::stats::{FeaturePassStats, PassTimer};
use super::throttle::FeatureThrottle;

/// What happened to one update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// No instrument exists for the id and none could be created.
    Skipped,
    /// Applied to its instrument; `feature_pass` tells whether it triggered one.
    Applied { feature_pass: bool },
}

/// Counters for a finished (or in-progress) run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub updates_processed: u64,
    pub updates_skipped: u64,
    pub instruments: usize,
    pub feature_passes: u64,
    pub executions: u64,
    pub last_pass_time: Option<Timestamp>,
    pub average_pass_ms: f64,
}

pub struct UpdateScheduler<K: ExecutionSink = DiscardSink> {
    params: SystemParameters,
    registry: InstrumentRegistry,
    throttle: FeatureThrottle,
    sink: K,
    stats: FeaturePassStats,
    latest_time: Option<Timestamp>,
    updates_processed: u64,
    updates_skipped: u64,
    executions: u64,
}

impl UpdateScheduler<DiscardSink> {
    pub fn new(params: SystemParameters) -> Self {
        Self::with_sink(params, DiscardSink)
    }
}

impl<K: ExecutionSink> UpdateScheduler<K> {
    pub fn with_sink(params: SystemParameters, sink: K) -> Self {
        let throttle = FeatureThrottle::new(params.frequency_of_feature_updates());
        Self {
            params,
            registry: InstrumentRegistry::new(),
            throttle,
            sink,
            stats: FeaturePassStats::new(),
            latest_time: None,
            updates_processed: 0,
            updates_skipped: 0,
            executions: 0,
        }
    }

    /// Process a single update.
    ///
    /// Updates no instrument can be created for are skipped before the
    /// ordering check, so they neither fail a `Reject` run nor move the
    /// latest processed time.
    pub fn process_instrument_update(
        &mut self,
        update: &InstrumentUpdate,
    ) -> Result<UpdateOutcome, EngineError> {
        let id = update.instrument_id();
        let created = if self.registry.contains(id) {
            None
        } else {
            let Some(created) = self
                .registry
                .create_instrument_from_update(update, &self.params)?
            else {
                debug!("skipping update for unsupported instrument '{id}' ({})", update.kind);
                self.updates_skipped += 1;
                return Ok(UpdateOutcome::Skipped);
            };
            Some(created)
        };

        self.check_ordering(update)?;

        let instrument = match created {
            Some(created) => {
                debug!("registered instrument '{id}' ({})", update.kind);
                self.registry.insert(created)?
            }
            None => self
                .registry
                .get_mut(id)
                .ok_or_else(|| RegistryError::Missing(id.clone()))?,
        };
        instrument.update(update)?;
        self.updates_processed += 1;

        let feature_pass = self.try_update_features_and_execute(update.time_of_update())?;
        Ok(UpdateOutcome::Applied { feature_pass })
    }

    /// Run a feature pass and an execution query if the throttle is due.
    fn try_update_features_and_execute(&mut self, time: Timestamp) -> Result<bool, EngineError> {
        if !self.throttle.try_acquire(time) {
            return Ok(false);
        }
        self.update_features(time)?;

        let executions = self
            .params
            .execution_system()
            .get_executions(time, &self.registry)?;
        self.executions += executions.len() as u64;
        self.sink.consume(time, &executions)?;
        Ok(true)
    }

    fn update_features(&mut self, time: Timestamp) -> Result<(), EngineError> {
        let timer = PassTimer::start();
        self.registry.update_features(time)?;
        self.stats.record(timer.elapsed());
        Ok(())
    }

    fn check_ordering(&mut self, update: &InstrumentUpdate) -> Result<(), EngineError> {
        let time = update.time_of_update();
        match self.latest_time {
            Some(latest) if time < latest => {
                if self.params.ordering() == OrderingPolicy::Reject {
                    return Err(EngineError::OutOfOrder {
                        instrument: update.instrument_id().clone(),
                        timestamp: time,
                        latest,
                    });
                }
            }
            _ => self.latest_time = Some(time),
        }
        Ok(())
    }

    /// Feed every update, in order, until the iterator is exhausted.
    pub fn run<I>(&mut self, updates: I) -> Result<RunSummary, EngineError>
    where
        I: IntoIterator<Item = InstrumentUpdate>,
    {
        self.try_run(updates.into_iter().map(Ok::<_, EngineError>))
    }

    /// Like `run`, for fallible streams. The first error halts the run.
    pub fn try_run<I, E>(&mut self, updates: I) -> Result<RunSummary, EngineError>
    where
        I: IntoIterator<Item = Result<InstrumentUpdate, E>>,
        E: Into<EngineError>,
    {
        for update in updates {
            let update = update.map_err(Into::<EngineError>::into)?;
            self.process_instrument_update(&update)?;
        }
        self.sink.flush()?;

        let summary = self.summary();
        info!(
            "run complete: {} updates ({} skipped), {} instruments, {} feature passes, {} executions",
            summary.updates_processed,
            summary.updates_skipped,
            summary.instruments,
            summary.feature_passes,
            summary.executions
        );
        Ok(summary)
    }

    /// Pull the source's stream and run it to exhaustion.
    pub fn start_trading(&mut self, source: &mut dyn UpdateSource) -> Result<RunSummary, EngineError> {
        let stream = source.emit_updates()?;
        self.try_run(stream)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            updates_processed: self.updates_processed,
            updates_skipped: self.updates_skipped,
            instruments: self.registry.len(),
            feature_passes: self.stats.passes(),
            executions: self.executions,
            last_pass_time: self.throttle.last_pass(),
            average_pass_ms: self.stats.average_ms(),
        }
    }

    pub fn registry(&self) -> &InstrumentRegistry {
        &self.registry
    }

    pub fn stats(&self) -> &FeaturePassStats {
        &self.stats
    }

    pub fn params(&self) -> &SystemParameters {
        &self.params
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn into_sink(self) -> K {
        self.sink
    }
}
