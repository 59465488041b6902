//! Run assembly — turns a `RunConfig` into a wired scheduler and runs it.
//!
//! Entry points:
//! - `run_from_config()`: builds everything, writes executions to the
//!   configured JSONL file (if any). Used by the CLI.
//! - `run_with_sink()`: same, but with a caller-provided execution sink.
//! - `validate_config()`: builds everything without reading any data.

use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ticklab_core::domain::Interval;
use ticklab_core::engine::{EngineError, RunSummary, SystemParameters, UpdateScheduler};
use ticklab_core::execution::{
    DiscardSink, ExecutionResolver, ExecutionSink, NoExecutions, ThresholdResolver,
};
use ticklab_core::features::create_features;
use ticklab_core::instrument::BookInstrumentFactory;
use ticklab_core::source::UpdateSource;

use crate::config::{ConfigError, ExecutionConfig, RunConfig, RunId, SourceConfig};
use crate::sink::JsonlSink;
use crate::source::{CsvUpdateSource, SyntheticUpdateSource};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("cannot open executions output '{}': {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Result of a finished run, as written by `ticklab run --report`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub summary: RunSummary,
    /// Duration of the final feature pass.
    pub last_pass_ms: f64,
    /// JSONL file the executions went to, if any.
    #[serde(default)]
    pub executions_path: Option<PathBuf>,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Build the scheduler parameters (factory, features, resolver) for a config.
pub fn build_parameters(config: &RunConfig) -> Result<SystemParameters, RunError> {
    let features = create_features(&config.features).map_err(ConfigError::from)?;
    let factory = BookInstrumentFactory::new(
        config.instruments.supported.clone(),
        features,
        config.instruments.history_len,
    );

    let resolver: Box<dyn ExecutionResolver> = match &config.execution {
        ExecutionConfig::None => Box::new(NoExecutions),
        ExecutionConfig::Threshold {
            feature,
            enter_above,
            exit_below,
            quantity,
        } => Box::new(ThresholdResolver::new(
            feature.clone(),
            *enter_above,
            *exit_below,
            *quantity,
        )),
    };

    Ok(SystemParameters::new(
        Interval(config.scheduler.feature_update_interval),
        Box::new(factory),
    )
    .with_resolver(resolver)
    .with_ordering(config.scheduler.ordering))
}

/// Instantiate the configured update source. Nothing is read yet.
pub fn build_source(config: &SourceConfig) -> Box<dyn UpdateSource> {
    match config {
        SourceConfig::Csv { path } => Box::new(CsvUpdateSource::from_path(path.clone())),
        SourceConfig::Synthetic {
            symbols,
            updates,
            step,
            start,
            seed,
        } => Box::new(
            SyntheticUpdateSource::new(symbols.clone(), *updates, *step)
                .with_start(*start)
                .with_seed(*seed),
        ),
    }
}

/// Build everything a run needs without running it. Returns the run id.
pub fn validate_config(config: &RunConfig) -> Result<RunId, RunError> {
    config.validate()?;
    build_parameters(config)?;
    let _source = build_source(&config.source);
    Ok(config.run_id()?)
}

/// Run a config to completion, handing executions to `sink`.
///
/// Returns the report and the sink, so in-memory sinks can be inspected.
pub fn run_with_sink<K: ExecutionSink>(
    config: &RunConfig,
    sink: K,
) -> Result<(RunReport, K), RunError> {
    let run_id = config.run_id()?;
    let params = build_parameters(config)?;
    let mut source = build_source(&config.source);

    info!(
        "run {}: {} features, interval {}, ordering {:?}",
        &run_id[..12],
        config.features.len(),
        config.scheduler.feature_update_interval,
        config.scheduler.ordering
    );

    let mut scheduler = UpdateScheduler::with_sink(params, sink);
    let summary = scheduler.start_trading(source.as_mut())?;
    let last_pass_ms = scheduler.stats().last_ms();

    let report = RunReport {
        schema_version: SCHEMA_VERSION,
        run_id,
        summary,
        last_pass_ms,
        executions_path: None,
    };
    Ok((report, scheduler.into_sink()))
}

/// Run a config, writing executions to `executions` (or the configured
/// `output.executions`) as JSONL.
pub fn run_from_config(
    config: &RunConfig,
    executions: Option<&Path>,
) -> Result<RunReport, RunError> {
    let path = executions
        .map(Path::to_path_buf)
        .or_else(|| config.output.executions.clone());

    match path {
        Some(path) => {
            let sink = JsonlSink::create(&path).map_err(|source| RunError::Output {
                path: path.clone(),
                source,
            })?;
            let (mut report, sink) = run_with_sink(config, sink)?;
            info!("wrote {} executions to {}", sink.written(), path.display());
            report.executions_path = Some(path);
            Ok(report)
        }
        None => {
            let (report, _) = run_with_sink(config, DiscardSink)?;
            Ok(report)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticklab_core::execution::CollectingSink;

    fn synthetic_config(execution: &str) -> RunConfig {
        RunConfig::from_toml(&format!(
            r#"
            [scheduler]
            feature_update_interval = 5000

            [[features]]
            name = "px"
            type = "last"

            [[features]]
            type = "moving_average"
            params = {{ period = 3 }}

            {execution}

            [source]
            type = "synthetic"
            symbols = ["AAA", "BBB", "CCC"]
            updates = 300
            step = 1000
            seed = 42
            "#
        ))
        .unwrap()
    }

    #[test]
    fn synthetic_run_reports_counters() {
        let config = synthetic_config("");
        let (report, sink) = run_with_sink(&config, CollectingSink::new()).unwrap();

        assert_eq!(report.schema_version, SCHEMA_VERSION);
        assert_eq!(report.run_id, config.run_id().unwrap());
        assert_eq!(report.summary.updates_processed, 300);
        assert_eq!(report.summary.updates_skipped, 0);
        assert_eq!(report.summary.instruments, 3);
        // Timestamps 0, 1000, ..., 299000; a pass every 5000.
        assert_eq!(report.summary.feature_passes, 60);
        assert_eq!(sink.batches(), 60);
        assert!(sink.executions().is_empty());
    }

    #[test]
    fn threshold_run_is_deterministic() {
        let config = synthetic_config(
            r#"
            [execution]
            type = "threshold"
            feature = "px"
            enter_above = 100.05
            exit_below = 99.95
            "#,
        );
        let (a, sink_a) = run_with_sink(&config, CollectingSink::new()).unwrap();
        let (b, sink_b) = run_with_sink(&config, CollectingSink::new()).unwrap();
        assert_eq!(a.summary.executions, b.summary.executions);
        assert_eq!(sink_a.executions(), sink_b.executions());
        assert_eq!(a.summary.executions, sink_a.executions().len() as u64);
    }

    #[test]
    fn validate_does_not_touch_data() {
        let config = RunConfig::from_toml(
            r#"
            [scheduler]
            feature_update_interval = 1

            [source]
            type = "csv"
            path = "/nowhere/ticks.csv"
            "#,
        )
        .unwrap();
        let run_id = validate_config(&config).unwrap();
        assert_eq!(run_id, config.run_id().unwrap());
        // Running it does.
        let err = run_from_config(&config, None).unwrap_err();
        assert!(matches!(err, RunError::Engine(EngineError::Source(_))));
    }

    #[test]
    fn report_roundtrips_through_json() {
        let config = synthetic_config("");
        let report = run_from_config(&config, None).unwrap();
        let json = serde_json::to_string_pretty(&report).unwrap();
        let back: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.summary, report.summary);
        assert_eq!(back.run_id, report.run_id);
    }

    #[test]
    fn report_defaults_schema_version() {
        let json = r#"{
            "run_id": "abc",
            "summary": {
                "updates_processed": 1, "updates_skipped": 0, "instruments": 1,
                "feature_passes": 1, "executions": 0, "last_pass_time": 0,
                "average_pass_ms": 0.1
            },
            "last_pass_ms": 0.1
        }"#;
        let report: RunReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.schema_version, SCHEMA_VERSION);
        assert_eq!(report.executions_path, None);
    }
}
