//! TickLab Runner — run configuration, concrete sources and sinks, run assembly.
//!
//! This crate builds on `ticklab-core` to provide:
//! - TOML run configuration with validation and a content-addressed run id
//! - CSV and deterministic synthetic update sources
//! - JSONL execution output
//! - Config → scheduler wiring and the persisted run report

pub mod config;
pub mod runner;
pub mod sink;
pub mod source;

pub use config::{
    ConfigError, ExecutionConfig, InstrumentsConfig, OutputConfig, RunConfig, RunId,
    SchedulerConfig, SourceConfig,
};
pub use runner::{
    build_parameters, build_source, run_from_config, run_with_sink, validate_config, RunError,
    RunReport, SCHEMA_VERSION,
};
pub use sink::{read_executions, JsonlSink};
pub use source::{parse_timestamp, CsvUpdateSource, SyntheticUpdateSource};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
    }

    #[test]
    fn report_is_send_sync() {
        assert_send::<RunReport>();
        assert_sync::<RunReport>();
    }

    #[test]
    fn sources_and_sinks_are_send() {
        assert_send::<SyntheticUpdateSource>();
        assert_send::<CsvUpdateSource>();
        assert_send::<JsonlSink<std::io::BufWriter<std::fs::File>>>();
    }
}
