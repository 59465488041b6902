//! Integration tests for the update scheduler.
//!
//! Tests:
//! 1. Instrument lifecycle: lazy creation, in-place mutation, unsupported skip
//! 2. Throttle: first-pass rule, interval boundary, replayed updates
//! 3. Execution flow: resolver output reaches the sink once per pass
//! 4. Failure propagation: factory, feature and resolver errors halt the run

use std::sync::Arc;

use ticklab_core::domain::{BookData, InstrumentKind, InstrumentUpdate, Interval, Timestamp};
use ticklab_core::engine::{EngineError, SystemParameters, UpdateOutcome, UpdateScheduler};
use ticklab_core::execution::{
    CollectingSink, Execution, ExecutionError, ExecutionResolver, Side, ThresholdResolver,
};
use ticklab_core::features::{Feature, Last, Momentum, MovingAverage};
use ticklab_core::instrument::{BookInstrumentFactory, Instrument, InstrumentError};
use ticklab_core::source::VecSource;
use ticklab_core::InstrumentRegistry;

/// Helper: stock update carrying a price.
fn tick(id: &str, t: i64, price: f64) -> InstrumentUpdate {
    InstrumentUpdate::new(
        id,
        InstrumentKind::Stock,
        Timestamp(t),
        BookData::new().with("price", price),
    )
}

/// Helper: parameters with a stock-only factory and the given features.
fn params(interval: i64, features: Vec<Arc<dyn Feature>>) -> SystemParameters {
    let factory = BookInstrumentFactory::new(vec![InstrumentKind::Stock], features, 16);
    SystemParameters::new(Interval(interval), Box::new(factory))
}

fn last_px() -> Vec<Arc<dyn Feature>> {
    vec![Arc::new(Last::new("px", "price"))]
}

// ──────────────────────────────────────────────
// Instrument lifecycle
// ──────────────────────────────────────────────

#[test]
fn known_id_never_creates_a_second_instrument() {
    let mut s = UpdateScheduler::new(params(10, last_px()));
    for t in 0..20 {
        s.process_instrument_update(&tick("A", t, 100.0 + t as f64)).unwrap();
    }
    assert_eq!(s.registry().len(), 1);
    let a = s.registry().get(&"A".into()).unwrap();
    assert_eq!(a.book().get("price"), Some(119.0));
}

#[test]
fn new_id_is_registered_and_immediately_updated() {
    let mut s = UpdateScheduler::new(params(1_000, last_px()));
    s.process_instrument_update(&tick("A", 0, 1.0)).unwrap();
    s.process_instrument_update(&tick("B", 5, 2.0)).unwrap();
    assert_eq!(s.registry().len(), 2);
    let b = s.registry().get(&"B".into()).unwrap();
    assert_eq!(b.last_update_time(), Some(Timestamp(5)));
    assert_eq!(b.book().get("price"), Some(2.0));
}

#[test]
fn unsupported_first_then_valid_update_still_gets_first_pass() {
    let mut s = UpdateScheduler::new(params(100, last_px()));

    let option = InstrumentUpdate::new(
        "SPY_C450",
        InstrumentKind::Unknown,
        Timestamp(0),
        BookData::new().with("price", 3.2),
    );
    assert_eq!(s.process_instrument_update(&option).unwrap(), UpdateOutcome::Skipped);
    assert!(s.registry().is_empty());
    assert_eq!(s.stats().passes(), 0);

    // Any timestamp: still the first pass.
    let outcome = s.process_instrument_update(&tick("QQQ", 42, 400.0)).unwrap();
    assert_eq!(outcome, UpdateOutcome::Applied { feature_pass: true });
    assert_eq!(s.stats().passes(), 1);
}

#[test]
fn unsupported_update_leaves_registry_and_passes_unchanged() {
    let mut s = UpdateScheduler::new(params(0, last_px()));
    s.process_instrument_update(&tick("A", 0, 1.0)).unwrap();
    let future = InstrumentUpdate::new("ES", InstrumentKind::Future, Timestamp(1), BookData::new());
    assert_eq!(s.process_instrument_update(&future).unwrap(), UpdateOutcome::Skipped);
    assert_eq!(s.registry().len(), 1);
    assert_eq!(s.stats().passes(), 1);
}

// ──────────────────────────────────────────────
// Throttle
// ──────────────────────────────────────────────

#[test]
fn interval_100_scenario_passes_at_0_and_150() {
    let mut s = UpdateScheduler::new(params(100, last_px()));
    let outcomes: Vec<_> = [0, 50, 150, 151]
        .iter()
        .map(|&t| s.process_instrument_update(&tick("A", t, 1.0)).unwrap())
        .collect();

    assert_eq!(
        outcomes,
        vec![
            UpdateOutcome::Applied { feature_pass: true },
            UpdateOutcome::Applied { feature_pass: false },
            UpdateOutcome::Applied { feature_pass: true },
            UpdateOutcome::Applied { feature_pass: false },
        ]
    );
    assert_eq!(s.stats().passes(), 2);
    assert_eq!(s.summary().last_pass_time, Some(Timestamp(150)));
}

#[test]
fn features_reflect_pass_time_not_latest_update() {
    let ma: Arc<dyn Feature> = Arc::new(MovingAverage::new("ma_2", "price", 2));
    let mut s = UpdateScheduler::new(params(100, vec![ma]));
    s.run(vec![tick("A", 0, 10.0), tick("A", 100, 20.0), tick("A", 150, 40.0)])
        .unwrap();

    let a = s.registry().get(&"A".into()).unwrap();
    let entry = a.features().entry("ma_2").unwrap();
    assert_eq!(entry.computed_at, Timestamp(100));
    assert_eq!(entry.value, Some(15.0));
    // The raw update at 150 was still applied.
    assert_eq!(a.book().get("price"), Some(40.0));
}

#[test]
fn replayed_update_is_idempotent() {
    let mut s = UpdateScheduler::new(params(100, last_px()));
    let u = tick("A", 10, 5.0);
    assert_eq!(
        s.process_instrument_update(&u).unwrap(),
        UpdateOutcome::Applied { feature_pass: true }
    );
    assert_eq!(
        s.process_instrument_update(&u).unwrap(),
        UpdateOutcome::Applied { feature_pass: false }
    );
    assert_eq!(s.registry().len(), 1);
    assert_eq!(s.stats().passes(), 1);
}

#[test]
fn zero_interval_passes_on_every_update() {
    let mut s = UpdateScheduler::new(params(0, last_px()));
    let summary = s
        .run((0..5).map(|t| tick("A", t, 1.0)))
        .unwrap();
    assert_eq!(summary.feature_passes, 5);
    assert_eq!(summary.updates_processed, 5);
}

#[test]
fn pass_covers_instruments_not_touched_by_trigger() {
    let mut s = UpdateScheduler::new(params(100, last_px()));
    s.run(vec![tick("A", 0, 1.0), tick("B", 10, 2.0), tick("A", 100, 3.0)])
        .unwrap();
    let b = s.registry().get(&"B".into()).unwrap();
    assert_eq!(b.features().entry("px").unwrap().computed_at, Timestamp(100));
    assert_eq!(b.features().get("px"), Some(2.0));
}

// ──────────────────────────────────────────────
// Execution flow
// ──────────────────────────────────────────────

#[test]
fn threshold_executions_reach_sink() {
    let params = params(10, last_px()).with_resolver(Box::new(ThresholdResolver::new("px", 100.0, 90.0, 5.0)));
    let mut s = UpdateScheduler::with_sink(params, CollectingSink::new());
    let summary = s
        .run(vec![
            tick("A", 0, 95.0),
            tick("A", 10, 105.0), // enter
            tick("A", 15, 80.0),  // no pass
            tick("A", 20, 85.0),  // exit
        ])
        .unwrap();

    let sink = s.into_sink();
    assert_eq!(sink.batches(), 3);
    let sides: Vec<(Side, Timestamp)> = sink.executions().iter().map(|e| (e.side, e.timestamp)).collect();
    assert_eq!(sides, vec![(Side::Buy, Timestamp(10)), (Side::Sell, Timestamp(20))]);
    assert_eq!(summary.executions, 2);
}

#[test]
fn start_trading_drains_source() {
    let mut source = VecSource::new(vec![tick("A", 0, 1.0), tick("B", 1, 1.0)]);
    let mut s = UpdateScheduler::new(params(100, last_px()));
    let summary = s.start_trading(&mut source).unwrap();
    assert_eq!(summary.updates_processed, 2);
    assert_eq!(summary.instruments, 2);
    assert_eq!(summary.feature_passes, 1);
}

// ──────────────────────────────────────────────
// Failure propagation
// ──────────────────────────────────────────────

#[test]
fn factory_error_halts_run() {
    let factory = |u: &InstrumentUpdate| -> Result<Option<Box<dyn Instrument>>, InstrumentError> {
        Err(InstrumentError::Rejected {
            instrument: u.instrument_id.clone(),
            reason: "no reference data".into(),
        })
    };
    let mut s = UpdateScheduler::new(SystemParameters::new(Interval(1), Box::new(factory)));
    let err = s.process_instrument_update(&tick("A", 0, 1.0)).unwrap_err();
    assert!(matches!(err, EngineError::Instrument(InstrumentError::Rejected { .. })));
    assert!(s.registry().is_empty());
}

#[test]
fn feature_error_aborts_pass_and_run() {
    let mom: Arc<dyn Feature> = Arc::new(Momentum::new("mom_1", "price", 1));
    let mut s = UpdateScheduler::new(params(0, vec![mom]));
    let err = s
        .run(vec![tick("A", 0, 0.0), tick("A", 1, 1.0), tick("A", 2, 2.0)])
        .unwrap_err();
    assert!(matches!(err, EngineError::Instrument(InstrumentError::Feature { .. })));
    // The failing pass is not counted as completed.
    assert_eq!(s.stats().passes(), 1);
    assert_eq!(s.summary().updates_processed, 2);
}

struct FailingResolver;

impl ExecutionResolver for FailingResolver {
    fn get_executions(
        &mut self,
        _time: Timestamp,
        _registry: &InstrumentRegistry,
    ) -> Result<Vec<Execution>, ExecutionError> {
        Err(ExecutionError::Resolver("broker offline".into()))
    }
}

#[test]
fn resolver_error_halts_run() {
    let mut s = UpdateScheduler::new(params(10, last_px()).with_resolver(Box::new(FailingResolver)));
    let err = s.run(vec![tick("A", 0, 1.0)]).unwrap_err();
    assert!(matches!(err, EngineError::Execution(_)));
}
