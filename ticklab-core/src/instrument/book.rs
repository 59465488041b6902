//! BookInstrument — the built-in instrument type.
//!
//! Keeps the latest merged book, a bounded snapshot history sized for the
//! longest configured feature, and the feature values of the last pass.

use std::sync::Arc;

use crate::domain::{BookData, InstrumentId, InstrumentKind, InstrumentUpdate, Timestamp};
use crate::features::{BookHistory, Feature, FeatureValues};

use super::{Instrument, InstrumentError};

pub struct BookInstrument {
    id: InstrumentId,
    kind: InstrumentKind,
    book: BookData,
    history: BookHistory,
    features: Arc<[Arc<dyn Feature>]>,
    values: FeatureValues,
    last_update_time: Option<Timestamp>,
    updates_applied: usize,
}

impl BookInstrument {
    /// `history_len` is raised to the longest feature lookback if smaller.
    pub fn new(
        id: InstrumentId,
        kind: InstrumentKind,
        features: Arc<[Arc<dyn Feature>]>,
        history_len: usize,
    ) -> Self {
        let needed = features.iter().map(|f| f.lookback()).max().unwrap_or(1);
        Self {
            id,
            kind,
            book: BookData::new(),
            history: BookHistory::with_capacity(history_len.max(needed)),
            features,
            values: FeatureValues::new(),
            last_update_time: None,
            updates_applied: 0,
        }
    }

    pub fn history(&self) -> &BookHistory {
        &self.history
    }

    /// Updates that changed state (duplicate replays excluded).
    pub fn updates_applied(&self) -> usize {
        self.updates_applied
    }
}

impl std::fmt::Debug for BookInstrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookInstrument")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("book", &self.book)
            .field("history_len", &self.history.len())
            .field("features", &self.features.len())
            .field("last_update_time", &self.last_update_time)
            .finish()
    }
}

impl Instrument for BookInstrument {
    fn id(&self) -> &InstrumentId {
        &self.id
    }

    fn kind(&self) -> InstrumentKind {
        self.kind
    }

    fn update(&mut self, update: &InstrumentUpdate) -> Result<(), InstrumentError> {
        if update.instrument_id != self.id {
            return Err(InstrumentError::WrongInstrument {
                expected: self.id.clone(),
                got: update.instrument_id.clone(),
            });
        }

        let mut merged = self.book.clone();
        merged.merge(&update.book);

        // Replay of the same event: nothing changes.
        if self.last_update_time == Some(update.timestamp) && merged == self.book {
            return Ok(());
        }

        self.history.push(update.timestamp, merged.clone());
        self.book = merged;
        self.last_update_time = Some(update.timestamp);
        self.updates_applied += 1;
        Ok(())
    }

    fn update_features(&mut self, time: Timestamp) -> Result<(), InstrumentError> {
        for feature in self.features.iter() {
            let value = feature
                .compute(&self.history)
                .map_err(|source| InstrumentError::Feature {
                    instrument: self.id.clone(),
                    source,
                })?;
            self.values.set(feature.name(), value, time);
        }
        Ok(())
    }

    fn features(&self) -> &FeatureValues {
        &self.values
    }

    fn book(&self) -> &BookData {
        &self.book
    }

    fn last_update_time(&self) -> Option<Timestamp> {
        self.last_update_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{FeatureError, Momentum, MovingAverage};

    fn instrument(features: Vec<Arc<dyn Feature>>) -> BookInstrument {
        BookInstrument::new("SPY".into(), InstrumentKind::Stock, features.into(), 4)
    }

    fn update(t: i64, price: f64) -> InstrumentUpdate {
        InstrumentUpdate::new(
            "SPY",
            InstrumentKind::Stock,
            Timestamp(t),
            BookData::new().with("price", price),
        )
    }

    #[test]
    fn update_merges_book_and_tracks_time() {
        let mut inst = instrument(vec![]);
        inst.update(&update(1, 100.0)).unwrap();
        let bid = InstrumentUpdate::new(
            "SPY",
            InstrumentKind::Stock,
            Timestamp(2),
            BookData::new().with("bid", 99.0),
        );
        inst.update(&bid).unwrap();
        assert_eq!(inst.book().get("price"), Some(100.0));
        assert_eq!(inst.book().get("bid"), Some(99.0));
        assert_eq!(inst.last_update_time(), Some(Timestamp(2)));
        assert_eq!(inst.history().len(), 2);
    }

    #[test]
    fn duplicate_replay_is_ignored() {
        let mut inst = instrument(vec![]);
        inst.update(&update(5, 100.0)).unwrap();
        inst.update(&update(5, 100.0)).unwrap();
        assert_eq!(inst.updates_applied(), 1);
        assert_eq!(inst.history().len(), 1);
    }

    #[test]
    fn wrong_instrument_is_rejected() {
        let mut inst = instrument(vec![]);
        let other = InstrumentUpdate::new("QQQ", InstrumentKind::Stock, Timestamp(1), BookData::new());
        let err = inst.update(&other).unwrap_err();
        assert!(matches!(err, InstrumentError::WrongInstrument { .. }));
    }

    #[test]
    fn history_sized_for_longest_feature() {
        let ma: Arc<dyn Feature> = Arc::new(MovingAverage::new("ma_10", "price", 10));
        let inst = instrument(vec![ma]);
        assert_eq!(inst.history().capacity(), 10);
    }

    #[test]
    fn update_features_stores_values_at_pass_time() {
        let ma: Arc<dyn Feature> = Arc::new(MovingAverage::new("ma_2", "price", 2));
        let mut inst = instrument(vec![ma]);
        inst.update(&update(1, 10.0)).unwrap();
        inst.update_features(Timestamp(1)).unwrap();
        assert_eq!(inst.features().get("ma_2"), None);

        inst.update(&update(2, 20.0)).unwrap();
        inst.update_features(Timestamp(2)).unwrap();
        assert_eq!(inst.features().get("ma_2"), Some(15.0));
        assert_eq!(inst.features().entry("ma_2").unwrap().computed_at, Timestamp(2));
    }

    #[test]
    fn feature_failure_names_instrument() {
        let mom: Arc<dyn Feature> = Arc::new(Momentum::new("mom_1", "price", 1));
        let mut inst = instrument(vec![mom]);
        inst.update(&update(1, 0.0)).unwrap();
        inst.update(&update(2, 1.0)).unwrap();
        let err = inst.update_features(Timestamp(2)).unwrap_err();
        assert_eq!(
            err,
            InstrumentError::Feature {
                instrument: "SPY".into(),
                source: FeatureError::DivisionByZero {
                    feature: "mom_1".into(),
                    detail: "price was 0 1 snapshots back".into(),
                },
            }
        );
    }
}
