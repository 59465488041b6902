//! Concrete update sources: CSV files and a deterministic synthetic feed.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::DateTime;
use csv::{StringRecord, Trim};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ticklab_core::domain::{BookData, InstrumentKind, InstrumentUpdate, Timestamp};
use ticklab_core::source::{SourceError, UpdateSource, UpdateStream};

// ─── CSV ─────────────────────────────────────────────────────────────

const TIMESTAMP_COLUMN: &str = "timestamp";
const ID_COLUMN: &str = "instrument_id";
const TYPE_COLUMN: &str = "instrument_type";

enum CsvInput {
    Path(PathBuf),
    Reader(Option<Box<dyn Read + Send>>),
}

/// Reads updates from CSV, one row per update.
///
/// ```text
/// timestamp,instrument_id,instrument_type,price,bid,ask,volume
/// 2024-01-02T14:30:00Z,AAPL,stock,185.2,185.1,185.3,1200
/// 1704205801000,AAPL,stock,185.4,,,
/// ```
///
/// Every column besides the three fixed ones is a numeric book field.
/// Empty cells are left out of the update, so the instrument keeps its
/// previous value for that field.
pub struct CsvUpdateSource {
    input: CsvInput,
}

impl CsvUpdateSource {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            input: CsvInput::Path(path.into()),
        }
    }

    /// Single-use: a second `emit_updates` call fails.
    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        Self {
            input: CsvInput::Reader(Some(Box::new(reader))),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.input {
            CsvInput::Path(p) => Some(p),
            CsvInput::Reader(_) => None,
        }
    }

    fn open(&mut self) -> Result<Box<dyn Read + Send>, SourceError> {
        match &mut self.input {
            CsvInput::Path(path) => Ok(Box::new(File::open(path)?)),
            CsvInput::Reader(reader) => reader
                .take()
                .ok_or_else(|| SourceError::Other("CSV reader already consumed".into())),
        }
    }
}

impl UpdateSource for CsvUpdateSource {
    fn emit_updates(&mut self) -> Result<UpdateStream<'_>, SourceError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(self.open()?);
        let layout = ColumnLayout::from_headers(reader.headers().map_err(csv_error)?)?;

        let rows = reader.into_records().map(move |record| {
            let record: StringRecord = record.map_err(csv_error)?;
            layout.parse(&record)
        });
        Ok(Box::new(rows))
    }
}

/// Column positions resolved from the header row.
struct ColumnLayout {
    timestamp: usize,
    instrument_id: usize,
    instrument_type: usize,
    fields: Vec<(usize, String)>,
}

impl ColumnLayout {
    fn from_headers(headers: &StringRecord) -> Result<Self, SourceError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| SourceError::Parse {
                    line: 1,
                    message: format!("missing column '{name}'"),
                })
        };
        let timestamp = find(TIMESTAMP_COLUMN)?;
        let instrument_id = find(ID_COLUMN)?;
        let instrument_type = find(TYPE_COLUMN)?;
        let fields = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| ![timestamp, instrument_id, instrument_type].contains(i))
            .map(|(i, h)| (i, h.to_string()))
            .collect();

        Ok(Self {
            timestamp,
            instrument_id,
            instrument_type,
            fields,
        })
    }

    fn parse(&self, record: &StringRecord) -> Result<InstrumentUpdate, SourceError> {
        let line = record.position().map_or(0, |p| p.line());
        let parse_err = |message: String| SourceError::Parse { line, message };
        let cell = |i: usize| record.get(i).unwrap_or("");

        let timestamp = parse_timestamp(cell(self.timestamp)).map_err(parse_err)?;

        let id = cell(self.instrument_id);
        if id.is_empty() {
            return Err(parse_err("empty instrument_id".into()));
        }
        let kind = InstrumentKind::parse(cell(self.instrument_type));

        let mut book = BookData::new();
        for (i, name) in &self.fields {
            let raw = cell(*i);
            if raw.is_empty() {
                continue;
            }
            let value: f64 = raw
                .parse()
                .map_err(|e| parse_err(format!("field '{name}': cannot parse '{raw}': {e}")))?;
            book.insert(name.clone(), value);
        }

        Ok(InstrumentUpdate::new(id, kind, Timestamp(timestamp), book))
    }
}

/// Integer logical time, or an RFC 3339 date-time as epoch milliseconds.
pub fn parse_timestamp(raw: &str) -> Result<i64, String> {
    if let Ok(t) = raw.parse::<i64>() {
        return Ok(t);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.timestamp_millis())
        .map_err(|e| format!("invalid timestamp '{raw}': {e}"))
}

fn csv_error(e: csv::Error) -> SourceError {
    SourceError::Parse {
        line: e.position().map_or(0, |p| p.line()),
        message: e.to_string(),
    }
}

// ─── Synthetic ───────────────────────────────────────────────────────

/// Deterministic random walk over a fixed set of stock symbols.
///
/// Updates rotate through the symbols in order, one every `step` time
/// units starting at `start`. Each symbol walks from 100.0 with its own
/// RNG, seeded from the symbol name and `seed`, so the same
/// configuration always yields the same stream.
#[derive(Debug, Clone)]
pub struct SyntheticUpdateSource {
    symbols: Vec<String>,
    updates: usize,
    start: i64,
    step: i64,
    seed: u64,
}

impl SyntheticUpdateSource {
    pub fn new(symbols: Vec<String>, updates: usize, step: i64) -> Self {
        Self {
            symbols,
            updates,
            start: 0,
            step,
            seed: 0,
        }
    }

    pub fn with_start(mut self, start: i64) -> Self {
        self.start = start;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl UpdateSource for SyntheticUpdateSource {
    fn emit_updates(&mut self) -> Result<UpdateStream<'_>, SourceError> {
        if self.symbols.is_empty() {
            return Err(SourceError::Other("synthetic source has no symbols".into()));
        }
        let mut walks: Vec<Walk> = self
            .symbols
            .iter()
            .map(|symbol| Walk::new(symbol, self.seed))
            .collect();
        let (start, step) = (self.start, self.step);

        Ok(Box::new((0..self.updates).map(move |k| {
            let n = walks.len();
            let walk = &mut walks[k % n];
            let time = start.saturating_add(step.saturating_mul(k as i64));
            Ok::<_, SourceError>(walk.next_update(Timestamp(time)))
        })))
    }
}

/// Per-symbol random walk state.
struct Walk {
    symbol: String,
    rng: StdRng,
    price: f64,
}

impl Walk {
    fn new(symbol: &str, seed: u64) -> Self {
        // Deterministic seed from symbol name and run seed
        let mut hasher = blake3::Hasher::new();
        hasher.update(&seed.to_le_bytes());
        hasher.update(symbol.as_bytes());
        let seed: [u8; 32] = *hasher.finalize().as_bytes();

        Self {
            symbol: symbol.to_string(),
            rng: StdRng::from_seed(seed),
            price: 100.0,
        }
    }

    fn next_update(&mut self, time: Timestamp) -> InstrumentUpdate {
        let ret: f64 = self.rng.gen_range(-0.002..0.002);
        self.price *= 1.0 + ret;
        let half_spread = self.price * self.rng.gen_range(0.0001..0.0005);
        let volume = self.rng.gen_range(100..10_000u64) as f64;

        InstrumentUpdate::new(
            self.symbol.clone(),
            InstrumentKind::Stock,
            time,
            BookData::new()
                .with("price", self.price)
                .with("bid", self.price - half_spread)
                .with("ask", self.price + half_spread)
                .with("volume", volume),
        )
    }
}
