//! JSONL execution sink — one JSON object per execution, one per line.

use std::fs::{self, File};
use std::io::{self, BufRead, BufWriter, Write};
use std::path::Path;

use ticklab_core::domain::Timestamp;
use ticklab_core::execution::{Execution, ExecutionSink, SinkError};

pub struct JsonlSink<W: Write + Send> {
    writer: W,
    written: u64,
}

impl JsonlSink<BufWriter<File>> {
    /// Create (or truncate) `path`, creating parent directories as needed.
    pub fn create(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write + Send> JsonlSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Executions written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> ExecutionSink for JsonlSink<W> {
    fn consume(&mut self, _time: Timestamp, executions: &[Execution]) -> Result<(), SinkError> {
        for execution in executions {
            let json = serde_json::to_string(execution)
                .map_err(|e| SinkError::Serialize(e.to_string()))?;
            writeln!(self.writer, "{json}")?;
            self.written += 1;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Read back an executions file written by `JsonlSink`.
///
/// Blank lines are skipped; a malformed line is an error.
pub fn read_executions(path: &Path) -> io::Result<Vec<Execution>> {
    let reader = io::BufReader::new(File::open(path)?);
    let mut executions = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let execution = serde_json::from_str(&line)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        executions.push(execution);
    }
    Ok(executions)
}
