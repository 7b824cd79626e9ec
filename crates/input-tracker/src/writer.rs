//! Append-only JSONL telemetry export.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use aimforge_common::error::{AimError, AimResult};
use aimforge_run_model::event::ClassifiedEvent;
use aimforge_run_model::sample::{Sample, SampleStreamHeader};

/// Writes one run's telemetry to a JSONL file.
///
/// The header is written as a `#`-prefixed comment line so that
/// [`aimforge_run_model::sample::parse_samples`] can read the file back.
pub struct TelemetryWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    records_written: u64,
}

impl TelemetryWriter {
    /// Create a new writer, writing the header as the first line.
    pub fn new(path: impl AsRef<Path>, header: &SampleStreamHeader) -> AimResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;

        let mut writer = BufWriter::new(file);

        let header_json = serde_json::to_string(header)?;
        writeln!(writer, "# {header_json}")
            .map_err(|e| AimError::telemetry(format!("Failed to write header: {e}")))?;

        Ok(Self {
            writer,
            path,
            records_written: 0,
        })
    }

    /// Write a single record as a JSONL line.
    pub fn write_record<T: Serialize>(&mut self, record: &T) -> AimResult<()> {
        let json = serde_json::to_string(record)?;
        writeln!(self.writer, "{json}")
            .map_err(|e| AimError::telemetry(format!("Failed to write record: {e}")))?;
        self.records_written += 1;

        // Flush every 1000 records so a crash loses little
        if self.records_written % 1000 == 0 {
            self.flush()?;
        }

        Ok(())
    }

    pub fn write_samples(&mut self, samples: &[Sample]) -> AimResult<()> {
        samples.iter().try_for_each(|s| self.write_record(s))
    }

    pub fn write_events(&mut self, events: &[ClassifiedEvent]) -> AimResult<()> {
        events.iter().try_for_each(|e| self.write_record(e))
    }

    /// Flush buffered writes to disk.
    pub fn flush(&mut self) -> AimResult<()> {
        self.writer
            .flush()
            .map_err(|e| AimError::telemetry(format!("Failed to flush telemetry: {e}")))?;
        Ok(())
    }

    /// Number of records written.
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Path to the output file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl Drop for TelemetryWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
