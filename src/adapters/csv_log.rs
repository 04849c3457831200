//! Buffered CSV autosession log.
//!
//! Records are held in a fixed-capacity buffer and written out once
//! `flush_threshold` of them have accumulated (or on an explicit flush
//! when the autosession ends), keeping flash writes off the per-cycle
//! path.  The header row is written before the first data row.

use std::io::Write;

use log::warn;

use crate::app::events::CycleRecord;
use crate::app::ports::CycleLogSink;

/// Upper bound on `flush_threshold`.
pub const MAX_BUFFERED: usize = 200;

pub struct CsvCycleLog<W: Write> {
    writer: W,
    pending: heapless::Vec<CycleRecord, MAX_BUFFERED>,
    flush_threshold: usize,
    header_written: bool,
    rows_written: u32,
}

impl<W: Write> CsvCycleLog<W> {
    /// `flush_threshold` is clamped to `1..=MAX_BUFFERED`.
    pub fn new(writer: W, flush_threshold: u16) -> Self {
        Self {
            writer,
            pending: heapless::Vec::new(),
            flush_threshold: usize::from(flush_threshold).clamp(1, MAX_BUFFERED),
            header_written: false,
            rows_written: 0,
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn rows_written(&self) -> u32 {
        self.rows_written
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_pending(&mut self) -> std::io::Result<()> {
        if !self.header_written {
            writeln!(self.writer, "{}", CycleRecord::CSV_HEADER)?;
            self.header_written = true;
        }
        for record in &self.pending {
            record.write_csv(&mut self.writer)?;
            self.rows_written += 1;
        }
        self.writer.flush()
    }
}

impl<W: Write> CycleLogSink for CsvCycleLog<W> {
    fn record(&mut self, record: &CycleRecord) {
        if self.pending.push(*record).is_err() {
            warn!("csv log: buffer full, row dropped");
        }
        if self.pending.len() >= self.flush_threshold {
            self.flush();
        }
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        if let Err(e) = self.write_pending() {
            warn!("csv log: write failed: {}", e);
        }
        self.pending.clear();
    }
}
