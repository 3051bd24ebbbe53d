//! CSV output backend.
//!
//! Creates three files in the output directory:
//! - `events.csv`
//! - `tick_summaries.csv`
//! - `link_snapshots.csv`

use std::fs::File;
use std::path::Path;

use csv::{Writer, WriterBuilder};
use serde::Serialize;

use crate::writer::OutputWriter;
use crate::{EventRow, LinkSnapshotRow, OutputResult, TickSummaryRow};

pub struct CsvWriter {
    events:    Writer<File>,
    summaries: Writer<File>,
    snapshots: Writer<File>,
    finished:  bool,
}

fn open(path: &Path, header: &[&str]) -> OutputResult<Writer<File>> {
    let mut w = WriterBuilder::new().has_headers(false).from_path(path)?;
    w.write_record(header)?;
    Ok(w)
}

fn write_all<T: Serialize>(w: &mut Writer<File>, rows: &[T]) -> OutputResult<()> {
    for row in rows {
        w.serialize(row)?;
    }
    Ok(())
}

impl CsvWriter {
    /// Create the three files in `dir` and write their header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            events:    open(&dir.join("events.csv"), &EventRow::HEADER)?,
            summaries: open(&dir.join("tick_summaries.csv"), &TickSummaryRow::HEADER)?,
            snapshots: open(&dir.join("link_snapshots.csv"), &LinkSnapshotRow::HEADER)?,
            finished:  false,
        })
    }
}

impl OutputWriter for CsvWriter {
    fn write_events(&mut self, rows: &[EventRow]) -> OutputResult<()> {
        write_all(&mut self.events, rows)
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.summaries.serialize(row)?;
        Ok(())
    }

    fn write_link_snapshots(&mut self, rows: &[LinkSnapshotRow]) -> OutputResult<()> {
        write_all(&mut self.snapshots, rows)
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.events.flush()?;
        self.summaries.flush()?;
        self.snapshots.flush()?;
        Ok(())
    }
}
