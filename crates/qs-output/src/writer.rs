//! The `OutputWriter` trait and the shared slot the event handler and the
//! observer write through.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::{EventRow, LinkSnapshotRow, OutputError, OutputResult, TickSummaryRow};

/// Trait implemented by the CSV and SQLite writers.
pub trait OutputWriter: Send {
    fn write_events(&mut self, rows: &[EventRow]) -> OutputResult<()>;

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()>;

    fn write_link_snapshots(&mut self, rows: &[LinkSnapshotRow]) -> OutputResult<()>;

    /// Flush and close all underlying handles.
    ///
    /// Idempotent.
    fn finish(&mut self) -> OutputResult<()>;
}

struct Slot<W> {
    writer: W,
    error:  Option<OutputError>,
}

/// A writer shared between an [`EventWriterHandler`][crate::EventWriterHandler]
/// and a [`SimOutputObserver`][crate::SimOutputObserver].
///
/// Neither callback can return an error, so the first failure is kept here
/// and later writes are skipped.
pub struct SharedWriter<W> {
    slot: Arc<Mutex<Slot<W>>>,
}

impl<W> Clone for SharedWriter<W> {
    fn clone(&self) -> Self {
        Self { slot: Arc::clone(&self.slot) }
    }
}

impl<W: OutputWriter> SharedWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { slot: Arc::new(Mutex::new(Slot { writer, error: None })) }
    }

    fn lock(&self) -> MutexGuard<'_, Slot<W>> {
        self.slot.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Run `f` against the writer unless an earlier write failed.
    pub(crate) fn write(&self, f: impl FnOnce(&mut W) -> OutputResult<()>) {
        let mut slot = self.lock();
        if slot.error.is_some() {
            return;
        }
        if let Err(e) = f(&mut slot.writer) {
            log::error!("output write failed: {e}");
            slot.error = Some(e);
        }
    }

    /// Take the stored write error, if any.
    pub fn take_error(&self) -> Option<OutputError> {
        self.lock().error.take()
    }

    /// Recover the writer once every other handle has been dropped.
    pub fn into_inner(self) -> Option<W> {
        Arc::try_unwrap(self.slot)
            .ok()
            .map(|m| m.into_inner().unwrap_or_else(|p| p.into_inner()).writer)
    }
}
