//! `EventWriterHandler`: an [`EventHandler`] that writes every event.

use qs_core::{SimClock, SimConfig};
use qs_events::{Event, EventHandler};

use crate::writer::{OutputWriter, SharedWriter};
use crate::EventRow;

/// Rows are handed to the writer in batches of this size.
const BATCH: usize = 4_096;

/// Flattens events into [`EventRow`]s and writes them in batches.
///
/// Register it with `SimBuilder::event_handler`.  The last partial batch is
/// written when the run finishes; write errors end up in the
/// [`SharedWriter`].
pub struct EventWriterHandler<W: OutputWriter> {
    writer:  SharedWriter<W>,
    clock:   SimClock,
    pending: Vec<EventRow>,
}

impl<W: OutputWriter> EventWriterHandler<W> {
    pub fn new(writer: SharedWriter<W>, config: &SimConfig) -> Self {
        Self { writer, clock: config.make_clock(), pending: Vec::with_capacity(BATCH) }
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let rows = std::mem::take(&mut self.pending);
        self.writer.write(|w| w.write_events(&rows));
    }
}

impl<W: OutputWriter> EventHandler for EventWriterHandler<W> {
    fn handle_event(&mut self, event: &Event) {
        self.pending.push(EventRow::from_event(event, &self.clock));
        if self.pending.len() >= BATCH {
            self.flush();
        }
    }

    fn finish(&mut self) {
        self.flush();
        self.writer.write(|w| w.finish());
    }
}
