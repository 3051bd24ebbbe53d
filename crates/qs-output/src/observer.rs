//! `SimOutputObserver<W>`: bridges `SimObserver` to an `OutputWriter`.

use qs_agent::AgentStore;
use qs_core::{SimClock, SimConfig, Tick};
use qs_sim::{SimObserver, TickStats};
use qs_traffic::LinkQueue;

use crate::handler::EventWriterHandler;
use crate::writer::{OutputWriter, SharedWriter};
use crate::{LinkSnapshotRow, OutputError, TickSummaryRow};

/// A [`SimObserver`] that writes one summary row per tick and, at every
/// snapshot tick, one row per occupied link.
///
/// Errors from the writer are stored because `SimObserver` methods have no
/// return value.  After `sim.run()` returns, check them with
/// [`take_error`][Self::take_error].
pub struct SimOutputObserver<W: OutputWriter> {
    writer: SharedWriter<W>,
    clock:  SimClock,
}

impl<W: OutputWriter> SimOutputObserver<W> {
    pub fn new(writer: W, config: &SimConfig) -> Self {
        Self { writer: SharedWriter::new(writer), clock: config.make_clock() }
    }

    /// An event handler that writes through the same writer.
    pub fn event_handler(&self, config: &SimConfig) -> EventWriterHandler<W> {
        EventWriterHandler::new(self.writer.clone(), config)
    }

    /// Take the first write error, if any.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.writer.take_error()
    }

    /// Recover the writer.  `None` while an event handler still holds it.
    pub fn into_writer(self) -> Option<W> {
        self.writer.into_inner()
    }
}

impl<W: OutputWriter> SimObserver for SimOutputObserver<W> {
    fn on_tick_end(&mut self, tick: Tick, stats: &TickStats) {
        let row = TickSummaryRow::new(tick, self.clock.secs_at(tick), stats);
        self.writer.write(|w| w.write_tick_summary(&row));
    }

    fn on_snapshot(&mut self, tick: Tick, links: &[LinkQueue], _agents: &AgentStore) {
        let rows: Vec<LinkSnapshotRow> = links
            .iter()
            .filter(|q| q.is_active())
            .map(|q| LinkSnapshotRow::new(tick, q))
            .collect();
        if !rows.is_empty() {
            self.writer.write(|w| w.write_link_snapshots(&rows));
        }
    }

    fn on_sim_end(&mut self, final_tick: Tick) {
        log::debug!("closing output at {final_tick}");
        self.writer.write(|w| w.finish());
    }
}
