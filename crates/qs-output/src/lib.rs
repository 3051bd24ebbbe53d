//! `qs-output`: simulation output writers for the rust_qsim queue simulation.
//!
//! Two backends are provided:
//!
//! | Feature   | Backend | Files created                                                |
//! |-----------|---------|--------------------------------------------------------------|
//! | *(none)*  | CSV     | `events.csv`, `tick_summaries.csv`, `link_snapshots.csv`     |
//! | `sqlite`  | SQLite  | `output.db`                                                  |
//!
//! Both implement [`OutputWriter`].  [`SimOutputObserver`] feeds tick
//! summaries and link snapshots to the writer; the [`EventWriterHandler`] it
//! hands out writes the event stream through the same writer.
//!
//! # Usage
//!
//! ```rust,ignore
//! use qs_output::{CsvWriter, SimOutputObserver};
//!
//! let mut obs = SimOutputObserver::new(CsvWriter::new(Path::new("./output"))?, &config);
//! let mut sim = SimBuilder::new(config.clone(), network, population)
//!     .event_handler(obs.event_handler(&config))
//!     .build()?;
//! sim.run(&mut obs)?;
//! if let Some(e) = obs.take_error() {
//!     eprintln!("output error: {e}");
//! }
//! ```

pub mod csv;
pub mod error;
pub mod handler;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;


pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use handler::EventWriterHandler;
pub use observer::SimOutputObserver;
pub use row::{EventRow, LinkSnapshotRow, TickSummaryRow};
pub use writer::{OutputWriter, SharedWriter};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;
