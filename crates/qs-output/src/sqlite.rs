//! SQLite output backend (feature `sqlite`).
//!
//! Creates `output.db` in the output directory with three tables: `events`,
//! `tick_summaries` and `link_snapshots`.

use std::path::Path;

use rusqlite::{Connection, params};

use crate::writer::OutputWriter;
use crate::{EventRow, LinkSnapshotRow, OutputResult, TickSummaryRow};

pub struct SqliteWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) `output.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir)?;
        let conn = Connection::open(dir.join("output.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS events (
                 time_secs INTEGER NOT NULL,
                 type      TEXT    NOT NULL,
                 agent     INTEGER,
                 vehicle   INTEGER,
                 link      INTEGER,
                 stop      INTEGER,
                 detail    TEXT    NOT NULL
             );
             CREATE TABLE IF NOT EXISTS tick_summaries (
                 tick       INTEGER PRIMARY KEY,
                 time_secs  INTEGER NOT NULL,
                 woken      INTEGER NOT NULL,
                 departures INTEGER NOT NULL,
                 arrivals   INTEGER NOT NULL,
                 moved      INTEGER NOT NULL,
                 aborted    INTEGER NOT NULL,
                 events     INTEGER NOT NULL,
                 en_route   INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS link_snapshots (
                 tick         INTEGER NOT NULL,
                 link         INTEGER NOT NULL,
                 queued       INTEGER NOT NULL,
                 buffered     INTEGER NOT NULL,
                 waiting      INTEGER NOT NULL,
                 held         INTEGER NOT NULL,
                 occupied_pce REAL    NOT NULL,
                 storage_pce  REAL    NOT NULL,
                 density      REAL    NOT NULL,
                 PRIMARY KEY (tick, link)
             );",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl OutputWriter for SqliteWriter {
    fn write_events(&mut self, rows: &[EventRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO events (time_secs, type, agent, vehicle, link, stop, detail) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for row in rows {
                stmt.execute(params![row.time_secs, row.kind, row.agent, row.vehicle, row.link, row.stop, row.detail])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO tick_summaries \
             (tick, time_secs, woken, departures, arrivals, moved, aborted, events, en_route) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                row.tick,
                row.time_secs,
                row.woken,
                row.departures,
                row.arrivals,
                row.moved,
                row.aborted,
                row.events,
                row.en_route,
            ],
        )?;
        Ok(())
    }

    fn write_link_snapshots(&mut self, rows: &[LinkSnapshotRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO link_snapshots \
                 (tick, link, queued, buffered, waiting, held, occupied_pce, storage_pce, density) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for row in rows {
                stmt.execute(params![
                    row.tick,
                    row.link,
                    row.queued,
                    row.buffered,
                    row.waiting,
                    row.held,
                    row.occupied_pce,
                    row.storage_pce,
                    row.density,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
