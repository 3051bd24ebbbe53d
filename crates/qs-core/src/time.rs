//! Simulation time model.
//!
//! Time advances in whole `Tick`s.  `SimClock` maps ticks to seconds since
//! midnight of the simulated day:
//!
//!   time_secs = start_secs + tick * tick_duration_secs
//!
//! Plans and schedules are written in seconds; the scheduler converts them
//! with [`SimClock::tick_at_or_after`], rounding up so nothing ever happens
//! earlier than planned.  The default resolution is one second per tick.

use std::fmt;

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }

    /// Ticks elapsed from `earlier` to `self`, zero if `earlier` is later.
    #[inline]
    pub fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl std::ops::Sub for Tick {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: Tick) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Converts between tick counts and seconds of the simulated day.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// Seconds after midnight at tick 0.
    pub start_secs: u64,
    /// Simulated seconds per tick.  Default: 1.
    pub tick_duration_secs: u32,
    /// The current tick, advanced once per loop iteration.
    pub current_tick: Tick,
}

impl SimClock {
    pub fn new(start_secs: u64, tick_duration_secs: u32) -> Self {
        Self {
            start_secs,
            tick_duration_secs,
            current_tick: Tick::ZERO,
        }
    }

    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = Tick(self.current_tick.0 + 1);
    }

    /// Seconds after midnight at `tick`.
    #[inline]
    pub fn secs_at(&self, tick: Tick) -> u64 {
        self.start_secs + tick.0 * self.tick_duration_secs as u64
    }

    /// Seconds after midnight at the current tick.
    #[inline]
    pub fn now_secs(&self) -> u64 {
        self.secs_at(self.current_tick)
    }

    /// The first tick whose time is at or after `secs`.  Times before the
    /// start map to tick 0.
    #[inline]
    pub fn tick_at_or_after(&self, secs: u64) -> Tick {
        Tick(self.ticks_for_secs(secs.saturating_sub(self.start_secs)))
    }

    /// How many ticks span `secs` seconds (rounds up).
    #[inline]
    pub fn ticks_for_secs(&self, secs: u64) -> u64 {
        secs.div_ceil(self.tick_duration_secs as u64)
    }

    /// Like [`ticks_for_secs`](Self::ticks_for_secs) for fractional
    /// durations such as dwell times.
    #[inline]
    pub fn ticks_for_secs_f64(&self, secs: f64) -> u64 {
        if secs <= 0.0 {
            return 0;
        }
        (secs / self.tick_duration_secs as f64).ceil() as u64
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.now_secs();
        write!(
            f,
            "{} ({:02}:{:02}:{:02})",
            self.current_tick,
            secs / 3_600,
            (secs % 3_600) / 60,
            secs % 60
        )
    }
}
