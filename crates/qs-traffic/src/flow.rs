//! Outflow rate limiting.
//!
//! The accumulator holds how many vehicle-equivalents may still leave the
//! link.  It is topped up by `per_tick` for every tick in which it sits below
//! its burst limit `max(1, per_tick)`, and a vehicle may leave only while at
//! least one full unit is available.  Leaving subtracts the vehicle's size,
//! so a large vehicle can drive the accumulator negative; later ticks repay
//! the debt.  Fractions are carried across ticks, which keeps long-run
//! throughput equal to `per_tick` per tick while demand lasts.
//!
//! Replenishment is lazy: a link that was idle for many ticks catches up in
//! one step the next time it is touched.

use qs_core::{PCE_EPSILON, Tick};

#[derive(Clone, Debug, PartialEq)]
pub struct FlowCapacity {
    per_tick:    f64,
    burst:       f64,
    accumulator: f64,
    last_update: Tick,
}

impl FlowCapacity {
    /// A full accumulator (one burst available at tick 0).
    pub fn new(per_tick: f64) -> Self {
        let burst = per_tick.max(1.0);
        Self { per_tick, burst, accumulator: burst, last_update: Tick::ZERO }
    }

    #[inline]
    pub fn per_tick(&self) -> f64 {
        self.per_tick
    }

    #[inline]
    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Apply the top-ups of every tick since the last call, up to `now`.
    pub fn replenish(&mut self, now: Tick) {
        let elapsed = now.since(self.last_update);
        if elapsed == 0 {
            return;
        }
        self.last_update = now;
        if self.accumulator >= self.burst {
            return;
        }
        // Ticks needed to reach the burst limit; the last one may overshoot.
        let needed = ((self.burst - self.accumulator) / self.per_tick).ceil() as u64;
        self.accumulator += self.per_tick * elapsed.min(needed.max(1)) as f64;
    }

    #[inline]
    pub fn can_release(&self) -> bool {
        self.accumulator + PCE_EPSILON >= 1.0
    }

    #[inline]
    pub fn consume(&mut self, pce: f64) {
        self.accumulator -= pce;
    }
}
