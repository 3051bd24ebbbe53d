//! Road space bookkeeping.

use qs_core::PCE_EPSILON;

/// Occupied and available storage of one link, in vehicle-equivalents.
///
/// `occupants` counts the vehicles currently holding storage so that a
/// single vehicle larger than the whole link can still use an otherwise
/// empty link.
#[derive(Clone, Debug, PartialEq)]
pub struct Storage {
    capacity:  f64,
    used:      f64,
    occupants: usize,
}

impl Storage {
    pub fn new(capacity: f64) -> Self {
        Self { capacity, used: 0.0, occupants: 0 }
    }

    #[inline]
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    #[inline]
    pub fn used(&self) -> f64 {
        self.used
    }

    #[inline]
    pub fn occupants(&self) -> usize {
        self.occupants
    }

    /// `true` if a vehicle of size `pce` may enter now.
    #[inline]
    pub fn has_space(&self, pce: f64) -> bool {
        self.occupants == 0 || self.used + pce <= self.capacity + PCE_EPSILON
    }

    pub fn consume(&mut self, pce: f64) {
        self.used += pce;
        self.occupants += 1;
    }

    pub fn release(&mut self, pce: f64) {
        self.occupants = self.occupants.saturating_sub(1);
        self.used = if self.occupants == 0 { 0.0 } else { (self.used - pce).max(0.0) };
    }

    /// `false` only if more than one vehicle together exceed the capacity.
    pub fn within_capacity(&self) -> bool {
        self.occupants <= 1 || self.used <= self.capacity + PCE_EPSILON
    }
}
