//! Dwell time at a stop.

use qs_core::StopId;

use crate::VehicleType;

/// Everything a dwell model may look at.
#[derive(Clone, Copy, Debug)]
pub struct DwellInput<'a> {
    pub stop:          StopId,
    pub entering:      usize,
    pub leaving:       usize,
    /// `false` when the vehicle already computed a dwell at this stop.
    pub first_service: bool,
    pub vehicle_type:  &'a VehicleType,
}

/// Pluggable dwell model.
pub trait StopHandler: Send + Sync {
    /// Seconds the vehicle stays at the stop for this exchange.  Zero lets
    /// it leave immediately.
    fn dwell_secs(&self, input: &DwellInput<'_>) -> f64;
}

/// Serial boarding and alighting through one door.
///
/// ```text
/// dwell = access × entering + egress × leaving (+ door time on first service)
/// ```
///
/// No exchange means no dwell.
#[derive(Copy, Clone, Debug, Default)]
pub struct SimpleStopHandler;

impl StopHandler for SimpleStopHandler {
    fn dwell_secs(&self, input: &DwellInput<'_>) -> f64 {
        if input.entering == 0 && input.leaving == 0 {
            return 0.0;
        }
        let vt = input.vehicle_type;
        let mut secs = vt.access_secs_per_person * input.entering as f64
            + vt.egress_secs_per_person * input.leaving as f64;
        if input.first_service {
            secs += vt.door_operation_secs;
        }
        secs
    }
}

impl<H: StopHandler + ?Sized> StopHandler for Box<H> {
    fn dwell_secs(&self, input: &DwellInput<'_>) -> f64 {
        (**self).dwell_secs(input)
    }
}
