//! Vehicles travelling through link queues.
//!
//! There are exactly two kinds: a person's private vehicle and a scheduled
//! transit vehicle.  Both follow a fixed link sequence and are addressed by
//! the queues through the [`Movable`] trait; [`Vehicle`] is the closed sum
//! the queues actually store.

use std::sync::Arc;

use qs_core::{AgentId, DepartureId, LineId, LinkId, StopId, TransitRouteId, TransportMode, VehicleId};

// ── Movable ───────────────────────────────────────────────────────────────────

/// What a link queue needs to know about a vehicle.
pub trait Movable {
    fn id(&self) -> VehicleId;
    fn driver(&self) -> AgentId;
    fn mode(&self) -> TransportMode;
    /// Size in vehicle-equivalents.
    fn pce(&self) -> f64;
    fn max_speed_mps(&self) -> Option<f64>;
    fn route(&self) -> &[LinkId];
    /// Position of the current link within [`route`](Self::route).
    fn route_index(&self) -> usize;
    fn set_route_index(&mut self, index: usize);

    #[inline]
    fn current_link(&self) -> LinkId {
        self.route().get(self.route_index()).copied().unwrap_or(LinkId::INVALID)
    }

    #[inline]
    fn next_link(&self) -> Option<LinkId> {
        self.route().get(self.route_index() + 1).copied()
    }

    #[inline]
    fn is_on_last_link(&self) -> bool {
        self.route_index() + 1 >= self.route().len()
    }

    fn advance_route(&mut self) {
        let next = self.route_index() + 1;
        self.set_route_index(next);
    }
}

// ── PrivateVehicle ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct PrivateVehicle {
    pub id:            VehicleId,
    pub driver:        AgentId,
    pub mode:          TransportMode,
    pub pce:           f64,
    pub max_speed_mps: Option<f64>,
    pub route:         Arc<[LinkId]>,
    pub route_index:   usize,
}

impl Movable for PrivateVehicle {
    fn id(&self) -> VehicleId { self.id }
    fn driver(&self) -> AgentId { self.driver }
    fn mode(&self) -> TransportMode { self.mode }
    fn pce(&self) -> f64 { self.pce }
    fn max_speed_mps(&self) -> Option<f64> { self.max_speed_mps }
    fn route(&self) -> &[LinkId] { &self.route }
    fn route_index(&self) -> usize { self.route_index }
    fn set_route_index(&mut self, index: usize) { self.route_index = index; }
}

// ── TransitVehicle ────────────────────────────────────────────────────────────

/// One stop of a transit route as the vehicle sees it.
#[derive(Clone, Debug, PartialEq)]
pub struct StopRef {
    pub stop: StopId,
    /// Link the stop is served from.
    pub link: LinkId,
    /// Scheduled offsets from the departure time, in seconds.
    pub arrival_offset_secs:   f64,
    pub departure_offset_secs: f64,
    /// Do not leave before the scheduled departure time.
    pub await_departure: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Passenger {
    pub agent:       AgentId,
    pub egress_stop: StopId,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TransitVehicle {
    pub id:          VehicleId,
    pub driver:      AgentId,
    pub pce:         f64,
    pub route:       Arc<[LinkId]>,
    pub route_index: usize,

    pub line:          LineId,
    pub transit_route: TransitRouteId,
    pub departure:     DepartureId,
    /// Scheduled departure from the first stop, seconds after midnight.
    pub departure_secs: u64,

    pub stops: Arc<[StopRef]>,
    /// Index into `stops` of the next stop to serve.
    pub next_stop: usize,
    /// Stop currently being served, `None` while driving.
    pub serving_stop: Option<StopId>,
    /// Stop where the previous dwell was computed.
    pub last_handled_stop: Option<StopId>,
    /// Agents already refused boarding during the current stop visit.
    pub denied: Vec<AgentId>,

    pub capacity:   u32,
    pub passengers: Vec<Passenger>,
}

impl TransitVehicle {
    pub fn next_stop_ref(&self) -> Option<&StopRef> {
        self.stops.get(self.next_stop)
    }

    /// `true` if the next stop is served from `link`.
    #[inline]
    pub fn stops_on(&self, link: LinkId) -> bool {
        self.next_stop_ref().is_some_and(|s| s.link == link)
    }

    #[inline]
    pub fn has_unserved_stops(&self) -> bool {
        self.next_stop < self.stops.len()
    }

    /// Stops after the one being served.
    pub fn upcoming_stops(&self) -> &[StopRef] {
        self.stops.get(self.next_stop + 1..).unwrap_or(&[])
    }

    #[inline]
    pub fn free_seats(&self) -> usize {
        (self.capacity as usize).saturating_sub(self.passengers.len())
    }
}

impl Movable for TransitVehicle {
    fn id(&self) -> VehicleId { self.id }
    fn driver(&self) -> AgentId { self.driver }
    fn mode(&self) -> TransportMode { TransportMode::TransitDriver }
    fn pce(&self) -> f64 { self.pce }
    fn max_speed_mps(&self) -> Option<f64> { None }
    fn route(&self) -> &[LinkId] { &self.route }
    fn route_index(&self) -> usize { self.route_index }
    fn set_route_index(&mut self, index: usize) { self.route_index = index; }
}

// ── Vehicle ───────────────────────────────────────────────────────────────────

/// What a link queue stores.
#[derive(Clone, Debug, PartialEq)]
pub enum Vehicle {
    Private(PrivateVehicle),
    Transit(Box<TransitVehicle>),
}

impl Vehicle {
    pub fn as_transit(&self) -> Option<&TransitVehicle> {
        match self {
            Vehicle::Transit(t) => Some(t),
            Vehicle::Private(_) => None,
        }
    }

    pub fn as_transit_mut(&mut self) -> Option<&mut TransitVehicle> {
        match self {
            Vehicle::Transit(t) => Some(t),
            Vehicle::Private(_) => None,
        }
    }

    /// Riders other than the driver.
    pub fn passengers(&self) -> &[Passenger] {
        match self {
            Vehicle::Transit(t) => &t.passengers,
            Vehicle::Private(_) => &[],
        }
    }

    /// `true` for a transit vehicle whose next stop is on `link`.
    #[inline]
    pub fn stops_on(&self, link: LinkId) -> bool {
        self.as_transit().is_some_and(|t| t.stops_on(link))
    }
}

macro_rules! forward {
    ($self:ident, $v:ident => $e:expr) => {
        match $self {
            Vehicle::Private($v) => $e,
            Vehicle::Transit($v) => $e,
        }
    };
}

impl Movable for Vehicle {
    fn id(&self) -> VehicleId { forward!(self, v => v.id()) }
    fn driver(&self) -> AgentId { forward!(self, v => v.driver()) }
    fn mode(&self) -> TransportMode { forward!(self, v => v.mode()) }
    fn pce(&self) -> f64 { forward!(self, v => v.pce()) }
    fn max_speed_mps(&self) -> Option<f64> { forward!(self, v => v.max_speed_mps()) }
    fn route(&self) -> &[LinkId] { forward!(self, v => v.route()) }
    fn route_index(&self) -> usize { forward!(self, v => v.route_index()) }
    fn set_route_index(&mut self, index: usize) { forward!(self, v => v.set_route_index(index)) }
}

impl From<PrivateVehicle> for Vehicle {
    fn from(v: PrivateVehicle) -> Self {
        Vehicle::Private(v)
    }
}

impl From<TransitVehicle> for Vehicle {
    fn from(v: TransitVehicle) -> Self {
        Vehicle::Transit(Box::new(v))
    }
}
