//! The transit schedule: stops, lines, routes, departures, vehicle types.
//!
//! Everything is stored in flat `Vec`s addressed by the typed ids from
//! `qs-core`; departures are numbered across the whole schedule so a
//! `DepartureId` alone identifies one vehicle trip.

use std::sync::Arc;

use qs_core::{Coord, DepartureId, LineId, LinkId, StopId, TransitRouteId};
use qs_network::Network;
use qs_population::TransitPassengerRoute;
use qs_traffic::StopRef;

use crate::{TransitError, TransitResult};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransitStop {
    pub name:  Arc<str>,
    /// Link the stop is served from.  Vehicles stop at its downstream end.
    pub link:  LinkId,
    pub coord: Coord,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleType {
    pub name: Arc<str>,
    /// Passenger seats and standing places.
    pub capacity: u32,
    /// Size on the road in vehicle-equivalents.
    pub pce: f64,
    pub access_secs_per_person: f64,
    pub egress_secs_per_person: f64,
    /// Added to the dwell the first time a stop is served.
    pub door_operation_secs: f64,
}

impl VehicleType {
    /// A standard bus: 4 s to board, 2 s to alight, 15 s door time.
    pub fn bus(capacity: u32) -> Self {
        Self {
            name: Arc::from("bus"),
            capacity,
            pce: 2.0,
            access_secs_per_person: 4.0,
            egress_secs_per_person: 2.0,
            door_operation_secs: 15.0,
        }
    }
}

/// A stop along a route with its scheduled offsets from departure.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteStop {
    pub stop: StopId,
    pub arrival_offset_secs:   f64,
    pub departure_offset_secs: f64,
    pub await_departure:       bool,
}

impl RouteStop {
    pub fn new(stop: StopId, arrival_offset_secs: f64, departure_offset_secs: f64) -> Self {
        Self { stop, arrival_offset_secs, departure_offset_secs, await_departure: false }
    }

    pub fn awaiting_departure(mut self) -> Self {
        self.await_departure = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransitRoute {
    pub line:  LineId,
    /// Full network route, first and last link included.
    pub links: Arc<[LinkId]>,
    pub stops: Vec<RouteStop>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransitLine {
    pub name:   Arc<str>,
    pub routes: Vec<TransitRouteId>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Departure {
    pub route:        TransitRouteId,
    /// Scheduled departure from the first stop, seconds after midnight.
    pub time_secs:    u64,
    pub vehicle_type: usize,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransitSchedule {
    pub stops:         Vec<TransitStop>,
    pub lines:         Vec<TransitLine>,
    pub routes:        Vec<TransitRoute>,
    pub departures:    Vec<Departure>,
    pub vehicle_types: Vec<VehicleType>,
}

impl TransitSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.departures.is_empty()
    }

    // ── Construction ──────────────────────────────────────────────────────

    pub fn add_stop(&mut self, name: &str, link: LinkId, coord: Coord) -> StopId {
        let id = StopId(self.stops.len() as u32);
        self.stops.push(TransitStop { name: Arc::from(name), link, coord });
        id
    }

    pub fn add_vehicle_type(&mut self, vehicle_type: VehicleType) -> usize {
        self.vehicle_types.push(vehicle_type);
        self.vehicle_types.len() - 1
    }

    pub fn add_line(&mut self, name: &str) -> LineId {
        let id = LineId(self.lines.len() as u32);
        self.lines.push(TransitLine { name: Arc::from(name), routes: Vec::new() });
        id
    }

    /// Add a route to `line`.  Fails only if the line does not exist; the
    /// route itself is checked by [`validate`](Self::validate).
    pub fn add_route(
        &mut self,
        line:  LineId,
        links: Vec<LinkId>,
        stops: Vec<RouteStop>,
    ) -> TransitResult<TransitRouteId> {
        let id = TransitRouteId(self.routes.len() as u32);
        self.lines
            .get_mut(line.index())
            .ok_or(TransitError::UnknownLine(line))?
            .routes
            .push(id);
        self.routes.push(TransitRoute { line, links: links.into(), stops });
        Ok(id)
    }

    pub fn add_departure(&mut self, route: TransitRouteId, time_secs: u64, vehicle_type: usize) -> DepartureId {
        let id = DepartureId(self.departures.len() as u32);
        self.departures.push(Departure { route, time_secs, vehicle_type });
        id
    }

    // ── Lookup ────────────────────────────────────────────────────────────

    pub fn stop(&self, stop: StopId) -> TransitResult<&TransitStop> {
        self.stops.get(stop.index()).ok_or(TransitError::UnknownStop(stop))
    }

    pub fn route(&self, route: TransitRouteId) -> TransitResult<&TransitRoute> {
        self.routes.get(route.index()).ok_or(TransitError::UnknownRoute(route))
    }

    pub fn vehicle_type(&self, index: usize) -> TransitResult<&VehicleType> {
        self.vehicle_types
            .get(index)
            .ok_or(TransitError::UnknownVehicleType(index))
    }

    /// The stop sequence of `route` as seen by a vehicle.
    pub fn stop_refs(&self, route: TransitRouteId) -> TransitResult<Arc<[StopRef]>> {
        self.route(route)?
            .stops
            .iter()
            .map(|s| {
                Ok(StopRef {
                    stop:                  s.stop,
                    link:                  self.stop(s.stop)?.link,
                    arrival_offset_secs:   s.arrival_offset_secs,
                    departure_offset_secs: s.departure_offset_secs,
                    await_departure:       s.await_departure,
                })
            })
            .collect()
    }

    // ── Validation ────────────────────────────────────────────────────────

    /// Check every reference against itself and `network`.
    ///
    /// Route stops must be reachable in order along the route's links, so
    /// a vehicle driving the route passes every stop.
    pub fn validate(&self, network: &Network) -> TransitResult<()> {
        for stop in &self.stops {
            if !network.contains_link(stop.link) {
                return Err(TransitError::Network(qs_network::NetworkError::LinkNotFound(stop.link)));
            }
        }
        for (i, vt) in self.vehicle_types.iter().enumerate() {
            if vt.capacity == 0 || !(vt.pce.is_finite() && vt.pce > 0.0) {
                return Err(TransitError::InvalidVehicleType(i));
            }
        }
        for (i, route) in self.routes.iter().enumerate() {
            let id = TransitRouteId(i as u32);
            if route.line.index() >= self.lines.len() {
                return Err(TransitError::UnknownLine(route.line));
            }
            network.check_route(&route.links)?;
            let mut pos = 0;
            for s in &route.stops {
                let link = self.stop(s.stop)?.link;
                pos += route.links[pos..]
                    .iter()
                    .position(|&l| l == link)
                    .ok_or_else(|| TransitError::InvalidRoute {
                        route:  id,
                        reason: format!("stop {} is not on the remaining route", s.stop),
                    })?;
            }
        }
        for d in &self.departures {
            self.route(d.route)?;
            self.vehicle_type(d.vehicle_type)?;
        }
        Ok(())
    }

    /// Check that a passenger can ride `trip`: the route belongs to the
    /// line and serves the access stop before the egress stop.
    pub fn check_passenger_route(&self, trip: &TransitPassengerRoute) -> TransitResult<()> {
        let route = self.route(trip.route)?;
        if route.line != trip.line {
            return Err(TransitError::InvalidPassengerRoute {
                route:  trip.route,
                reason: format!("route belongs to line {}, not {}", route.line, trip.line),
            });
        }
        let access = route.stops.iter().position(|s| s.stop == trip.access_stop);
        let egress = route.stops.iter().rposition(|s| s.stop == trip.egress_stop);
        match (access, egress) {
            (Some(a), Some(e)) if a < e => Ok(()),
            _ => Err(TransitError::InvalidPassengerRoute {
                route:  trip.route,
                reason: format!("{} is not served after {}", trip.egress_stop, trip.access_stop),
            }),
        }
    }
}
