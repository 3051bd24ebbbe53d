//! Transit departures and stop service.
//!
//! The engine owns the schedule and the stop queues.  Vehicles themselves
//! live in the link queues; the simulation hands a vehicle to
//! [`TransitEngine::handle_stop`] whenever it is due at a stop and puts it
//! back according to the returned [`StopOutcome`].
//!
//! Stop service, in order:
//!
//! 1. The first call at a stop emits `VehicleArrivesAtFacility`.
//! 2. Passengers whose egress stop this is are leaving.
//! 3. Waiting passengers whose line and route match and whose egress stop
//!    is still ahead are candidates, taken first come first served while
//!    seats last (`free = capacity − onboard + leaving`).
//! 4. The dwell comes from the [`StopHandler`].  A zero dwell at a stop that
//!    awaits its departure time is stretched to that time.
//! 5. Leaving passengers get off, then entering ones get on.
//! 6. Zero dwell: the vehicle departs, and past its last stop it must be
//!    empty.

use std::sync::Arc;

use qs_core::{AgentId, BoardingPolicy, DepartureId, LinkId, SimClock, SimConfig, StopId, Tick, TransportMode, VehicleId};
use qs_events::{Event, EventKind};
use qs_population::TransitPassengerRoute;
use qs_traffic::{Passenger, TransitVehicle};

use crate::{DwellInput, SimpleStopHandler, StopAgentTracker, StopHandler, TransitError, TransitResult, TransitSchedule};

/// Transit-specific run settings.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TransitConfig {
    pub boarding: BoardingPolicy,
}

impl TransitConfig {
    pub fn from_sim(config: &SimConfig) -> Self {
        Self { boarding: config.boarding }
    }
}

/// Result of serving a stop once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StopOutcome {
    pub stop: StopId,
    /// Link the stop lies on.
    pub link: LinkId,
    /// 0: the vehicle departs now.  Otherwise ticks until the next call.
    pub dwell_ticks: u64,
    /// Passengers who got off; their transit leg ends here.
    pub alighted: Vec<AgentId>,
    pub boarded:  Vec<AgentId>,
}

pub struct TransitEngine {
    schedule: TransitSchedule,
    config:   TransitConfig,
    handler:  Box<dyn StopHandler>,
    tracker:  StopAgentTracker,

    /// Departures sorted by (tick, id) and the index of the next one to start.
    timetable: Vec<(Tick, DepartureId)>,
    cursor:    usize,

    first_driver:  u32,
    first_vehicle: u32,
}

impl TransitEngine {
    /// Drivers and vehicles are numbered from `first_driver` and
    /// `first_vehicle`, one per departure in `DepartureId` order.
    pub fn new(
        schedule:      TransitSchedule,
        config:        TransitConfig,
        clock:         &SimClock,
        first_driver:  u32,
        first_vehicle: u32,
    ) -> Self {
        let mut timetable: Vec<(Tick, DepartureId)> = schedule
            .departures
            .iter()
            .enumerate()
            .map(|(i, d)| (clock.tick_at_or_after(d.time_secs), DepartureId(i as u32)))
            .collect();
        timetable.sort_unstable();
        let tracker = StopAgentTracker::new(schedule.stops.len());
        Self {
            schedule,
            config,
            handler: Box::new(SimpleStopHandler),
            tracker,
            timetable,
            cursor: 0,
            first_driver,
            first_vehicle,
        }
    }

    pub fn with_handler<H: StopHandler + 'static>(mut self, handler: H) -> Self {
        self.handler = Box::new(handler);
        self
    }

    #[inline] pub fn schedule(&self) -> &TransitSchedule { &self.schedule }
    #[inline] pub fn tracker(&self) -> &StopAgentTracker { &self.tracker }
    #[inline] pub fn config(&self) -> &TransitConfig { &self.config }

    /// One synthetic driver per departure.
    pub fn driver_count(&self) -> usize {
        self.schedule.departures.len()
    }

    pub fn driver_of(&self, departure: DepartureId) -> AgentId {
        AgentId(self.first_driver + departure.0)
    }

    pub fn has_pending_departures(&self) -> bool {
        self.cursor < self.timetable.len()
    }

    pub fn next_departure_tick(&self) -> Option<Tick> {
        self.timetable.get(self.cursor).map(|&(t, _)| t)
    }

    // ── Departures ────────────────────────────────────────────────────────

    /// Create the vehicles of every departure due at or before `now`.
    ///
    /// Emits `TransitDriverStarts`, `PersonEntersVehicle` and `Departure`
    /// for each.  The caller places the vehicles on the waiting list of
    /// their first link.
    pub fn start_departures(&mut self, now: Tick, events: &mut Vec<Event>) -> TransitResult<Vec<TransitVehicle>> {
        let mut started = Vec::new();
        while let Some(&(tick, departure)) = self.timetable.get(self.cursor) {
            if tick > now {
                break;
            }
            self.cursor += 1;
            let vehicle = self.make_vehicle(departure)?;
            events.push(Event::new(now, EventKind::TransitDriverStarts {
                driver:    vehicle.driver,
                vehicle:   vehicle.id,
                line:      vehicle.line,
                route:     vehicle.transit_route,
                departure,
            }));
            events.push(Event::new(now, EventKind::PersonEntersVehicle {
                agent:   vehicle.driver,
                vehicle: vehicle.id,
            }));
            events.push(Event::new(now, EventKind::Departure {
                agent: vehicle.driver,
                link:  vehicle.route.first().copied().unwrap_or(LinkId::INVALID),
                mode:  TransportMode::TransitDriver,
            }));
            started.push(vehicle);
        }
        Ok(started)
    }

    fn make_vehicle(&self, departure: DepartureId) -> TransitResult<TransitVehicle> {
        let d = self
            .schedule
            .departures
            .get(departure.index())
            .ok_or(TransitError::UnknownDeparture(departure))?;
        let route = self.schedule.route(d.route)?;
        let vt = self.schedule.vehicle_type(d.vehicle_type)?;
        Ok(TransitVehicle {
            id:                VehicleId(self.first_vehicle + departure.0),
            driver:            self.driver_of(departure),
            pce:               vt.pce,
            route:             Arc::clone(&route.links),
            route_index:       0,
            line:              route.line,
            transit_route:     d.route,
            departure,
            departure_secs:    d.time_secs,
            stops:             self.schedule.stop_refs(d.route)?,
            next_stop:         0,
            serving_stop:      None,
            last_handled_stop: None,
            denied:            Vec::new(),
            capacity:          vt.capacity,
            passengers:        Vec::new(),
        })
    }

    // ── Passengers ────────────────────────────────────────────────────────

    /// `agent` starts waiting for `trip` at its access stop.
    pub fn agent_waits(
        &mut self,
        agent:  AgentId,
        trip:   TransitPassengerRoute,
        now:    Tick,
        events: &mut Vec<Event>,
    ) -> TransitResult<()> {
        if !self.tracker.add_agent(agent, trip) {
            return Err(TransitError::UnknownStop(trip.access_stop));
        }
        events.push(Event::new(now, EventKind::WaitingForPt {
            agent,
            stop:        trip.access_stop,
            destination: trip.egress_stop,
        }));
        Ok(())
    }

    /// Remove everyone still waiting, e.g. at the end of the run.
    pub fn drain_waiting(&mut self) -> Vec<(StopId, AgentId)> {
        self.tracker.drain()
    }

    // ── Stop service ──────────────────────────────────────────────────────

    pub fn handle_stop(
        &mut self,
        vehicle: &mut TransitVehicle,
        now:     Tick,
        clock:   &SimClock,
        events:  &mut Vec<Event>,
    ) -> TransitResult<StopOutcome> {
        let stop_ref = vehicle
            .next_stop_ref()
            .cloned()
            .ok_or(TransitError::NoStopLeft(vehicle.id))?;
        let stop = stop_ref.stop;
        let now_secs = clock.secs_at(now) as f64;
        let start_secs = vehicle.departure_secs as f64;

        if vehicle.serving_stop != Some(stop) {
            vehicle.serving_stop = Some(stop);
            events.push(Event::new(now, EventKind::VehicleArrivesAtFacility {
                vehicle:    vehicle.id,
                stop,
                delay_secs: now_secs - (start_secs + stop_ref.arrival_offset_secs),
            }));
        }

        let leaving: Vec<AgentId> = vehicle
            .passengers
            .iter()
            .filter(|p| p.egress_stop == stop)
            .map(|p| p.agent)
            .collect();
        let mut free = vehicle.free_seats() + leaving.len();

        let mut entering: Vec<Passenger> = Vec::new();
        let mut refused: Vec<AgentId> = Vec::new();
        let upcoming = vehicle.upcoming_stops();
        for w in self.tracker.waiting_at(stop) {
            if w.trip.line != vehicle.line
                || w.trip.route != vehicle.transit_route
                || !upcoming.iter().any(|s| s.stop == w.trip.egress_stop)
            {
                continue;
            }
            if free > 0 {
                free -= 1;
                entering.push(Passenger { agent: w.agent, egress_stop: w.trip.egress_stop });
                continue;
            }
            match self.config.boarding {
                BoardingPolicy::StopAtCapacity => break,
                BoardingPolicy::EmitDenied => {
                    if !vehicle.denied.contains(&w.agent) {
                        refused.push(w.agent);
                        events.push(Event::new(now, EventKind::BoardingDenied {
                            agent:   w.agent,
                            vehicle: vehicle.id,
                        }));
                    }
                }
            }
        }
        vehicle.denied.extend(refused);

        let vehicle_type = self
            .schedule
            .departures
            .get(vehicle.departure.index())
            .map(|d| d.vehicle_type)
            .ok_or(TransitError::UnknownDeparture(vehicle.departure))
            .and_then(|i| self.schedule.vehicle_type(i))?;
        let mut dwell_secs = self.handler.dwell_secs(&DwellInput {
            stop,
            entering: entering.len(),
            leaving: leaving.len(),
            first_service: vehicle.last_handled_stop != Some(stop),
            vehicle_type,
        });
        vehicle.last_handled_stop = Some(stop);

        for &agent in &leaving {
            events.push(Event::new(now, EventKind::PersonLeavesVehicle { agent, vehicle: vehicle.id }));
        }
        vehicle.passengers.retain(|p| p.egress_stop != stop);
        let mut boarded = Vec::with_capacity(entering.len());
        for p in entering {
            self.tracker.remove_agent(stop, p.agent);
            boarded.push(p.agent);
            events.push(Event::new(now, EventKind::PersonEntersVehicle { agent: p.agent, vehicle: vehicle.id }));
            vehicle.passengers.push(p);
        }

        let scheduled_departure = start_secs + stop_ref.departure_offset_secs;
        if dwell_secs <= 0.0 && stop_ref.await_departure && now_secs < scheduled_departure {
            dwell_secs = scheduled_departure - now_secs;
        }

        let dwell_ticks = clock.ticks_for_secs_f64(dwell_secs);
        if dwell_ticks == 0 {
            events.push(Event::new(now, EventKind::VehicleDepartsAtFacility {
                vehicle:    vehicle.id,
                stop,
                delay_secs: now_secs - scheduled_departure,
            }));
            vehicle.serving_stop = None;
            vehicle.denied.clear();
            vehicle.next_stop += 1;
            if !vehicle.has_unserved_stops() && !vehicle.passengers.is_empty() {
                log::error!(
                    "{now}: transit vehicle {} left its last stop {stop} with {} passengers",
                    vehicle.id,
                    vehicle.passengers.len()
                );
                return Err(TransitError::VehicleNotEmpty {
                    vehicle:    vehicle.id,
                    passengers: vehicle.passengers.len(),
                });
            }
        }

        Ok(StopOutcome { stop, link: stop_ref.link, dwell_ticks, alighted: leaving, boarded })
    }
}
