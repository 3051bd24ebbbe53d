//! The `Sim` struct and its tick loop.

use std::sync::{Arc, Mutex};

use qs_agent::{AgentError, AgentState, AgentStore, LegStage};
use qs_core::{AgentId, LinkId, NodeId, SimClock, SimConfig, Tick, TransportMode};
use qs_events::{AbortReason, Event, EventCollector, EventKind, EventStream, EventsManager};
use qs_network::{DijkstraRouter, Network};
use qs_population::{Population, Route, WakeQueue};
use qs_traffic::{HeldVehicle, LinkQueue, Movable, PrivateVehicle, Vehicle, move_node};
use qs_transit::{TransitEngine, TransitSchedule};

use crate::{NoopObserver, SimBuilder, SimError, SimObserver, SimResult, TickStats};

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The main simulation runner.
///
/// `Sim` holds all run state and drives the five-phase tick loop:
///
/// 1. **Links**: every active link queue advances (in parallel with the
///    `parallel` feature).  Vehicles whose trip ends on their link come back
///    as arrivals.
/// 2. **Stops**: transit vehicles due at a stop are served by the
///    [`TransitEngine`] and then held again or released.
/// 3. **Nodes**: every node moves buffer heads onto their next link.
///    Vehicles the node mover removes take their occupants into ABORT.
/// 4. **Agents**: link and stop arrivals end legs, the wake queue ends
///    activities and teleported legs, due transit departures start.
/// 5. **Events**: the tick's batch is handed to the [`EventsManager`].
///
/// A fatal error in any phase stops the run and drops the tick's events.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim {
    pub config: SimConfig,

    /// Simulation clock, tracks the current tick.
    pub clock: SimClock,

    pub network: Network,

    /// Persons with resolved plans, indexed by `AgentId`.
    pub population: Population,

    /// State of every person and transit driver (SoA arrays).
    pub agents: AgentStore,

    /// One queue per link, indexed by `LinkId`.
    pub links: Vec<LinkQueue>,

    /// Activity ends and teleport arrivals.
    pub wake_queue: WakeQueue,

    pub transit: TransitEngine,

    pub events: EventsManager,

    pub(crate) stuck_threshold:  Option<u64>,
    pub(crate) end_tick:         Tick,
    pub(crate) next_report_secs: u64,
    pub(crate) finished:         bool,

    #[cfg(feature = "parallel")]
    pub(crate) pool: Option<rayon::ThreadPool>,
}

impl Sim {
    // ── Public API ────────────────────────────────────────────────────────

    /// Run from the current tick to `config.end_tick()`, or until nothing is
    /// left to simulate when `config.end_when_idle` is set, then close the
    /// run with [`finish`](Self::finish).
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        log::info!(
            "simulating {} persons, {} transit departures on {} links until {}",
            self.population.len(),
            self.transit.driver_count(),
            self.network.link_count(),
            self.end_tick,
        );
        while self.clock.current_tick < self.end_tick {
            if self.config.end_when_idle && self.is_idle() {
                log::info!("{}: nothing left to simulate", self.clock);
                break;
            }
            self.step(observer)?;
        }
        self.finish(observer)
    }

    /// Run exactly `n` ticks from the current position (ignores `end_tick`
    /// and does not close the run).
    ///
    /// Useful for tests and incremental stepping.
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            self.step(observer)?;
        }
        Ok(())
    }

    /// `true` when no agent travels and nothing is scheduled any more.
    pub fn is_idle(&self) -> bool {
        self.agents.en_route() == 0
            && self.wake_queue.is_empty()
            && !self.transit.has_pending_departures()
    }

    /// Close the run: every vehicle still on the network, every passenger
    /// still waiting, and every agent still travelling is aborted with
    /// `EndOfSimulation`.  The final events are delivered and the handlers
    /// finished.  Calling it again does nothing.
    pub fn finish<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        let now = self.clock.current_tick;
        let mut batch = Vec::new();
        let mut stats = TickStats::default();

        for i in 0..self.links.len() {
            let link = LinkId(i as u32);
            for vehicle in self.links[i].drain() {
                self.abort_vehicle(vehicle, link, AbortReason::EndOfSimulation, now, &mut batch, &mut stats)?;
            }
        }
        for (stop, agent) in self.transit.drain_waiting() {
            let link = self
                .transit
                .schedule()
                .stop(stop)
                .map_or(LinkId::INVALID, |s| s.link);
            self.abort_agent(agent, link, Some(TransportMode::Pt), AbortReason::EndOfSimulation, now, &mut batch, &mut stats)?;
        }
        for i in 0..self.agents.count {
            let agent = AgentId(i as u32);
            if !self.agents.state[i].is_leg() {
                continue;
            }
            let mode = self
                .population
                .get(agent)
                .and_then(|p| p.plan.leg_at(self.agents.element[i]))
                .map(|leg| leg.mode);
            let link = self.agents.link[i];
            self.abort_agent(agent, link, mode, AbortReason::EndOfSimulation, now, &mut batch, &mut stats)?;
        }

        self.events.extend(batch);
        self.events.flush();
        self.events.finish();
        log::info!(
            "{}: run finished, {} events, {} agents aborted",
            self.clock,
            self.events.delivered(),
            self.agents.aborted(),
        );
        observer.on_sim_end(now);
        Ok(())
    }

    // ── Tick driver ───────────────────────────────────────────────────────

    fn step<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        let now = self.clock.current_tick;
        observer.on_tick_start(now);

        let mut batch = Vec::new();
        let mut stats = match self.process_tick(now, &mut batch) {
            Ok(stats) => stats,
            Err(e) => {
                log::error!("{now}: run halted, {} events of this tick discarded: {e}", batch.len());
                self.events.discard_pending();
                return Err(e);
            }
        };
        self.events.extend(batch);
        stats.events = self.events.flush();
        stats.en_route = self.agents.en_route();
        observer.on_tick_end(now, &stats);

        if self.config.output_interval_ticks > 0 && now.0 % self.config.output_interval_ticks == 0 {
            observer.on_snapshot(now, &self.links, &self.agents);
        }

        let secs = self.clock.secs_at(now);
        if secs >= self.next_report_secs {
            log::info!("{}: {} agents en route, {} events so far", self.clock, stats.en_route, self.events.delivered());
            self.next_report_secs = (secs / 3_600 + 1) * 3_600;
        }

        self.clock.advance();
        Ok(())
    }

    fn process_tick(&mut self, now: Tick, batch: &mut Vec<Event>) -> SimResult<TickStats> {
        let mut stats = TickStats::default();

        // ── Phase 1: links ────────────────────────────────────────────────
        let arrivals = self.advance_links(now, batch);

        // ── Phase 2: transit stops ────────────────────────────────────────
        let alighted = self.serve_stops(now, batch)?;

        // ── Phase 3: nodes ────────────────────────────────────────────────
        let mut removed = Vec::new();
        for n in 0..self.network.node_count() {
            let node = NodeId(n as u32);
            let busy = self
                .network
                .in_links(node)
                .iter()
                .any(|l| self.links[l.index()].buffer_len() > 0);
            if !busy {
                continue;
            }
            stats.moved += move_node(node, &self.network, &mut self.links, now, self.stuck_threshold, batch, &mut removed)
                .map_err(|e| SimError::invariant(now, e))?;
        }
        for r in removed {
            self.abort_vehicle(r.vehicle, r.link, r.reason, now, batch, &mut stats)?;
        }

        // ── Phase 4: agents ───────────────────────────────────────────────
        for vehicle in arrivals {
            self.vehicle_arrives(vehicle, now, batch, &mut stats)?;
        }
        for (agent, link) in alighted {
            self.finish_leg(agent, link, TransportMode::Pt, now, batch)?;
            stats.arrivals += 1;
        }
        while let Some(woken) = self.wake_queue.drain_tick(now) {
            stats.woken += woken.len();
            for agent in woken {
                self.wake(agent, now, batch, &mut stats)?;
            }
        }
        for tv in self.transit.start_departures(now, batch)? {
            let start = tv.current_link();
            self.agents.start_driving(tv.driver, tv.id, start)?;
            self.links[start.index()].add_waiting(tv.into());
            stats.departures += 1;
        }

        Ok(stats)
    }

    // ── Phase 1 ───────────────────────────────────────────────────────────

    #[cfg(not(feature = "parallel"))]
    fn advance_links(&mut self, now: Tick, batch: &mut Vec<Event>) -> Vec<Vehicle> {
        let mut arrivals = Vec::new();
        for queue in self.links.iter_mut().filter(|q| q.is_active()) {
            arrivals.extend(queue.advance(now, batch));
        }
        arrivals
    }

    /// Links advance independently into link-local buffers, which are
    /// merged in `LinkId` order so the result matches a sequential pass.
    #[cfg(feature = "parallel")]
    fn advance_links(&mut self, now: Tick, batch: &mut Vec<Event>) -> Vec<Vehicle> {
        use rayon::prelude::*;

        let links = &mut self.links;
        let work = || {
            links
                .par_iter_mut()
                .filter(|q| q.is_active())
                .map(|q| {
                    let mut events = Vec::new();
                    let arrivals = q.advance(now, &mut events);
                    (events, arrivals)
                })
                .collect::<Vec<_>>()
        };
        let per_link = match &self.pool {
            Some(pool) => pool.install(work),
            None => work(),
        };

        let mut arrivals = Vec::new();
        for (events, arrived) in per_link {
            batch.extend(events);
            arrivals.extend(arrived);
        }
        arrivals
    }

    // ── Phase 2 ───────────────────────────────────────────────────────────

    /// Serve every transit vehicle due at a stop.  Returns the passengers
    /// who got off, with the link of their stop.
    fn serve_stops(&mut self, now: Tick, batch: &mut Vec<Event>) -> SimResult<Vec<(AgentId, LinkId)>> {
        let mut alighted = Vec::new();
        for i in 0..self.links.len() {
            if self.links[i].held_len() == 0 {
                continue;
            }
            for HeldVehicle { vehicle, origin, .. } in self.links[i].take_due_stops(now) {
                let mut tv = match vehicle {
                    Vehicle::Transit(tv) => tv,
                    private => {
                        self.links[i].release_from_stop(private, origin);
                        continue;
                    }
                };
                let outcome = self
                    .transit
                    .handle_stop(&mut tv, now, &self.clock, batch)
                    .map_err(|e| SimError::invariant(now, e))?;

                for &agent in &outcome.boarded {
                    self.agents.set_stage(agent, LegStage::Riding(tv.id))?;
                }
                alighted.extend(outcome.alighted.iter().map(|&a| (a, outcome.link)));

                if outcome.dwell_ticks > 0 {
                    self.links[i].hold(Vehicle::Transit(tv), origin, now + outcome.dwell_ticks);
                } else {
                    self.links[i].release_from_stop(Vehicle::Transit(tv), origin);
                }
            }
        }
        Ok(alighted)
    }

    // ── Phase 4 ───────────────────────────────────────────────────────────

    fn vehicle_arrives(
        &mut self,
        vehicle: Vehicle,
        now:     Tick,
        batch:   &mut Vec<Event>,
        stats:   &mut TickStats,
    ) -> SimResult<()> {
        let link = vehicle.current_link();
        let driver = vehicle.driver();
        match vehicle {
            Vehicle::Private(v) => {
                batch.push(Event::new(now, EventKind::PersonLeavesVehicle { agent: driver, vehicle: v.id }));
                self.finish_leg(driver, link, v.mode, now, batch)?;
            }
            Vehicle::Transit(tv) if tv.has_unserved_stops() => {
                log::warn!(
                    "{now}: transit vehicle {} reached the end of its route with {} stops unserved",
                    tv.id,
                    tv.stops.len() - tv.next_stop,
                );
                self.abort_vehicle(Vehicle::Transit(tv), link, AbortReason::StopsNotServed, now, batch, stats)?;
                return Ok(());
            }
            Vehicle::Transit(tv) => {
                batch.push(Event::new(now, EventKind::PersonLeavesVehicle { agent: driver, vehicle: tv.id }));
                batch.push(Event::new(now, EventKind::Arrival {
                    agent: driver,
                    link,
                    mode:  TransportMode::TransitDriver,
                }));
                self.agents.end_leg(driver, link)?;
            }
        }
        stats.arrivals += 1;
        Ok(())
    }

    /// End the current leg of person `agent` at `link` and start the next
    /// activity.  Schedules the activity's end unless it is the last one.
    fn finish_leg(
        &mut self,
        agent: AgentId,
        link:  LinkId,
        mode:  TransportMode,
        now:   Tick,
        batch: &mut Vec<Event>,
    ) -> SimResult<()> {
        batch.push(Event::new(now, EventKind::Arrival { agent, link, mode }));

        let next = self.agents.element[agent.index()] + 1;
        let plan = &self.population.get(agent).ok_or(AgentError::UnknownAgent(agent))?.plan;
        let act = plan.activity_at(next).ok_or_else(|| SimError::InvalidPlan {
            agent,
            element: next,
            reason:  "leg is not followed by an activity".into(),
        })?;
        self.agents.end_leg(agent, act.link)?;
        batch.push(Event::new(now, EventKind::ActivityStart {
            agent,
            link:     act.link,
            act_type: Arc::clone(&act.act_type),
        }));

        if !plan.is_last(next) {
            if let Some(end) = act.end_after(self.clock.secs_at(now)) {
                self.wake_queue.push(self.clock.tick_at_or_after(end).max(now), agent);
            }
        }
        Ok(())
    }

    fn wake(&mut self, agent: AgentId, now: Tick, batch: &mut Vec<Event>, stats: &mut TickStats) -> SimResult<()> {
        match self.agents.state_of(agent)? {
            AgentState::Activity => self.depart(agent, now, batch, stats),
            AgentState::Leg(LegStage::Teleporting(at)) if at == now => {
                let element = self.agents.element[agent.index()];
                let plan = &self.population.get(agent).ok_or(AgentError::UnknownAgent(agent))?.plan;
                let (mode, distance_m) = match plan.leg_at(element) {
                    Some(leg) => match &leg.route {
                        Some(Route::Generic { distance_m, .. }) => (leg.mode, *distance_m),
                        _ => (leg.mode, 0.0),
                    },
                    None => return Err(AgentError::UnknownAgent(agent).into()),
                };
                let link = plan
                    .activity_at(element + 1)
                    .map_or(LinkId::INVALID, |a| a.link);
                batch.push(Event::new(now, EventKind::TeleportationArrival { agent, mode, distance_m }));
                self.finish_leg(agent, link, mode, now, batch)?;
                stats.arrivals += 1;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// End the current activity of `agent` and start the leg after it.
    fn depart(&mut self, agent: AgentId, now: Tick, batch: &mut Vec<Event>, stats: &mut TickStats) -> SimResult<()> {
        let i = agent.index();
        let element = self.agents.element[i];
        let person = self.population.get(agent).ok_or(AgentError::UnknownAgent(agent))?;
        let (Some(act), Some(leg)) = (person.plan.activity_at(element), person.plan.leg_at(element + 1)) else {
            return Ok(());
        };
        let link = act.link;
        let mode = leg.mode;
        let route = leg.route.clone();
        let (pce, max_speed_mps) = (person.vehicle_pce, person.vehicle_max_speed_mps);

        batch.push(Event::new(now, EventKind::ActivityEnd { agent, link, act_type: Arc::clone(&act.act_type) }));
        batch.push(Event::new(now, EventKind::Departure { agent, link, mode }));
        stats.departures += 1;

        match route {
            Some(Route::Transit(trip)) if mode == TransportMode::Pt => {
                self.agents.start_leg(agent, LegStage::WaitingAtStop(trip.access_stop))?;
                self.transit.agent_waits(agent, trip, now, batch)?;
            }

            Some(Route::Network { links, .. }) if self.config.is_network_mode(mode) => {
                if links.first() != Some(&link) {
                    log::warn!("{now}: agent {agent} is on {link} but its {mode} route starts elsewhere");
                    self.abort_agent(agent, link, Some(mode), AbortReason::WrongStartLink, now, batch, stats)?;
                    return Ok(());
                }
                let id = self.agents.vehicle[i];
                self.agents.start_leg(agent, LegStage::Driving(id))?;
                if links.len() == 1 {
                    self.finish_leg(agent, link, mode, now, batch)?;
                    stats.arrivals += 1;
                    return Ok(());
                }
                batch.push(Event::new(now, EventKind::PersonEntersVehicle { agent, vehicle: id }));
                let vehicle = PrivateVehicle {
                    id,
                    driver: agent,
                    mode,
                    pce,
                    max_speed_mps,
                    route: links,
                    route_index: 0,
                };
                self.links[link.index()].add_waiting(vehicle.into());
            }

            Some(Route::Generic { travel_secs, .. })
                if mode != TransportMode::Pt && !self.config.is_network_mode(mode) =>
            {
                let at = now + self.clock.ticks_for_secs(travel_secs);
                self.agents.start_leg(agent, LegStage::Teleporting(at))?;
                self.wake_queue.push(at, agent);
            }

            _ => {
                log::warn!("{now}: agent {agent} has no usable route for its {mode} leg");
                self.abort_agent(agent, link, Some(mode), AbortReason::RouteInconsistent, now, batch, stats)?;
            }
        }
        Ok(())
    }

    // ── Aborts ────────────────────────────────────────────────────────────

    /// Move `agent` into ABORT and report it.  Agents already aborted are
    /// left alone.
    #[allow(clippy::too_many_arguments)]
    fn abort_agent(
        &mut self,
        agent:  AgentId,
        link:   LinkId,
        mode:   Option<TransportMode>,
        reason: AbortReason,
        now:    Tick,
        batch:  &mut Vec<Event>,
        stats:  &mut TickStats,
    ) -> SimResult<()> {
        if self.agents.abort(agent)? {
            if reason != AbortReason::EndOfSimulation {
                log::warn!("{now}: agent {agent} aborted on {link}: {}", reason.as_str());
            }
            batch.push(Event::new(now, EventKind::AgentStuck { agent, link, mode, reason }));
            stats.aborted += 1;
        }
        Ok(())
    }

    /// Abort the driver and every passenger of a vehicle that left the
    /// network early.
    fn abort_vehicle(
        &mut self,
        vehicle: Vehicle,
        link:    LinkId,
        reason:  AbortReason,
        now:     Tick,
        batch:   &mut Vec<Event>,
        stats:   &mut TickStats,
    ) -> SimResult<()> {
        let passenger_reason = match reason {
            AbortReason::EndOfSimulation => reason,
            _ => AbortReason::VehicleRemoved,
        };
        for p in vehicle.passengers() {
            self.abort_agent(p.agent, link, Some(TransportMode::Pt), passenger_reason, now, batch, stats)?;
        }
        self.abort_agent(vehicle.driver(), link, Some(vehicle.mode()), reason, now, batch, stats)
    }
}

// ── One-shot runs ─────────────────────────────────────────────────────────────

/// Build and run one iteration, returning every event in delivery order.
///
/// Legs of the configured network modes that lack a route are routed with
/// [`DijkstraRouter`]; teleported legs use the default estimators.
pub fn run_iteration(
    config:     SimConfig,
    network:    Network,
    population: Population,
    schedule:   TransitSchedule,
) -> SimResult<EventStream> {
    let collector = Arc::new(Mutex::new(EventCollector::new()));
    let modes = config.network_modes.clone();
    let mut builder = SimBuilder::new(config, network, population)
        .schedule(schedule)
        .event_handler(Arc::clone(&collector));
    for mode in modes {
        builder = builder.router(mode, DijkstraRouter);
    }

    let mut sim = builder.build()?;
    sim.run(&mut NoopObserver)?;
    drop(sim);

    let mut guard = collector.lock().unwrap_or_else(|p| p.into_inner());
    Ok(std::mem::take(&mut guard.events))
}
