//! Integration tests for qs-sim.

#[cfg(test)]
mod helpers {
    use std::sync::{Arc, Mutex};

    use qs_core::{Coord, LinkId, SimConfig, TransportMode};
    use qs_events::{Event, EventCollector};
    use qs_network::{LinkAttrs, Network, NetworkBuilder};
    use qs_population::{Activity, Leg, Person, Plan, Route};

    use crate::{NoopObserver, SimBuilder, SimResult};

    /// Straight corridor `n0 → n1 → n2 → n3` of 100 m links at 10 m/s.  The
    /// outer links carry 3600 veh/h, the middle one `mid_capacity`.
    pub fn corridor(mid_capacity: f64) -> (Network, [LinkId; 3]) {
        let mut b = NetworkBuilder::new();
        let n: Vec<_> = (0..4).map(|i| b.add_node(Coord::new(i as f64 * 100.0, 0.0))).collect();
        let links = [
            b.add_link(n[0], n[1], LinkAttrs::new(100.0, 10.0, 3_600.0, 1.0)),
            b.add_link(n[1], n[2], LinkAttrs::new(100.0, 10.0, mid_capacity, 1.0)),
            b.add_link(n[2], n[3], LinkAttrs::new(100.0, 10.0, 3_600.0, 1.0)),
        ];
        (b.build().unwrap(), links)
    }

    pub fn config(end_secs: u64) -> SimConfig {
        SimConfig { end_secs, output_interval_ticks: 0, ..SimConfig::default() }
    }

    /// Home on `from` until `at`, then drive to work on `to`.
    pub fn commuter(from: LinkId, to: LinkId, at: u64, route: Option<Vec<LinkId>>) -> Person {
        let leg = match route {
            Some(links) => Leg::with_route(TransportMode::Car, Route::network(links, 0.0)),
            None => Leg::new(TransportMode::Car),
        };
        Person::new(
            Plan::new()
                .activity(Activity::on_link("home", from).ending_at(at))
                .leg(leg)
                .activity(Activity::on_link("work", to)),
        )
    }

    /// Build, run to the end, and return every delivered event.
    pub fn run(builder: SimBuilder) -> SimResult<Vec<Event>> {
        let collector = Arc::new(Mutex::new(EventCollector::new()));
        let mut sim = builder.event_handler(Arc::clone(&collector)).build()?;
        sim.run(&mut NoopObserver)?;
        let events = collector.lock().unwrap().events.clone();
        Ok(events)
    }

    pub fn named<'a>(events: &'a [Event], name: &str) -> Vec<&'a Event> {
        events.iter().filter(|e| e.kind.name() == name).collect()
    }
}

// ── SimBuilder validation ─────────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use qs_core::{Coord, LinkId, SimConfig, Tick, TransportMode};
    use qs_network::{DijkstraRouter, NetworkError};
    use qs_population::{Activity, Leg, Person, Plan, Population, Route};

    use super::helpers::*;
    use crate::{SimBuilder, SimError};

    #[test]
    fn seeds_wake_queue_and_agents() {
        let (net, [l0, _, l2]) = corridor(3_600.0);
        let mut pop = Population::new();
        pop.push(commuter(l0, l2, 30, Some(vec![l0, LinkId(1), l2])));
        pop.push(commuter(l0, l2, 10, Some(vec![l0, LinkId(1), l2])));
        let sim = SimBuilder::new(config(3_600), net, pop).build().unwrap();
        assert_eq!(sim.agents.count, 2);
        assert_eq!(sim.agents.link, vec![l0, l0]);
        assert_eq!(sim.wake_queue.next_tick(), Some(Tick(10)));
        assert_eq!(sim.links.len(), 3);
    }

    #[test]
    fn missing_router_is_rejected() {
        let (net, [l0, _, l2]) = corridor(3_600.0);
        let mut pop = Population::new();
        pop.push(commuter(l0, l2, 0, None));
        let err = SimBuilder::new(config(3_600), net, pop).build().err().unwrap();
        assert!(matches!(err, SimError::MissingRouter(TransportMode::Car)));
    }

    #[test]
    fn router_fills_missing_routes() {
        let (net, [l0, l1, l2]) = corridor(3_600.0);
        let mut pop = Population::new();
        pop.push(commuter(l0, l2, 0, None));
        let sim = SimBuilder::new(config(3_600), net, pop)
            .router(TransportMode::Car, DijkstraRouter)
            .build()
            .unwrap();
        let leg = sim.population.persons[0].plan.leg_at(1).unwrap();
        let links = leg.route.as_ref().and_then(|r| r.links()).unwrap();
        assert_eq!(&links[..], &[l0, l1, l2]);
    }

    #[test]
    fn unknown_route_link_is_rejected() {
        let (net, [l0, _, l2]) = corridor(3_600.0);
        let mut pop = Population::new();
        pop.push(commuter(l0, l2, 0, Some(vec![l0, LinkId(42), l2])));
        let err = SimBuilder::new(config(3_600), net, pop).build().err().unwrap();
        assert!(matches!(err, SimError::Network(NetworkError::LinkNotFound(LinkId(42)))));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let (net, _) = corridor(3_600.0);
        let config = SimConfig { tick_duration_secs: 0, ..SimConfig::default() };
        let err = SimBuilder::new(config, net, Population::new()).build().err().unwrap();
        assert!(matches!(err, SimError::Config(_)));
    }

    #[test]
    fn pt_leg_without_transit_route_is_rejected() {
        let (net, [l0, _, l2]) = corridor(3_600.0);
        let mut pop = Population::new();
        pop.push(Person::new(
            Plan::new()
                .activity(Activity::on_link("home", l0).ending_at(0))
                .leg(Leg::new(TransportMode::Pt))
                .activity(Activity::on_link("work", l2)),
        ));
        let err = SimBuilder::new(config(3_600), net, pop).build().err().unwrap();
        assert!(matches!(err, SimError::InvalidPlan { element: 1, .. }));
    }

    #[test]
    fn coordinate_activities_are_snapped() {
        let (net, [l0, _, l2]) = corridor(3_600.0);
        let mut pop = Population::new();
        pop.push(Person::new(
            Plan::new()
                .activity(Activity::on_link("home", l0).ending_at(0))
                .leg(Leg::with_route(TransportMode::Walk, Route::generic(60, 80.0)))
                .activity(Activity::at_coord("shop", Coord::new(290.0, 5.0))),
        ));
        let sim = SimBuilder::new(config(3_600), net, pop).build().unwrap();
        assert_eq!(sim.population.persons[0].plan.activity_at(2).unwrap().link, l2);
    }
}

// ── Runs ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod run {
    use std::collections::BTreeMap;

    use qs_core::{AgentId, Coord, Tick, TransportMode};
    use qs_events::{AbortReason, EventKind};
    use qs_network::{BeelineEstimator, DijkstraRouter, LinkAttrs, NetworkBuilder};
    use qs_population::{Activity, Leg, Person, Plan, Population, Route};
    use qs_transit::TransitSchedule;

    use super::helpers::*;
    use crate::{SimBuilder, run_iteration};

    #[test]
    fn bottleneck_spreads_two_simultaneous_departures() {
        // 1 veh / 100 s onto a link with 100 s free-flow time.
        let mut b = NetworkBuilder::new();
        let n: Vec<_> = (0..3).map(|i| b.add_node(Coord::new(i as f64 * 1_000.0, 0.0))).collect();
        let l0 = b.add_link(n[0], n[1], LinkAttrs::new(100.0, 10.0, 36.0, 1.0));
        let l1 = b.add_link(n[1], n[2], LinkAttrs::new(1_000.0, 10.0, 3_600.0, 1.0));
        let net = b.build().unwrap();

        let mut pop = Population::new();
        pop.push(commuter(l0, l1, 0, Some(vec![l0, l1])));
        pop.push(commuter(l0, l1, 0, Some(vec![l0, l1])));
        let events = run(SimBuilder::new(config(3_600), net, pop)).unwrap();

        let mut departed = BTreeMap::new();
        let mut travel = Vec::new();
        for e in &events {
            match e.kind {
                EventKind::Departure { agent, .. } => {
                    departed.insert(agent, e.time);
                }
                EventKind::Arrival { agent, .. } => travel.push(e.time - departed[&agent]),
                _ => {}
            }
        }
        // One tick to leave the departure link, then 100 s on the next one.
        assert_eq!(travel, vec![101, 201]);
        let mean = travel.iter().sum::<u64>() as f64 / travel.len() as f64;
        assert_eq!(mean, 151.0);
    }

    #[test]
    fn identical_inputs_give_identical_streams() {
        let build = || {
            let (net, [l0, _, l2]) = corridor(600.0);
            let mut pop = Population::new();
            for i in 0..30 {
                pop.push(commuter(l0, l2, i * 2, None));
            }
            (net, pop)
        };
        let (net, pop) = build();
        let first = run_iteration(config(3_600), net, pop, TransitSchedule::new()).unwrap();
        let (net, pop) = build();
        let second = run_iteration(config(3_600), net, pop, TransitSchedule::new()).unwrap();

        assert_eq!(first, second);
        assert_eq!(named(&first, "arrival").len(), 30);
        assert!(first.windows(2).all(|w| w[0].time <= w[1].time));
    }

    #[test]
    fn explicit_and_routed_legs_arrive_alike() {
        let make = |explicit: bool| {
            let (net, [l0, l1, l2]) = corridor(1_200.0);
            let mut pop = Population::new();
            for i in 0..5 {
                let route = explicit.then(|| vec![l0, l1, l2]);
                pop.push(commuter(l0, l2, i, route));
            }
            let builder = SimBuilder::new(config(3_600), net, pop).router(TransportMode::Car, DijkstraRouter);
            run(builder).unwrap()
        };
        let arrivals = |events: &[qs_events::Event]| -> Vec<(Tick, AgentId)> {
            events
                .iter()
                .filter_map(|e| match e.kind {
                    EventKind::Arrival { agent, .. } => Some((e.time, agent)),
                    _ => None,
                })
                .collect()
        };
        let explicit = make(true);
        let routed = make(false);
        assert_eq!(arrivals(&explicit), arrivals(&routed));
        assert_eq!(arrivals(&explicit).len(), 5);
    }

    #[test]
    fn teleported_leg_arrives_after_travel_time() {
        let (net, [l0, _, l2]) = corridor(3_600.0);
        let mut pop = Population::new();
        pop.push(Person::new(
            Plan::new()
                .activity(Activity::on_link("home", l0).ending_at(100))
                .leg(Leg::with_route(TransportMode::Walk, Route::generic(120, 150.0)))
                .activity(Activity::on_link("shop", l2)),
        ));
        let events = run(SimBuilder::new(config(3_600), net, pop)).unwrap();

        let tele = named(&events, "travelled");
        assert_eq!(tele.len(), 1);
        assert_eq!(tele[0].time, Tick(220));
        assert!(matches!(tele[0].kind, EventKind::TeleportationArrival { distance_m, .. } if distance_m == 150.0));
        let starts = named(&events, "actstart");
        assert_eq!(starts.len(), 1);
        assert!(matches!(starts[0].kind, EventKind::ActivityStart { link, .. } if link == l2));
    }

    #[test]
    fn teleport_estimator_fills_missing_travel_time() {
        let (net, [l0, _, l2]) = corridor(3_600.0);
        let mut pop = Population::new();
        pop.push(Person::new(
            Plan::new()
                .activity(Activity::on_link("home", l0).ending_at(0))
                .leg(Leg::new(TransportMode::Walk))
                .activity(Activity::on_link("shop", l2)),
        ));
        // Link ends at x = 100 and x = 300.
        let builder = SimBuilder::new(config(3_600), net, pop)
            .teleport(TransportMode::Walk, BeelineEstimator::new(1.0, 1.0));
        let events = run(builder).unwrap();
        assert_eq!(named(&events, "arrival")[0].time, Tick(200));
    }

    #[test]
    fn same_link_leg_arrives_immediately() {
        let (net, [l0, ..]) = corridor(3_600.0);
        let mut pop = Population::new();
        pop.push(commuter(l0, l0, 5, Some(vec![l0])));
        let events = run(SimBuilder::new(config(3_600), net, pop)).unwrap();
        let arrivals = named(&events, "arrival");
        assert_eq!(arrivals.len(), 1);
        assert_eq!(arrivals[0].time, Tick(5));
        assert!(named(&events, "PersonEntersVehicle").is_empty());
    }

    #[test]
    fn disconnected_route_aborts_only_its_agent() {
        let (net, [l0, l1, l2]) = corridor(3_600.0);
        let mut pop = Population::new();
        pop.push(commuter(l0, l2, 0, Some(vec![l0, l2])));
        pop.push(commuter(l0, l2, 0, Some(vec![l0, l1, l2])));
        let events = run(SimBuilder::new(config(3_600), net, pop)).unwrap();

        let stuck = named(&events, "stuckAndAbort");
        assert_eq!(stuck.len(), 1);
        assert!(matches!(
            stuck[0].kind,
            EventKind::AgentStuck { agent: AgentId(0), reason: AbortReason::RouteInconsistent, .. }
        ));
        let arrivals = named(&events, "arrival");
        assert_eq!(arrivals.len(), 1);
        assert!(matches!(arrivals[0].kind, EventKind::Arrival { agent: AgentId(1), .. }));
    }

    #[test]
    fn route_starting_elsewhere_aborts_at_departure() {
        let (net, [l0, l1, l2]) = corridor(3_600.0);
        let mut pop = Population::new();
        pop.push(commuter(l0, l2, 7, Some(vec![l1, l2])));
        let events = run(SimBuilder::new(config(3_600), net, pop)).unwrap();
        let stuck = named(&events, "stuckAndAbort");
        assert_eq!(stuck.len(), 1);
        assert_eq!(stuck[0].time, Tick(7));
        assert!(matches!(stuck[0].kind, EventKind::AgentStuck { reason: AbortReason::WrongStartLink, .. }));
    }

    #[test]
    fn blocked_vehicle_is_removed_after_stuck_threshold() {
        // A 7.5 m middle link with 1 veh/h holds one car and barely drains.
        let mut b = NetworkBuilder::new();
        let n: Vec<_> = (0..4).map(|i| b.add_node(Coord::new(i as f64 * 100.0, 0.0))).collect();
        let l0 = b.add_link(n[0], n[1], LinkAttrs::new(100.0, 10.0, 3_600.0, 1.0));
        let l1 = b.add_link(n[1], n[2], LinkAttrs::new(7.5, 10.0, 1.0, 1.0));
        let l2 = b.add_link(n[2], n[3], LinkAttrs::new(100.0, 10.0, 3_600.0, 1.0));
        let net = b.build().unwrap();

        let mut pop = Population::new();
        for _ in 0..3 {
            pop.push(commuter(l0, l2, 0, Some(vec![l0, l1, l2])));
        }
        let mut config = config(100);
        config.stuck_threshold_secs = Some(10);
        let events = run(SimBuilder::new(config, net, pop)).unwrap();

        // The first car gets through on the initial flow allowance.
        let arrivals = named(&events, "arrival");
        assert_eq!(arrivals.len(), 1);
        assert_eq!(arrivals[0].time, Tick(12));

        let stuck: Vec<_> = named(&events, "stuckAndAbort")
            .into_iter()
            .map(|e| match e.kind {
                EventKind::AgentStuck { agent, link, reason, .. } => (e.time, agent, link, reason),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(stuck, vec![
            (Tick(13), AgentId(2), l0, AbortReason::Stuck),
            (Tick(100), AgentId(1), l1, AbortReason::EndOfSimulation),
        ]);
    }

    #[test]
    fn unfinished_agents_are_aborted_at_end() {
        let (net, [l0, _, l2]) = corridor(3_600.0);
        let mut pop = Population::new();
        pop.push(Person::new(
            Plan::new()
                .activity(Activity::on_link("home", l0).ending_at(0))
                .leg(Leg::with_route(TransportMode::Walk, Route::generic(5_000, 4_000.0)))
                .activity(Activity::on_link("work", l2)),
        ));
        let events = run(SimBuilder::new(config(600), net, pop)).unwrap();
        let stuck = named(&events, "stuckAndAbort");
        assert_eq!(stuck.len(), 1);
        assert_eq!(stuck[0].time, Tick(600));
        assert!(matches!(
            stuck[0].kind,
            EventKind::AgentStuck {
                link,
                mode: Some(TransportMode::Walk),
                reason: AbortReason::EndOfSimulation,
                ..
            } if link == l0
        ));
    }

    #[test]
    fn empty_population_finishes_at_once() {
        let (net, _) = corridor(3_600.0);
        let events = run_iteration(config(3_600), net, Population::new(), TransitSchedule::new()).unwrap();
        assert!(events.is_empty());
    }
}

// ── Transit ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod transit {
    use std::sync::{Arc, Mutex};

    use qs_core::{AgentId, Coord, LineId, LinkId, StopId, Tick, TransitRouteId, TransportMode};
    use qs_events::{EventCollector, EventKind};
    use qs_population::{Activity, Leg, Person, Plan, Population, Route, TransitPassengerRoute};
    use qs_traffic::{Passenger, Vehicle};
    use qs_transit::{RouteStop, TransitError, TransitSchedule, VehicleType};

    use super::helpers::*;
    use crate::{NoopObserver, SimBuilder, SimError};

    /// Stops on the listed corridor links, one bus departure at 0 s.
    fn schedule(stop_links: &[LinkId], route_links: Vec<LinkId>) -> (TransitSchedule, Vec<StopId>, RouteIds) {
        let mut s = TransitSchedule::new();
        let stops: Vec<StopId> = stop_links
            .iter()
            .enumerate()
            .map(|(i, &l)| s.add_stop(&format!("S{i}"), l, Coord::new(100.0 * (i + 1) as f64, 0.0)))
            .collect();
        let bus = s.add_vehicle_type(VehicleType::bus(40));
        let line = s.add_line("1");
        let route = s
            .add_route(line, route_links, stops.iter().map(|&st| RouteStop::new(st, 0.0, 0.0)).collect())
            .unwrap();
        s.add_departure(route, 0, bus);
        (s, stops, RouteIds { line, route })
    }

    struct RouteIds {
        line:  LineId,
        route: TransitRouteId,
    }

    #[test]
    fn passenger_rides_from_first_to_last_stop() {
        let (net, [l0, l1, l2]) = corridor(3_600.0);
        let (schedule, stops, ids) = schedule(&[l0, l1, l2], vec![l0, l1, l2]);
        let mut pop = Population::new();
        pop.push(Person::new(
            Plan::new()
                .activity(Activity::on_link("home", l0).ending_at(0))
                .leg(Leg::with_route(
                    TransportMode::Pt,
                    Route::Transit(TransitPassengerRoute {
                        access_stop: stops[0],
                        egress_stop: stops[2],
                        line:        ids.line,
                        route:       ids.route,
                    }),
                ))
                .activity(Activity::on_link("work", l2)),
        ));
        let events = run(SimBuilder::new(config(3_600), net, pop).schedule(schedule)).unwrap();

        let passenger = AgentId(0);
        let driver = AgentId(1);
        assert_eq!(named(&events, "TransitDriverStarts").len(), 1);
        assert_eq!(named(&events, "waitingForPt").len(), 1);
        assert_eq!(named(&events, "VehicleArrivesAtFacility").len(), 3);
        assert_eq!(named(&events, "VehicleDepartsAtFacility").len(), 3);
        assert!(named(&events, "stuckAndAbort").is_empty());

        let boarded = named(&events, "PersonEntersVehicle");
        assert!(boarded.iter().any(|e| matches!(e.kind, EventKind::PersonEntersVehicle { agent, .. } if agent == passenger)));

        let arrivals = named(&events, "arrival");
        assert_eq!(arrivals.len(), 2);
        // Boarding at tick 1 takes 4 s + 15 s, then three 10 s links and
        // one tick per stop departure.
        assert_eq!(arrivals[0].time, Tick(42));
        assert!(matches!(
            arrivals[0].kind,
            EventKind::Arrival { agent, link, mode: TransportMode::Pt } if agent == passenger && link == l2
        ));
        assert!(matches!(
            arrivals[1].kind,
            EventKind::Arrival { agent, mode: TransportMode::TransitDriver, .. } if agent == driver
        ));
    }

    #[test]
    fn empty_vehicle_past_last_stop_is_fine() {
        let (net, [l0, l1, l2]) = corridor(3_600.0);
        let (schedule, _, _) = schedule(&[l0], vec![l0, l1, l2]);
        let events = run(SimBuilder::new(config(3_600), net, Population::new()).schedule(schedule)).unwrap();
        assert_eq!(named(&events, "VehicleDepartsAtFacility").len(), 1);
        assert_eq!(named(&events, "arrival").len(), 1);
    }

    #[test]
    fn passenger_left_aboard_after_last_stop_halts_the_run() {
        let (net, [l0, l1, l2]) = corridor(3_600.0);
        let (schedule, stops, _) = schedule(&[l0, l2], vec![l0, l1, l2]);
        let collector = Arc::new(Mutex::new(EventCollector::new()));
        let mut sim = SimBuilder::new(config(3_600), net, Population::new())
            .schedule(schedule)
            .event_handler(Arc::clone(&collector))
            .build()
            .unwrap();

        // Tick 0 puts the bus on its first link; smuggle a rider aboard
        // whose stop the route never serves.
        sim.run_ticks(1, &mut NoopObserver).unwrap();
        let mut vehicles = sim.links[l0.index()].drain();
        assert_eq!(vehicles.len(), 1);
        if let Vehicle::Transit(bus) = &mut vehicles[0] {
            bus.passengers.push(Passenger { agent: AgentId(42), egress_stop: StopId(9) });
        }
        sim.links[l0.index()].add_waiting(vehicles.remove(0));

        let err = sim.run(&mut NoopObserver).unwrap_err();
        let (tick, source) = match err {
            SimError::Invariant { tick, source } => (tick, source),
            other => panic!("expected invariant error, got {other}"),
        };
        assert!(matches!(
            source.downcast_ref::<TransitError>(),
            Some(TransitError::VehicleNotEmpty { passengers: 1, .. })
        ));

        // Nothing from the failing tick was delivered.
        let events = collector.lock().unwrap().events.clone();
        assert!(events.iter().all(|e| e.time < tick));
        assert!(!events.iter().any(|e| matches!(
            e.kind,
            EventKind::VehicleArrivesAtFacility { stop, .. } if stop == stops[1]
        )));
    }
}

// ── Observer ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod observer {
    use qs_agent::AgentStore;
    use qs_core::{Coord, Tick};
    use qs_network::{LinkAttrs, NetworkBuilder};
    use qs_population::Population;
    use qs_traffic::LinkQueue;

    use super::helpers::*;
    use crate::{SimBuilder, SimObserver, TickStats};

    #[derive(Default)]
    struct Recorder {
        starts:      u64,
        ends:        u64,
        arrivals:    usize,
        snapshots:   Vec<Tick>,
        max_storage: f64,
        end:         Option<Tick>,
    }

    impl SimObserver for Recorder {
        fn on_tick_start(&mut self, _tick: Tick) {
            self.starts += 1;
        }

        fn on_tick_end(&mut self, _tick: Tick, stats: &TickStats) {
            self.ends += 1;
            self.arrivals += stats.arrivals;
        }

        fn on_snapshot(&mut self, tick: Tick, links: &[LinkQueue], _agents: &AgentStore) {
            self.snapshots.push(tick);
            for q in links {
                self.max_storage = self.max_storage.max(q.occupied_storage() - q.storage_capacity());
            }
        }

        fn on_sim_end(&mut self, final_tick: Tick) {
            self.end = Some(final_tick);
        }
    }

    #[test]
    fn hooks_follow_the_tick_loop() {
        let mut b = NetworkBuilder::new();
        let n: Vec<_> = (0..3).map(|i| b.add_node(Coord::new(i as f64 * 1_000.0, 0.0))).collect();
        let l0 = b.add_link(n[0], n[1], LinkAttrs::new(100.0, 10.0, 36.0, 1.0));
        let l1 = b.add_link(n[1], n[2], LinkAttrs::new(1_000.0, 10.0, 3_600.0, 1.0));
        let net = b.build().unwrap();
        let mut pop = Population::new();
        pop.push(commuter(l0, l1, 0, Some(vec![l0, l1])));
        pop.push(commuter(l0, l1, 0, Some(vec![l0, l1])));

        let mut config = config(3_600);
        config.output_interval_ticks = 100;
        let mut sim = SimBuilder::new(config, net, pop).build().unwrap();
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();

        // Last arrival at tick 201, the run stops idle at 202.
        assert_eq!(rec.starts, 202);
        assert_eq!(rec.ends, 202);
        assert_eq!(rec.arrivals, 2);
        assert_eq!(rec.snapshots, vec![Tick(0), Tick(100), Tick(200)]);
        assert!(rec.max_storage <= 1e-9);
        assert_eq!(rec.end, Some(Tick(202)));
        assert!(sim.is_idle());
    }
}

// ── Parallel link phase ───────────────────────────────────────────────────────

#[cfg(all(test, feature = "parallel"))]
mod parallel {
    use qs_core::SimConfig;
    use qs_population::Population;
    use qs_transit::TransitSchedule;

    use super::helpers::*;
    use crate::run_iteration;

    #[test]
    fn thread_count_does_not_change_the_stream() {
        let run_with = |threads: usize| {
            let (net, [l0, _, l2]) = corridor(900.0);
            let mut pop = Population::new();
            for i in 0..40 {
                pop.push(commuter(l0, l2, i, None));
            }
            let config = SimConfig { num_threads: Some(threads), ..config(3_600) };
            run_iteration(config, net, pop, TransitSchedule::new()).unwrap()
        };
        assert_eq!(run_with(1), run_with(4));
    }
}
