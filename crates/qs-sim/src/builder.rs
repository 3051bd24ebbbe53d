//! Fluent builder for constructing a [`Sim`].

use std::collections::BTreeMap;

use qs_agent::AgentStoreBuilder;
use qs_core::{AgentId, Coord, LinkId, SimConfig, TransportMode};
use qs_events::{EventHandler, EventsManager};
use qs_network::{BeelineEstimator, Network, NetworkError, Router};
use qs_population::{Activity, PlanElement, Population, Route, WakeQueue};
use qs_traffic::{LinkQueue, QueueConfig};
use qs_transit::{StopHandler, TransitConfig, TransitEngine, TransitSchedule};

use crate::{Sim, SimError, SimResult};

/// Fluent builder for [`Sim`].
///
/// # Required inputs
///
/// - [`SimConfig`]: time window, capacity factors, network modes, …
/// - [`Network`]
/// - [`Population`]: persons with their plans
///
/// # Optional inputs (have defaults)
///
/// | Method                  | Default                                   |
/// |-------------------------|-------------------------------------------|
/// | `.schedule(s)`          | Empty `TransitSchedule`                   |
/// | `.router(mode, r)`      | None: network legs need explicit routes   |
/// | `.teleport(mode, e)`    | `BeelineEstimator::default_for(mode)`     |
/// | `.stop_handler(h)`      | `SimpleStopHandler`                       |
/// | `.event_handler(h)`     | No handlers                               |
///
/// `build` rejects malformed input before any tick runs: invalid
/// configuration, broken plans, unknown links, schedule errors, and legs
/// that lack a route when no router or estimator is registered for their
/// mode.  Missing routes are filled in here, once; activities given only by
/// coordinate are snapped to the nearest link.
///
/// # Example
///
/// ```rust,ignore
/// let collector = Arc::new(Mutex::new(EventCollector::new()));
/// let mut sim = SimBuilder::new(config, network, population)
///     .schedule(schedule)
///     .router(TransportMode::Car, DijkstraRouter)
///     .event_handler(Arc::clone(&collector))
///     .build()?;
/// sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder {
    config:       SimConfig,
    network:      Network,
    population:   Population,
    schedule:     TransitSchedule,
    routers:      BTreeMap<TransportMode, Box<dyn Router>>,
    teleport:     BTreeMap<TransportMode, BeelineEstimator>,
    stop_handler: Option<Box<dyn StopHandler>>,
    events:       EventsManager,
}

impl SimBuilder {
    pub fn new(config: SimConfig, network: Network, population: Population) -> Self {
        Self {
            config,
            network,
            population,
            schedule:     TransitSchedule::default(),
            routers:      BTreeMap::new(),
            teleport:     BTreeMap::new(),
            stop_handler: None,
            events:       EventsManager::new(),
        }
    }

    pub fn schedule(mut self, schedule: TransitSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Route network legs of `mode` that arrive without a route.
    pub fn router<R: Router + 'static>(mut self, mode: TransportMode, router: R) -> Self {
        self.routers.insert(mode, Box::new(router));
        self
    }

    /// Estimate travel time and distance of teleported `mode` legs that
    /// arrive without a route.
    pub fn teleport(mut self, mode: TransportMode, estimator: BeelineEstimator) -> Self {
        self.teleport.insert(mode, estimator);
        self
    }

    pub fn stop_handler<H: StopHandler + 'static>(mut self, handler: H) -> Self {
        self.stop_handler = Some(Box::new(handler));
        self
    }

    /// Register an event handler.  Handlers see events in registration
    /// order.
    pub fn event_handler<H: EventHandler + 'static>(mut self, handler: H) -> Self {
        self.events.add_handler(handler);
        self
    }

    /// Validate inputs, resolve routes, and return a ready-to-run [`Sim`].
    pub fn build(self) -> SimResult<Sim> {
        let SimBuilder {
            config,
            network,
            mut population,
            schedule,
            routers,
            teleport,
            stop_handler,
            events,
        } = self;

        // ── Validate ──────────────────────────────────────────────────────
        config.validate()?;
        let queue_config = QueueConfig::from_sim(&config);
        queue_config.validate()?;
        population.validate()?;
        schedule.validate(&network)?;

        // ── Locate activities and resolve legs ────────────────────────────
        let resolver = LegResolver {
            config:   &config,
            network:  &network,
            schedule: &schedule,
            routers:  &routers,
            teleport: &teleport,
        };
        let mut routed = 0usize;
        for (i, person) in population.persons.iter_mut().enumerate() {
            let agent = AgentId(i as u32);
            locate_activities(agent, &mut person.plan.elements, &network)?;
            for element in (1..person.plan.len()).step_by(2) {
                let Some(route) = resolver.resolve(agent, &person.plan.elements, element)? else { continue };
                if let PlanElement::Leg(leg) = &mut person.plan.elements[element] {
                    leg.route = Some(route);
                    routed += 1;
                }
            }
        }
        log::debug!("resolved {routed} routes for {} persons", population.len());

        // ── Assemble ──────────────────────────────────────────────────────
        let clock = config.make_clock();
        let wake_queue = WakeQueue::build_from_population(&population, &clock);
        let links = LinkQueue::for_network(&network, &queue_config);

        let persons = population.len() as u32;
        let mut transit = TransitEngine::new(schedule, TransitConfig::from_sim(&config), &clock, persons, persons);
        if let Some(handler) = stop_handler {
            transit = transit.with_handler(handler);
        }

        let start_links = population
            .persons
            .iter()
            .map(|p| p.plan.activity_at(0).map_or(LinkId::INVALID, |a| a.link))
            .collect();
        let agents = AgentStoreBuilder::new(population.len())
            .transit_drivers(transit.driver_count())
            .start_links(start_links)
            .build();

        #[cfg(feature = "parallel")]
        let pool = match config.num_threads {
            Some(n) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| qs_core::CoreError::Config(format!("thread pool: {e}")))?,
            ),
            None => None,
        };

        Ok(Sim {
            stuck_threshold:  config.stuck_threshold_ticks(),
            end_tick:         config.end_tick(),
            next_report_secs: clock.start_secs,
            finished:         false,
            clock,
            config,
            network,
            population,
            agents,
            links,
            wake_queue,
            transit,
            events,
            #[cfg(feature = "parallel")]
            pool,
        })
    }
}

// ── Setup helpers ─────────────────────────────────────────────────────────────

/// Snap coordinate-only activities to the nearest link and check the rest.
fn locate_activities(agent: AgentId, elements: &mut [PlanElement], network: &Network) -> SimResult<()> {
    for (element, e) in elements.iter_mut().enumerate() {
        let PlanElement::Activity(act) = e else { continue };
        if act.link == LinkId::INVALID {
            act.link = act
                .coord
                .and_then(|c| network.nearest_link(c))
                .ok_or_else(|| SimError::InvalidPlan {
                    agent,
                    element,
                    reason: "activity has neither a link nor a coordinate near the network".into(),
                })?;
        } else if !network.contains_link(act.link) {
            return Err(NetworkError::LinkNotFound(act.link).into());
        }
    }
    Ok(())
}

fn check_links(links: &[LinkId], network: &Network) -> SimResult<()> {
    if links.is_empty() {
        return Err(NetworkError::EmptyRoute.into());
    }
    match links.iter().find(|l| !network.contains_link(**l)) {
        Some(&bad) => Err(NetworkError::LinkNotFound(bad).into()),
        None => Ok(()),
    }
}

struct LegResolver<'a> {
    config:   &'a SimConfig,
    network:  &'a Network,
    schedule: &'a TransitSchedule,
    routers:  &'a BTreeMap<TransportMode, Box<dyn Router>>,
    teleport: &'a BTreeMap<TransportMode, BeelineEstimator>,
}

impl LegResolver<'_> {
    /// Check the leg at `element` and return a route to store on it, if the
    /// one it has must be replaced.
    ///
    /// Explicit network routes are only checked for unknown links.  A route
    /// whose links do not connect is accepted here and aborts its agent when
    /// the vehicle reaches the gap.
    fn resolve(&self, agent: AgentId, elements: &[PlanElement], element: usize) -> SimResult<Option<Route>> {
        let invalid = |reason: String| SimError::InvalidPlan { agent, element, reason };
        let (Some(PlanElement::Activity(from)), Some(PlanElement::Leg(leg)), Some(PlanElement::Activity(to))) =
            (elements.get(element - 1), elements.get(element), elements.get(element + 1))
        else {
            return Err(invalid("leg must sit between two activities".into()));
        };
        let mode = leg.mode;

        if mode == TransportMode::Pt {
            return match &leg.route {
                Some(Route::Transit(trip)) => {
                    self.schedule.check_passenger_route(trip)?;
                    Ok(None)
                }
                _ => Err(invalid("pt leg needs a transit passenger route".into())),
            };
        }

        match &leg.route {
            Some(Route::Transit(_)) => Err(invalid(format!("{mode} leg cannot use a transit route"))),

            Some(Route::Network { links, .. }) if self.config.is_network_mode(mode) => {
                check_links(links, self.network)?;
                Ok(None)
            }
            Some(Route::Generic { .. }) if self.config.is_network_mode(mode) => {
                Err(invalid(format!("{mode} runs on the network and needs a link route")))
            }
            None if self.config.is_network_mode(mode) => {
                let router = self.routers.get(&mode).ok_or(SimError::MissingRouter(mode))?;
                let route = router.route(self.network, from.link, to.link, mode)?;
                Ok(Some(Route::network(route.links, route.travel_secs)))
            }

            // Teleported modes.
            Some(Route::Generic { .. }) => Ok(None),
            Some(Route::Network { links, travel_secs }) => {
                check_links(links, self.network)?;
                let distance_m: f64 = links[1..]
                    .iter()
                    .map(|l| self.network.link_length_m[l.index()])
                    .sum();
                Ok(Some(Route::generic(travel_secs.ceil() as u64, distance_m)))
            }
            None => {
                let estimator = self
                    .teleport
                    .get(&mode)
                    .copied()
                    .or_else(|| BeelineEstimator::default_for(mode))
                    .ok_or(SimError::MissingRouter(mode))?;
                let (a, b) = (self.position(from), self.position(to));
                Ok(Some(Route::generic(estimator.travel_secs(a, b), estimator.distance_m(a, b))))
            }
        }
    }

    fn position(&self, act: &Activity) -> Coord {
        act.coord.unwrap_or_else(|| self.network.link_to_coord(act.link))
    }
}
