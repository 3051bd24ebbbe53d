//! Route computation for legs that arrive without a route.
//!
//! The simulation itself never routes.  Before the first tick the builder
//! asks a [`Router`] for every network leg that lacks a route, and a
//! [`BeelineEstimator`] for every teleported leg that lacks a travel time.
//! Afterwards the plans are fixed for the whole run.
//!
//! # Route shape
//!
//! A network route is the full link sequence the vehicle occupies, start and
//! end link included:
//!
//! ```text
//! [start_link, …intermediate links…, end_link]
//! ```
//!
//! A leg that starts and ends on the same link has the one-element route
//! `[start_link]`.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use qs_core::{Coord, LinkId, NodeId, TransportMode};

use crate::network::Network;
use crate::{NetworkError, NetworkResult};

// ── NetworkRoute ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkRoute {
    pub links: Vec<LinkId>,
    /// Expected free-flow travel time, excluding the start link.
    pub travel_secs: f64,
}

impl NetworkRoute {
    /// Build a route from an explicit link sequence, computing the expected
    /// free-flow travel time from the network.
    pub fn from_links(network: &Network, links: Vec<LinkId>) -> NetworkResult<Self> {
        network.check_route(&links)?;
        let travel_secs = links[1..].iter().map(|&l| network.free_flow_secs(l)).sum();
        Ok(Self { links, travel_secs })
    }

    pub fn start_link(&self) -> Option<LinkId> {
        self.links.first().copied()
    }

    pub fn end_link(&self) -> Option<LinkId> {
        self.links.last().copied()
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable route factory for network modes.
///
/// Implementations must be `Send + Sync` so one instance can be shared by
/// several simulations running on different threads.
pub trait Router: Send + Sync {
    /// Route from the end of `from` to the end of `to` for `mode`.
    fn route(
        &self,
        network: &Network,
        from:    LinkId,
        to:      LinkId,
        mode:    TransportMode,
    ) -> NetworkResult<NetworkRoute>;
}

// ── DijkstraRouter ────────────────────────────────────────────────────────────

/// Least free-flow-time routes by Dijkstra over the CSR graph.
///
/// Link cost is the free-flow traversal time in milliseconds.  Bikes are
/// capped at 4.2 m/s on fast links; every other mode uses the link's free
/// speed.  Equal-cost alternatives are broken by the lower `NodeId` so the
/// result never depends on heap internals.
pub struct DijkstraRouter;

impl Router for DijkstraRouter {
    fn route(
        &self,
        network: &Network,
        from:    LinkId,
        to:      LinkId,
        mode:    TransportMode,
    ) -> NetworkResult<NetworkRoute> {
        for link in [from, to] {
            if !network.contains_link(link) {
                return Err(NetworkError::LinkNotFound(link));
            }
        }
        if from == to {
            return Ok(NetworkRoute { links: vec![from], travel_secs: 0.0 });
        }

        let source = network.link_to[from.index()];
        let target = network.link_from[to.index()];
        let mut links = vec![from];
        links.extend(dijkstra(network, source, target, mode).ok_or(NetworkError::NoRoute { from, to })?);
        links.push(to);

        let travel_secs = links[1..]
            .iter()
            .map(|&l| link_cost_ms(network, l, mode) as f64 / 1_000.0)
            .sum();
        Ok(NetworkRoute { links, travel_secs })
    }
}

/// Link cost in milliseconds for `mode`.
#[inline]
fn link_cost_ms(network: &Network, link: LinkId, mode: TransportMode) -> u64 {
    let speed = network.link_freespeed_mps[link.index()];
    let speed = match mode {
        TransportMode::Bike => speed.min(4.2),
        _ => speed,
    };
    (network.link_length_m[link.index()] / speed * 1_000.0).round() as u64
}

/// Intermediate links from `source` node to `target` node, or `None` if
/// `target` is unreachable.
fn dijkstra(
    network: &Network,
    source:  NodeId,
    target:  NodeId,
    mode:    TransportMode,
) -> Option<Vec<LinkId>> {
    if source == target {
        return Some(Vec::new());
    }

    let n = network.node_count();
    let mut dist      = vec![u64::MAX; n];
    let mut prev_link = vec![LinkId::INVALID; n];
    dist[source.index()] = 0;

    let mut heap: BinaryHeap<Reverse<(u64, NodeId)>> = BinaryHeap::new();
    heap.push(Reverse((0, source)));

    while let Some(Reverse((cost, node))) = heap.pop() {
        if node == target {
            break;
        }
        // Stale heap entry.
        if cost > dist[node.index()] {
            continue;
        }
        for &link in network.out_links(node) {
            let next = network.link_to[link.index()];
            let new_cost = cost.saturating_add(link_cost_ms(network, link, mode));
            if new_cost < dist[next.index()] {
                dist[next.index()] = new_cost;
                prev_link[next.index()] = link;
                heap.push(Reverse((new_cost, next)));
            }
        }
    }

    if dist[target.index()] == u64::MAX {
        return None;
    }

    let mut path = Vec::new();
    let mut cur = target;
    while cur != source {
        let link = prev_link[cur.index()];
        path.push(link);
        cur = network.link_from[link.index()];
    }
    path.reverse();
    Some(path)
}

// ── BeelineEstimator ──────────────────────────────────────────────────────────

/// Travel-time estimate for teleported legs: beeline distance times a
/// detour factor, at a constant speed.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BeelineEstimator {
    pub speed_mps:      f64,
    pub beeline_factor: f64,
}

impl BeelineEstimator {
    pub fn new(speed_mps: f64, beeline_factor: f64) -> Self {
        Self { speed_mps, beeline_factor }
    }

    /// Defaults for the usual teleported modes, `None` for the rest.
    ///
    /// | Mode                  | Speed     | Factor |
    /// |-----------------------|-----------|--------|
    /// | Walk, TransitWalk     | 0.833 m/s | 1.3    |
    /// | Bike                  | 4.167 m/s | 1.3    |
    pub fn default_for(mode: TransportMode) -> Option<Self> {
        match mode {
            TransportMode::Walk | TransportMode::TransitWalk => Some(Self::new(3.0 / 3.6, 1.3)),
            TransportMode::Bike => Some(Self::new(15.0 / 3.6, 1.3)),
            _ => None,
        }
    }

    /// Travelled distance in metres between two points.
    pub fn distance_m(&self, from: Coord, to: Coord) -> f64 {
        from.distance(to) * self.beeline_factor
    }

    /// Travel time in whole seconds (rounded up) between two points.
    pub fn travel_secs(&self, from: Coord, to: Coord) -> u64 {
        (self.distance_m(from, to) / self.speed_mps).ceil() as u64
    }
}
