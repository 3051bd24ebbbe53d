//! Routes attached to legs.

use std::sync::Arc;

use qs_core::{LineId, LinkId, StopId, TransitRouteId};

/// How a leg gets from its origin to its destination.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Route {
    /// Full link sequence for a network mode, start and end link included.
    /// Shared with the vehicle that drives it, hence the `Arc`.
    Network { links: Arc<[LinkId]>, travel_secs: f64 },

    /// Teleported leg: the agent reappears at the destination after
    /// `travel_secs`.
    Generic { travel_secs: u64, distance_m: f64 },

    /// Ride on a scheduled transit line between two stops.
    Transit(TransitPassengerRoute),
}

impl Route {
    pub fn network(links: impl Into<Arc<[LinkId]>>, travel_secs: f64) -> Self {
        Route::Network { links: links.into(), travel_secs }
    }

    pub fn generic(travel_secs: u64, distance_m: f64) -> Self {
        Route::Generic { travel_secs, distance_m }
    }

    /// Network links, if this is a network route.
    pub fn links(&self) -> Option<&Arc<[LinkId]>> {
        match self {
            Route::Network { links, .. } => Some(links),
            _ => None,
        }
    }
}

/// The transit part of a passenger's trip.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransitPassengerRoute {
    pub access_stop: StopId,
    pub egress_stop: StopId,
    pub line:        LineId,
    pub route:       TransitRouteId,
}
