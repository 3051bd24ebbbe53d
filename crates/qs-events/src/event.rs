//! Event records.
//!
//! Events are immutable once created.  Ids are the dense simulation ids;
//! mapping them back to external names is left to output collaborators.

use std::fmt;
use std::sync::Arc;

use qs_core::{AgentId, DepartureId, LineId, LinkId, StopId, Tick, TransitRouteId, TransportMode, VehicleId};

/// Why an agent left the simulation early.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AbortReason {
    /// Blocked in a link buffer longer than the stuck threshold.
    Stuck,
    /// The route asked for a link that does not continue from the current one.
    RouteInconsistent,
    /// A network leg did not start on the link the agent was at.
    WrongStartLink,
    /// A transit vehicle reached the end of its route with stops unserved.
    StopsNotServed,
    /// Passenger aboard a vehicle that was removed.
    VehicleRemoved,
    /// Still travelling when the simulation ended.
    EndOfSimulation,
}

impl AbortReason {
    pub fn as_str(self) -> &'static str {
        match self {
            AbortReason::Stuck             => "stuck",
            AbortReason::RouteInconsistent => "route_inconsistent",
            AbortReason::WrongStartLink    => "wrong_start_link",
            AbortReason::StopsNotServed    => "stops_not_served",
            AbortReason::VehicleRemoved    => "vehicle_removed",
            AbortReason::EndOfSimulation   => "end_of_simulation",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventKind {
    ActivityEnd   { agent: AgentId, link: LinkId, act_type: Arc<str> },
    ActivityStart { agent: AgentId, link: LinkId, act_type: Arc<str> },
    Departure     { agent: AgentId, link: LinkId, mode: TransportMode },
    Arrival       { agent: AgentId, link: LinkId, mode: TransportMode },
    TeleportationArrival { agent: AgentId, mode: TransportMode, distance_m: f64 },

    PersonEntersVehicle { agent: AgentId, vehicle: VehicleId },
    PersonLeavesVehicle { agent: AgentId, vehicle: VehicleId },

    /// A departing vehicle moved from the waiting list into the link buffer.
    VehicleEntersTraffic { agent: AgentId, vehicle: VehicleId, link: LinkId, mode: TransportMode },
    /// A vehicle reached the end of its route and left the network.
    VehicleLeavesTraffic { agent: AgentId, vehicle: VehicleId, link: LinkId, mode: TransportMode },
    LinkEnter { vehicle: VehicleId, link: LinkId },
    LinkLeave { vehicle: VehicleId, link: LinkId },

    TransitDriverStarts {
        driver:    AgentId,
        vehicle:   VehicleId,
        line:      LineId,
        route:     TransitRouteId,
        departure: DepartureId,
    },
    /// `delay_secs` is actual minus scheduled arrival (negative when early).
    VehicleArrivesAtFacility { vehicle: VehicleId, stop: StopId, delay_secs: f64 },
    VehicleDepartsAtFacility { vehicle: VehicleId, stop: StopId, delay_secs: f64 },
    WaitingForPt  { agent: AgentId, stop: StopId, destination: StopId },
    BoardingDenied { agent: AgentId, vehicle: VehicleId },

    /// Diagnostic: the agent entered the ABORT state.
    AgentStuck { agent: AgentId, link: LinkId, mode: Option<TransportMode>, reason: AbortReason },
}

impl EventKind {
    /// Event type label used in output.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::ActivityEnd { .. }              => "actend",
            EventKind::ActivityStart { .. }            => "actstart",
            EventKind::Departure { .. }                => "departure",
            EventKind::Arrival { .. }                  => "arrival",
            EventKind::TeleportationArrival { .. }     => "travelled",
            EventKind::PersonEntersVehicle { .. }      => "PersonEntersVehicle",
            EventKind::PersonLeavesVehicle { .. }      => "PersonLeavesVehicle",
            EventKind::VehicleEntersTraffic { .. }     => "vehicle enters traffic",
            EventKind::VehicleLeavesTraffic { .. }     => "vehicle leaves traffic",
            EventKind::LinkEnter { .. }                => "entered link",
            EventKind::LinkLeave { .. }                => "left link",
            EventKind::TransitDriverStarts { .. }      => "TransitDriverStarts",
            EventKind::VehicleArrivesAtFacility { .. } => "VehicleArrivesAtFacility",
            EventKind::VehicleDepartsAtFacility { .. } => "VehicleDepartsAtFacility",
            EventKind::WaitingForPt { .. }             => "waitingForPt",
            EventKind::BoardingDenied { .. }           => "BoardingDenied",
            EventKind::AgentStuck { .. }               => "stuckAndAbort",
        }
    }

    /// The person (or driver) the event is about, if any.
    pub fn agent(&self) -> Option<AgentId> {
        match *self {
            EventKind::ActivityEnd { agent, .. }
            | EventKind::ActivityStart { agent, .. }
            | EventKind::Departure { agent, .. }
            | EventKind::Arrival { agent, .. }
            | EventKind::TeleportationArrival { agent, .. }
            | EventKind::PersonEntersVehicle { agent, .. }
            | EventKind::PersonLeavesVehicle { agent, .. }
            | EventKind::VehicleEntersTraffic { agent, .. }
            | EventKind::VehicleLeavesTraffic { agent, .. }
            | EventKind::WaitingForPt { agent, .. }
            | EventKind::BoardingDenied { agent, .. }
            | EventKind::AgentStuck { agent, .. } => Some(agent),
            EventKind::TransitDriverStarts { driver, .. } => Some(driver),
            EventKind::LinkEnter { .. }
            | EventKind::LinkLeave { .. }
            | EventKind::VehicleArrivesAtFacility { .. }
            | EventKind::VehicleDepartsAtFacility { .. } => None,
        }
    }

    pub fn vehicle(&self) -> Option<VehicleId> {
        match *self {
            EventKind::PersonEntersVehicle { vehicle, .. }
            | EventKind::PersonLeavesVehicle { vehicle, .. }
            | EventKind::VehicleEntersTraffic { vehicle, .. }
            | EventKind::VehicleLeavesTraffic { vehicle, .. }
            | EventKind::LinkEnter { vehicle, .. }
            | EventKind::LinkLeave { vehicle, .. }
            | EventKind::TransitDriverStarts { vehicle, .. }
            | EventKind::VehicleArrivesAtFacility { vehicle, .. }
            | EventKind::VehicleDepartsAtFacility { vehicle, .. }
            | EventKind::BoardingDenied { vehicle, .. } => Some(vehicle),
            _ => None,
        }
    }

    pub fn link(&self) -> Option<LinkId> {
        match *self {
            EventKind::ActivityEnd { link, .. }
            | EventKind::ActivityStart { link, .. }
            | EventKind::Departure { link, .. }
            | EventKind::Arrival { link, .. }
            | EventKind::VehicleEntersTraffic { link, .. }
            | EventKind::VehicleLeavesTraffic { link, .. }
            | EventKind::LinkEnter { link, .. }
            | EventKind::LinkLeave { link, .. }
            | EventKind::AgentStuck { link, .. } => Some(link),
            _ => None,
        }
    }

    pub fn stop(&self) -> Option<StopId> {
        match *self {
            EventKind::VehicleArrivesAtFacility { stop, .. }
            | EventKind::VehicleDepartsAtFacility { stop, .. }
            | EventKind::WaitingForPt { stop, .. } => Some(stop),
            _ => None,
        }
    }

    /// Free-form attributes that do not fit the id columns.
    pub fn detail(&self) -> String {
        match self {
            EventKind::ActivityEnd { act_type, .. }
            | EventKind::ActivityStart { act_type, .. } => format!("actType={act_type}"),
            EventKind::Departure { mode, .. }
            | EventKind::Arrival { mode, .. }
            | EventKind::VehicleEntersTraffic { mode, .. }
            | EventKind::VehicleLeavesTraffic { mode, .. } => format!("legMode={mode}"),
            EventKind::TeleportationArrival { mode, distance_m, .. } => {
                format!("mode={mode};distance={distance_m:.1}")
            }
            EventKind::TransitDriverStarts { line, route, departure, .. } => {
                format!("line={};route={};departure={}", line.0, route.0, departure.0)
            }
            EventKind::VehicleArrivesAtFacility { delay_secs, .. }
            | EventKind::VehicleDepartsAtFacility { delay_secs, .. } => format!("delay={delay_secs:.1}"),
            EventKind::WaitingForPt { destination, .. } => format!("destinationStop={}", destination.0),
            EventKind::AgentStuck { mode, reason, .. } => match mode {
                Some(m) => format!("legMode={m};reason={}", reason.as_str()),
                None => format!("reason={}", reason.as_str()),
            },
            _ => String::new(),
        }
    }
}

/// A timestamped event.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    pub time: Tick,
    pub kind: EventKind,
}

impl Event {
    #[inline]
    pub fn new(time: Tick, kind: EventKind) -> Self {
        Self { time, kind }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.time, self.kind.name())?;
        if let Some(a) = self.kind.agent() {
            write!(f, " agent={}", a.0)?;
        }
        if let Some(v) = self.kind.vehicle() {
            write!(f, " vehicle={}", v.0)?;
        }
        if let Some(l) = self.kind.link() {
            write!(f, " link={}", l.0)?;
        }
        if let Some(s) = self.kind.stop() {
            write!(f, " stop={}", s.0)?;
        }
        let detail = self.kind.detail();
        if !detail.is_empty() {
            write!(f, " {detail}")?;
        }
        Ok(())
    }
}
