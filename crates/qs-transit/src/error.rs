use qs_core::{DepartureId, LineId, StopId, TransitRouteId, VehicleId};
use qs_network::NetworkError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransitError {
    #[error("unknown stop {0:?}")]
    UnknownStop(StopId),

    #[error("unknown line {0:?}")]
    UnknownLine(LineId),

    #[error("unknown transit route {0:?}")]
    UnknownRoute(TransitRouteId),

    #[error("unknown departure {0:?}")]
    UnknownDeparture(DepartureId),

    #[error("unknown vehicle type {0}")]
    UnknownVehicleType(usize),

    #[error("vehicle type {0} needs a positive capacity and size")]
    InvalidVehicleType(usize),

    #[error("transit route {route:?}: {reason}")]
    InvalidRoute { route: TransitRouteId, reason: String },

    #[error("passenger route on {route:?}: {reason}")]
    InvalidPassengerRoute { route: TransitRouteId, reason: String },

    #[error("transit vehicle {vehicle:?} passed its last stop with {passengers} passengers aboard")]
    VehicleNotEmpty { vehicle: VehicleId, passengers: usize },

    #[error("transit vehicle {0:?} was asked to serve a stop but has none left")]
    NoStopLeft(VehicleId),

    #[error("network error: {0}")]
    Network(#[from] NetworkError),
}

pub type TransitResult<T> = Result<T, TransitError>;
