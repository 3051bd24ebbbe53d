use qs_core::{LinkId, VehicleId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrafficError {
    #[error("link {link:?} holds {used:.3} vehicle-equivalents, capacity is {capacity:.3}")]
    StorageOverflow { link: LinkId, used: f64, capacity: f64 },

    #[error("link {link:?} refused vehicle {vehicle:?} after reporting free space")]
    AdmissionRefused { link: LinkId, vehicle: VehicleId },

    #[error("invalid queue configuration: {0}")]
    Config(String),
}

pub type TrafficResult<T> = Result<T, TrafficError>;
