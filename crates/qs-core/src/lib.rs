//! `qs-core`: foundational types for the `rust_qsim` queue simulation.
//!
//! Every other `qs-*` crate depends on this one.  It has no `qs-*`
//! dependencies and a single mandatory external one (`thiserror`), plus
//! optional `serde`.
//!
//! # What lives here
//!
//! | Module          | Contents                                                   |
//! |-----------------|------------------------------------------------------------|
//! | [`ids`]         | `AgentId`, `NodeId`, `LinkId`, `VehicleId`, transit ids    |
//! | [`geo`]         | `Coord` (projected x/y metres), Euclidean distance         |
//! | [`time`]        | `Tick`, `SimClock`                                         |
//! | [`config`]      | `SimConfig`, `BoardingPolicy`                              |
//! | [`transport`]   | `TransportMode` enum                                       |
//! | [`error`]       | `CoreError`, `CoreResult`                                  |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod time;
pub mod transport;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{BoardingPolicy, SimConfig};
pub use error::{CoreError, CoreResult};
pub use geo::Coord;
pub use ids::{AgentId, DepartureId, LineId, LinkId, NodeId, StopId, TransitRouteId, VehicleId};
pub use time::{SimClock, Tick};
pub use transport::TransportMode;

/// Tolerance used when comparing fractional vehicle-equivalents.
pub const PCE_EPSILON: f64 = 1e-9;
