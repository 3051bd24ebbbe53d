//! `qs-transit`: scheduled public transport on top of the link queues.
//!
//! # Crate layout
//!
//! | Module           | Contents                                                 |
//! |------------------|----------------------------------------------------------|
//! | [`schedule`]     | `TransitSchedule`, stops, lines, routes, departures      |
//! | [`tracker`]      | `StopAgentTracker`: FIFO of waiting passengers per stop  |
//! | [`stop_handler`] | `StopHandler` trait, `SimpleStopHandler`                 |
//! | [`engine`]       | `TransitEngine`, `TransitConfig`, `StopOutcome`          |
//! | [`error`]        | `TransitError`, `TransitResult<T>`                       |
//!
//! A transit vehicle alternates between driving and serving stops:
//!
//! ```text
//! DRIVE ─▶ AT_STOP ─(dwell > 0)─▶ AT_STOP … ─(dwell = 0)─▶ DRIVE ─▶ … ─▶ end of route
//! ```
//!
//! It is driven by a synthetic agent created for its departure.

pub mod engine;
pub mod error;
pub mod schedule;
pub mod stop_handler;
pub mod tracker;


pub use engine::{StopOutcome, TransitConfig, TransitEngine};
pub use error::{TransitError, TransitResult};
pub use schedule::{Departure, RouteStop, TransitLine, TransitRoute, TransitSchedule, TransitStop, VehicleType};
pub use stop_handler::{DwellInput, SimpleStopHandler, StopHandler};
pub use tracker::{StopAgentTracker, WaitingPassenger};
