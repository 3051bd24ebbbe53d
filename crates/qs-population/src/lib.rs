//! `qs-population`: the demand side: who goes where, when, and how.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                  |
//! |----------------|-----------------------------------------------------------|
//! | [`plan`]       | `Activity`, `Leg`, `PlanElement`, `Plan`                  |
//! | [`route`]      | `Route` (network, generic, transit passenger)             |
//! | [`person`]     | `Person`, `Population`                                    |
//! | [`wake_queue`] | `WakeQueue` (`BTreeMap<Tick, Vec<AgentId>>`)              |
//! | [`error`]      | `PopulationError`, `PopulationResult<T>`                  |
//!
//! # Plan model
//!
//! A plan alternates activities and legs and both starts and ends with an
//! activity:
//!
//! ```text
//! Activity(home) → Leg(car) → Activity(work) → Leg(pt) → Activity(home)
//! ```
//!
//! An activity ends at its explicit end time, or after its maximum
//! duration, whichever is given first in that order.  The final activity
//! never ends.

pub mod error;
pub mod person;
pub mod plan;
pub mod route;
pub mod wake_queue;


pub use error::{PopulationError, PopulationResult};
pub use person::{Person, Population};
pub use plan::{Activity, Leg, Plan, PlanElement};
pub use route::{Route, TransitPassengerRoute};
pub use wake_queue::WakeQueue;
