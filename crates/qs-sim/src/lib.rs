//! `qs-sim`: tick loop orchestrator for the `rust_qsim` queue simulation.
//!
//! # Tick loop
//!
//! ```text
//! for tick in start..end:
//!   ① Links  : advance every active link queue; collect arrivals
//!               (parallel with the `parallel` feature).
//!   ② Stops  : serve transit vehicles due at a stop; hold or release them.
//!   ③ Nodes  : move buffer heads onto their next link, ascending NodeId,
//!               incoming links in ascending LinkId.
//!   ④ Agents : link and stop arrivals, wake queue (activity ends and
//!               teleport arrivals), transit departures.
//!   ⑤ Events : stable-sort the tick's batch by time and deliver it.
//! ```
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                  |
//! |------------|---------------------------------------------------------|
//! | `parallel` | Runs the link phase on Rayon's thread pool.             |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use qs_core::SimConfig;
//! use qs_sim::run_iteration;
//! use qs_transit::TransitSchedule;
//!
//! let events = run_iteration(SimConfig::default(), network, population, TransitSchedule::new())?;
//! for e in &events {
//!     println!("{e}");
//! }
//! ```

pub mod builder;
pub mod error;
pub mod observer;
pub mod sim;

#[cfg(test)]
mod tests;

pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver, TickStats};
pub use sim::{Sim, run_iteration};
