//! `qs-events`: what the simulation tells the outside world.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                      |
//! |-------------|---------------------------------------------------------------|
//! | [`event`]   | `Event`, `EventKind`, `AbortReason`                           |
//! | [`manager`] | `EventHandler` trait, `EventsManager`, `EventCollector`, `EventCounter` |
//!
//! # Delivery contract
//!
//! Events produced during a tick are buffered and delivered together when
//! the tick ends, stably sorted by time.  Within one time step the order is
//! the order of production, which the scheduler keeps deterministic (fixed
//! phase order, links and nodes in ascending id order).  Handlers therefore
//! see exactly the same sequence on every run with the same inputs.

pub mod event;
pub mod manager;

#[cfg(test)]
mod tests;

pub use event::{AbortReason, Event, EventKind};
pub use manager::{EventCollector, EventCounter, EventHandler, EventsManager};

/// The ordered output of one simulation run.
pub type EventStream = Vec<Event>;
