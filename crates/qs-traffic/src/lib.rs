//! `qs-traffic`: vehicles moving through the network as queues.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                   |
//! |-----------------|------------------------------------------------------------|
//! | [`vehicle`]     | `Movable` trait, `Vehicle` (private / transit), `StopRef`  |
//! | [`flow`]        | `FlowCapacity`: per-link outflow accumulator               |
//! | [`storage`]     | `Storage`: occupied road space in vehicle-equivalents      |
//! | [`config`]      | `QueueConfig`: per-run parameters shared by all links      |
//! | [`link_queue`]  | `LinkQueue`: queue, waiting list, stop area, exit buffer   |
//! | [`node_mover`]  | `move_node`: buffer → downstream link transfer             |
//! | [`error`]       | `TrafficError`, `TrafficResult<T>`                         |
//!
//! # Queue model
//!
//! A link is a FIFO queue with a minimum traversal time.  A vehicle entering
//! at tick `t` cannot leave before `t + free-flow ticks`; after that it moves
//! into the exit buffer as fast as the link's flow capacity allows.  Node
//! movers pull from exit buffers and push onto downstream links while those
//! have storage left; otherwise the vehicle stays put and the jam spills
//! back upstream.
//!
//! ```text
//!  upstream ──▶ [ queue ........ ] ──flow──▶ [ buffer ] ──node──▶ downstream
//!                waiting list ─────flow──▶ ┘
//! ```

pub mod config;
pub mod error;
pub mod flow;
pub mod link_queue;
pub mod node_mover;
pub mod storage;
pub mod vehicle;

#[cfg(test)]
mod tests;

pub use config::QueueConfig;
pub use error::{TrafficError, TrafficResult};
pub use flow::FlowCapacity;
pub use link_queue::{HeldVehicle, LinkQueue, Origin};
pub use node_mover::{RemovedVehicle, move_node};
pub use storage::Storage;
pub use vehicle::{Movable, Passenger, PrivateVehicle, StopRef, TransitVehicle, Vehicle};
