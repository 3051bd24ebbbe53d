//! `qs-network`: the static network every other component reads.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                      |
//! |-------------|---------------------------------------------------------------|
//! | [`network`] | `Network` (SoA links, CSR adjacency, R-tree), `NetworkBuilder`|
//! | [`router`]  | `Router` trait, `NetworkRoute`, `DijkstraRouter`, `BeelineEstimator` |
//! | [`error`]   | `NetworkError`, `NetworkResult<T>`                            |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on `LinkAttrs`.            |

pub mod error;
pub mod network;
pub mod router;


pub use error::{NetworkError, NetworkResult};
pub use network::{LinkAttrs, Network, NetworkBuilder};
pub use router::{BeelineEstimator, DijkstraRouter, NetworkRoute, Router};
