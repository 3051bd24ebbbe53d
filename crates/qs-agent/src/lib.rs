//! `qs-agent`: agent state for the `rust_qsim` queue simulation.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                     |
//! |-------------|--------------------------------------------------------------|
//! | [`state`]   | `AgentState`, `LegStage`                                     |
//! | [`store`]   | `AgentStore` (SoA arrays + checked transitions)              |
//! | [`builder`] | `AgentStoreBuilder` (persons + transit drivers)              |
//! | [`error`]   | `AgentError`, `AgentResult<T>`                               |
//!
//! # State machine
//!
//! ```text
//!            start_leg               end_leg
//! ACTIVITY ───────────▶ LEG(stage) ─────────▶ ACTIVITY ─ … ─▶ last activity
//!     │                    │
//!     └──── abort ─────────┴──────▶ ABORT (terminal)
//! ```
//!
//! The store only enforces legal transitions.  What happens on each one
//! (events, vehicles, wake-ups) is orchestrated by `qs-sim`.
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                    |
//! |---------|-----------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on `AgentState`.        |

pub mod builder;
pub mod error;
pub mod state;
pub mod store;


pub use builder::AgentStoreBuilder;
pub use error::{AgentError, AgentResult};
pub use state::{AgentState, LegStage};
pub use store::AgentStore;
