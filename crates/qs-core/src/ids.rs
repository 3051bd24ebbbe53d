//! Strongly typed identifiers.
//!
//! Every entity in the simulation is addressed by a dense `u32` index into
//! the `Vec` that owns it (links into `Network`, agents into `AgentStore`,
//! stops into `TransitSchedule`, …).  The wrappers keep a `LinkId` from ever
//! being used where a `NodeId` was meant.

use std::fmt;

macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline(always)]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl Default for $name {
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Index of an agent.  Persons come first, synthetic transit drivers are
    /// numbered after the last person.
    pub struct AgentId(u32);
}

typed_id! {
    /// Index of a network node.
    pub struct NodeId(u32);
}

typed_id! {
    /// Index of a directed network link.
    pub struct LinkId(u32);
}

typed_id! {
    /// Index of a vehicle created during the run.
    pub struct VehicleId(u32);
}

typed_id! {
    /// Index of a transit stop facility.
    pub struct StopId(u32);
}

typed_id! {
    /// Index of a transit line.
    pub struct LineId(u32);
}

typed_id! {
    /// Index of a transit route (a line variant with its own stop sequence).
    pub struct TransitRouteId(u32);
}

typed_id! {
    /// Index of a scheduled departure within its transit route.
    pub struct DepartureId(u32);
}
