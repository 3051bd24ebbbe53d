//! Travel modes.
//!
//! Which modes run on the network and which are teleported is decided by
//! `SimConfig::network_modes`, not by the enum itself.  `Pt` always means a
//! passenger riding scheduled transit.

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransportMode {
    #[default]
    Car,
    Truck,
    Bike,
    Walk,
    /// Passenger on a scheduled transit vehicle.
    Pt,
    /// Walking to, from, or between transit stops.
    TransitWalk,
    /// Driving a scheduled transit vehicle.  Used by synthetic drivers only.
    TransitDriver,
}

impl TransportMode {
    /// Label used in event output.
    pub fn as_str(self) -> &'static str {
        match self {
            TransportMode::Car           => "car",
            TransportMode::Truck         => "truck",
            TransportMode::Bike          => "bike",
            TransportMode::Walk          => "walk",
            TransportMode::Pt            => "pt",
            TransportMode::TransitWalk   => "transit_walk",
            TransportMode::TransitDriver => "transit_driver",
        }
    }
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
