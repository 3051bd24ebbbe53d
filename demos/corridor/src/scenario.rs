//! Synthetic commuter corridor: a western suburb, a river bridge with a
//! slower northern bypass, and downtown.
//!
//! ```text
//!                    north
//!                   /     \
//! west ──── bridge_w ═════ bridge_e ──── downtown
//! ```

use qs_core::{Coord, LinkId, TransportMode};
use qs_network::{LinkAttrs, Network, NetworkBuilder};
use qs_population::{Activity, Leg, Person, Plan, Population, Route, TransitPassengerRoute};
use qs_transit::{RouteStop, TransitSchedule, VehicleType};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Links the scenario refers to by name.
pub struct Corridor {
    /// West suburb towards the bridge, and back.
    pub west_in:      LinkId,
    pub west_out:     LinkId,
    pub bridge:       LinkId,
    pub downtown_in:  LinkId,
    pub downtown_out: LinkId,
}

pub fn build_network() -> anyhow::Result<(Network, Corridor)> {
    let mut b = NetworkBuilder::new();

    let west     = b.add_node(Coord::new(0.0, 0.0));
    let bridge_w = b.add_node(Coord::new(2_000.0, 0.0));
    let bridge_e = b.add_node(Coord::new(2_600.0, 0.0));
    let north    = b.add_node(Coord::new(2_300.0, 900.0));
    let downtown = b.add_node(Coord::new(4_600.0, 0.0));

    // ~50 km/h arterials, a one-lane bridge and a 30 km/h bypass.
    let (west_in, west_out) = b.add_road(west, bridge_w, LinkAttrs::new(2_000.0, 13.9, 1_800.0, 2.0));
    let (bridge, _) = b.add_road(bridge_w, bridge_e, LinkAttrs::new(600.0, 13.9, 900.0, 1.0));
    b.add_road(bridge_w, north, LinkAttrs::new(950.0, 8.3, 600.0, 1.0));
    b.add_road(north, bridge_e, LinkAttrs::new(950.0, 8.3, 600.0, 1.0));
    let (downtown_in, downtown_out) = b.add_road(bridge_e, downtown, LinkAttrs::new(2_000.0, 13.9, 1_800.0, 2.0));

    let net = b.build()?;
    Ok((net, Corridor { west_in, west_out, bridge, downtown_in, downtown_out }))
}

/// Line 1: west → bridge → downtown every ten minutes from 06:00 to 10:00.
pub fn build_schedule(c: &Corridor) -> anyhow::Result<(TransitSchedule, TransitPassengerRoute)> {
    let mut s = TransitSchedule::new();
    let west = s.add_stop("West", c.west_in, Coord::new(1_900.0, 0.0));
    let bridge = s.add_stop("Bridge", c.bridge, Coord::new(2_550.0, 0.0));
    let downtown = s.add_stop("Downtown", c.downtown_in, Coord::new(4_500.0, 0.0));

    let bus = s.add_vehicle_type(VehicleType::bus(60));
    let line = s.add_line("1");
    let route = s.add_route(
        line,
        vec![c.west_in, c.bridge, c.downtown_in],
        vec![
            RouteStop::new(west, 0.0, 0.0),
            RouteStop::new(bridge, 120.0, 130.0),
            RouteStop::new(downtown, 330.0, 330.0),
        ],
    )?;
    for dep in (6 * 3_600..10 * 3_600).step_by(600) {
        s.add_departure(route, dep, bus);
    }

    let trip = TransitPassengerRoute { access_stop: west, egress_stop: downtown, line, route };
    Ok((s, trip))
}

/// Car commuters, bus riders into town and downtown residents walking to
/// lunch.  Departure times are jittered with a seeded RNG.
pub fn build_population(c: &Corridor, trip: &TransitPassengerRoute, sizes: [usize; 3], seed: u64) -> Population {
    let [drivers, riders, walkers] = sizes;
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut pop = Population::new();

    for _ in 0..drivers {
        let leave = 7 * 3_600 + rng.gen_range(0..3_600);
        pop.push(Person::new(
            Plan::new()
                .activity(Activity::on_link("home", c.west_out).ending_at(leave))
                .leg(Leg::new(TransportMode::Car))
                .activity(Activity::on_link("work", c.downtown_in).lasting(8 * 3_600 + rng.gen_range(0..1_800)))
                .leg(Leg::new(TransportMode::Car))
                .activity(Activity::on_link("home", c.west_out)),
        ));
    }

    for _ in 0..riders {
        let leave = 6 * 3_600 + 900 + rng.gen_range(0..7_200);
        pop.push(Person::new(
            Plan::new()
                .activity(Activity::on_link("home", c.west_in).ending_at(leave))
                .leg(Leg::with_route(TransportMode::Pt, Route::Transit(*trip)))
                .activity(Activity::on_link("work", c.downtown_in)),
        ));
    }

    for _ in 0..walkers {
        let home = Coord::new(rng.gen_range(4_200.0..4_800.0), rng.gen_range(-200.0..200.0));
        pop.push(Person::new(
            Plan::new()
                .activity(Activity::at_coord("home", home).ending_at(12 * 3_600 + rng.gen_range(0..1_800)))
                .leg(Leg::new(TransportMode::Walk))
                .activity(Activity::on_link("lunch", c.downtown_out).lasting(2_700))
                .leg(Leg::new(TransportMode::Walk))
                .activity(Activity::at_coord("home", home)),
        ));
    }
    pop
}
