//! Unit tests for qs-traffic.

#[cfg(test)]
mod helpers {
    use std::sync::Arc;

    use qs_core::{AgentId, Coord, DepartureId, LineId, LinkId, StopId, TransitRouteId, TransportMode, VehicleId};
    use qs_network::{LinkAttrs, Network, NetworkBuilder};

    use crate::{PrivateVehicle, StopRef, TransitVehicle, Vehicle};

    /// Straight corridor `n0 → n1 → n2 → n3`.  The outer links are 100 m at
    /// 10 m/s with 3600 veh/h; the middle link is configurable.
    pub fn corridor(mid_length_m: f64, mid_capacity: f64) -> (Network, [LinkId; 3]) {
        let mut b = NetworkBuilder::new();
        let n: Vec<_> = (0..4).map(|i| b.add_node(Coord::new(i as f64 * 100.0, 0.0))).collect();
        let l0 = b.add_link(n[0], n[1], LinkAttrs::new(100.0, 10.0, 3_600.0, 1.0));
        let l1 = b.add_link(n[1], n[2], LinkAttrs::new(mid_length_m, 10.0, mid_capacity, 1.0));
        let l2 = b.add_link(n[2], n[3], LinkAttrs::new(100.0, 10.0, 3_600.0, 1.0));
        (b.build().unwrap(), [l0, l1, l2])
    }

    pub fn car(id: u32, route: &[LinkId], pce: f64) -> Vehicle {
        Vehicle::Private(PrivateVehicle {
            id:            VehicleId(id),
            driver:        AgentId(id),
            mode:          TransportMode::Car,
            pce,
            max_speed_mps: None,
            route:         Arc::from(route),
            route_index:   0,
        })
    }

    pub fn bus(id: u32, route: &[LinkId], stop_links: &[LinkId]) -> Vehicle {
        let stops: Vec<StopRef> = stop_links
            .iter()
            .enumerate()
            .map(|(i, &link)| StopRef {
                stop: StopId(i as u32),
                link,
                arrival_offset_secs: 0.0,
                departure_offset_secs: 0.0,
                await_departure: false,
            })
            .collect();
        Vehicle::Transit(Box::new(TransitVehicle {
            id:                VehicleId(id),
            driver:            AgentId(100 + id),
            pce:               1.0,
            route:             Arc::from(route),
            route_index:       0,
            line:              LineId(0),
            transit_route:     TransitRouteId(0),
            departure:         DepartureId(0),
            departure_secs:    0,
            stops:             Arc::from(stops),
            next_stop:         0,
            serving_stop:      None,
            last_handled_stop: None,
            denied:            Vec::new(),
            capacity:          50,
            passengers:        Vec::new(),
        }))
    }
}

// ── FlowCapacity ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod flow {
    use qs_core::Tick;
    use crate::FlowCapacity;

    #[test]
    fn starts_full_and_refills_fractionally() {
        let mut f = FlowCapacity::new(0.25);
        assert!(f.can_release());
        f.consume(1.0);
        assert!(!f.can_release());
        f.replenish(Tick(1));
        assert_eq!(f.accumulator(), 0.25);
        f.replenish(Tick(4));
        assert_eq!(f.accumulator(), 1.0);
        assert!(f.can_release());
    }

    #[test]
    fn idle_link_does_not_bank_capacity() {
        let mut f = FlowCapacity::new(0.25);
        f.replenish(Tick(1_000));
        assert_eq!(f.accumulator(), 1.0);
        f.consume(1.0);
        f.replenish(Tick(5_000));
        assert_eq!(f.accumulator(), 1.0);
    }

    #[test]
    fn large_vehicle_is_repaid_by_later_ticks() {
        let mut f = FlowCapacity::new(0.5);
        f.consume(2.5);
        assert_eq!(f.accumulator(), -1.5);
        f.replenish(Tick(4));
        assert!(!f.can_release());
        f.replenish(Tick(5));
        assert!(f.can_release());
    }

    #[test]
    fn burst_is_at_least_per_tick() {
        let mut f = FlowCapacity::new(2.5);
        assert_eq!(f.accumulator(), 2.5);
        f.consume(1.0);
        f.consume(1.0);
        assert!(!f.can_release());
        f.replenish(Tick(1));
        assert_eq!(f.accumulator(), 3.0);
    }
}

// ── Storage ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod storage {
    use crate::Storage;

    #[test]
    fn consume_and_release() {
        let mut s = Storage::new(2.0);
        assert!(s.has_space(1.0));
        s.consume(1.0);
        s.consume(1.0);
        assert!(!s.has_space(0.5));
        s.release(1.0);
        assert!(s.has_space(0.5));
        assert_eq!(s.occupants(), 1);
    }

    #[test]
    fn oversized_vehicle_fits_on_empty_link_only() {
        let mut s = Storage::new(1.0);
        assert!(s.has_space(3.0));
        s.consume(3.0);
        assert!(s.within_capacity());
        assert!(!s.has_space(0.1));
        s.release(3.0);
        assert_eq!(s.used(), 0.0);
    }
}

// ── LinkQueue ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod link_queue {
    use qs_core::{Tick, VehicleId};
    use qs_events::EventKind;

    use super::helpers::{bus, car, corridor};
    use crate::{LinkQueue, Movable, Origin, QueueConfig, Vehicle};

    #[test]
    fn derived_capacities() {
        // 7.5 m middle link at 900 veh/h: 0.25 veh/tick, one cell.
        let (net, [l0, l1, _]) = corridor(7.5, 900.0);
        let q0 = LinkQueue::new(l0, &net, &QueueConfig::default());
        assert_eq!(q0.flow_per_tick(), 1.0);
        assert_eq!(q0.buffer_capacity(), 1);
        // 100 m / 7.5 m = 13.3 cells; free flow 10 ticks × 1 veh/tick = 10.
        assert!((q0.storage_capacity() - 100.0 / 7.5).abs() < 1e-9);

        let q1 = LinkQueue::new(l1, &net, &QueueConfig::default());
        assert_eq!(q1.buffer_capacity(), 1);
        assert_eq!(q1.storage_capacity(), 1.0);
    }

    #[test]
    fn storage_raised_to_sustain_flow() {
        // 10 m link, 1 s free flow, 7200 veh/h = 2 veh/tick.
        let (net, [_, l1, _]) = corridor(10.0, 7_200.0);
        let q = LinkQueue::new(l1, &net, &QueueConfig::default());
        assert_eq!(q.buffer_capacity(), 2);
        assert_eq!(q.storage_capacity(), 2.0);
    }

    #[test]
    fn traversal_respects_vehicle_speed() {
        let (net, [l0, ..]) = corridor(100.0, 3_600.0);
        let q = LinkQueue::new(l0, &net, &QueueConfig::default());
        let mut v = car(0, &[l0], 1.0);
        assert_eq!(q.traversal_ticks(&v), 10);
        if let Vehicle::Private(p) = &mut v {
            p.max_speed_mps = Some(5.0);
        }
        assert_eq!(q.traversal_ticks(&v), 20);
    }

    #[test]
    fn vehicle_reaches_buffer_after_free_flow_time() {
        let (net, [l0, l1, _]) = corridor(100.0, 3_600.0);
        let mut q = LinkQueue::new(l0, &net, &QueueConfig::default());
        q.arrive_from_upstream(car(0, &[l0, l1], 1.0), Tick(0)).unwrap();
        assert_eq!(q.occupied_storage(), 1.0);

        let mut events = Vec::new();
        assert!(q.advance(Tick(9), &mut events).is_empty());
        assert_eq!(q.buffer_len(), 0);
        q.advance(Tick(10), &mut events);
        assert_eq!(q.buffer_len(), 1);
        assert_eq!(q.occupied_storage(), 0.0);
        assert!(events.is_empty());
    }

    #[test]
    fn buffer_preserves_entry_order() {
        let (net, [l0, l1, _]) = corridor(100.0, 3_600.0);
        let mut q = LinkQueue::new(l0, &net, &QueueConfig::default());
        let mut events = Vec::new();
        let mut exits = Vec::new();
        for t in 0..30u64 {
            if t < 8 {
                q.arrive_from_upstream(car(t as u32, &[l0, l1], 1.0), Tick(t)).unwrap();
            }
            q.advance(Tick(t), &mut events);
            if let Some(v) = q.pop_buffer() {
                exits.push(v.id());
            }
        }
        let expected: Vec<_> = (0..8).map(VehicleId).collect();
        assert_eq!(exits, expected);
    }

    #[test]
    fn flow_limits_outflow_with_carry_over() {
        // 900 veh/h = 0.25 per tick: one exit every 4 ticks.
        let (net, [l0, l1, _]) = corridor(100.0, 900.0);
        let mut q = LinkQueue::new(l1, &net, &QueueConfig::default());
        for i in 0..40 {
            q.add_waiting(car(i, &[l1, l0], 1.0));
        }
        let mut events = Vec::new();
        let mut exits = 0;
        for t in 1..=100u64 {
            q.advance(Tick(t), &mut events);
            while q.pop_buffer().is_some() {
                exits += 1;
            }
        }
        assert_eq!(exits, 25);
        let entered = events
            .iter()
            .filter(|e| matches!(e.kind, EventKind::VehicleEntersTraffic { .. }))
            .count();
        assert_eq!(entered, 25);
        assert_eq!(q.waiting_len(), 15);
    }

    #[test]
    fn full_buffer_blocks_queue() {
        let (net, [l0, l1, _]) = corridor(100.0, 3_600.0);
        let mut q = LinkQueue::new(l0, &net, &QueueConfig::default());
        q.arrive_from_upstream(car(0, &[l0, l1], 1.0), Tick(0)).unwrap();
        q.arrive_from_upstream(car(1, &[l0, l1], 1.0), Tick(0)).unwrap();
        let mut events = Vec::new();
        q.advance(Tick(10), &mut events);
        q.advance(Tick(11), &mut events);
        assert_eq!(q.buffer_len(), 1);
        assert_eq!(q.queue_len(), 1);
        q.pop_buffer();
        q.advance(Tick(12), &mut events);
        assert_eq!(q.peek_buffer().map(|v| v.id()), Some(VehicleId(1)));
    }

    #[test]
    fn arrival_on_last_link_bypasses_buffer() {
        let (net, [l0, l1, _]) = corridor(100.0, 3_600.0);
        let mut q = LinkQueue::new(l1, &net, &QueueConfig::default());
        let mut v = car(0, &[l0, l1], 1.0);
        v.advance_route();
        q.arrive_from_upstream(v, Tick(0)).unwrap();

        let mut events = Vec::new();
        let arrived = q.advance(Tick(10), &mut events);
        assert_eq!(arrived.len(), 1);
        assert_eq!(q.buffer_len(), 0);
        assert_eq!(q.occupied_storage(), 0.0);
        assert!(matches!(events[0].kind, EventKind::VehicleLeavesTraffic { .. }));
        assert!(!q.is_active());
    }

    #[test]
    fn entry_refused_when_full() {
        let (net, [l0, l1, l2]) = corridor(7.5, 3_600.0);
        let mut q = LinkQueue::new(l1, &net, &QueueConfig::default());
        let mut v = car(0, &[l0, l1, l2], 1.0);
        v.advance_route();
        q.arrive_from_upstream(v, Tick(0)).unwrap();
        assert!(!q.has_space(1.0));
        let refused = q.arrive_from_upstream(car(1, &[l1, l2], 1.0), Tick(0));
        assert!(matches!(refused, Err(v) if v.id() == VehicleId(1)));
    }

    #[test]
    fn transit_vehicle_holds_at_stop_then_departs() {
        let (net, [l0, l1, _]) = corridor(100.0, 3_600.0);
        let mut q = LinkQueue::new(l0, &net, &QueueConfig::default());
        q.add_waiting(bus(0, &[l0, l1], &[l0, l1]));

        let mut events = Vec::new();
        q.advance(Tick(1), &mut events);
        assert_eq!(q.held_len(), 1);
        assert_eq!(q.buffer_len(), 0);
        assert!(events.is_empty());

        let mut due = q.take_due_stops(Tick(1));
        assert_eq!(due.len(), 1);
        let mut held = due.remove(0);
        assert_eq!(held.origin, Origin::Waiting);
        if let Some(t) = held.vehicle.as_transit_mut() {
            t.next_stop += 1;
        }
        q.release_from_stop(held.vehicle, held.origin);
        q.advance(Tick(2), &mut events);
        assert_eq!(q.buffer_len(), 1);
        assert!(matches!(events[0].kind, EventKind::VehicleEntersTraffic { .. }));
    }

    #[test]
    fn held_vehicle_not_due_stays() {
        let (net, [l0, l1, _]) = corridor(100.0, 3_600.0);
        let mut q = LinkQueue::new(l0, &net, &QueueConfig::default());
        q.hold(bus(0, &[l0, l1], &[l0]), Origin::Waiting, Tick(5));
        assert!(q.take_due_stops(Tick(4)).is_empty());
        assert_eq!(q.take_due_stops(Tick(5)).len(), 1);
    }

    #[test]
    fn drain_returns_everything() {
        let (net, [l0, l1, _]) = corridor(100.0, 3_600.0);
        let mut q = LinkQueue::new(l0, &net, &QueueConfig::default());
        q.arrive_from_upstream(car(0, &[l0, l1], 1.0), Tick(0)).unwrap();
        q.add_waiting(car(1, &[l0, l1], 1.0));
        q.hold(bus(2, &[l0, l1], &[l0]), Origin::Queue, Tick(9));
        assert_eq!(q.vehicle_count(), 3);
        assert_eq!(q.drain().len(), 3);
        assert!(!q.is_active());
        assert_eq!(q.occupied_storage(), 0.0);
    }
}

// ── Randomized storage invariant ─────────────────────────────────────────────

#[cfg(test)]
mod storage_property {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use qs_core::Tick;

    use super::helpers::{car, corridor};
    use crate::{LinkQueue, Movable, QueueConfig};

    #[test]
    fn occupied_storage_never_exceeds_capacity() {
        let (net, [l0, l1, l2]) = corridor(30.0, 1_800.0);
        let mut q = LinkQueue::new(l1, &net, &QueueConfig::default());
        let mut rng = SmallRng::seed_from_u64(0x5eed);
        let sizes = [0.5, 1.0, 2.5];
        let mut events = Vec::new();
        let mut next_id = 0;

        for t in 0..2_000u64 {
            let now = Tick(t);
            for _ in 0..rng.gen_range(0..3) {
                let mut v = car(next_id, &[l0, l1, l2], sizes[rng.gen_range(0..sizes.len())]);
                v.advance_route();
                next_id += 1;
                let _ = q.arrive_from_upstream(v, now);
                q.check_storage().unwrap();
            }
            q.advance(now, &mut events);
            assert!(q.buffer_len() <= q.buffer_capacity());
            if rng.gen_bool(0.6) {
                q.pop_buffer();
            }
            q.check_storage().unwrap();
        }
        assert!(next_id > 1_000);
    }

    #[test]
    fn buffer_order_follows_entry_order_per_source() {
        // 900 veh/h = 0.25 per tick on a 30 m link: queues build up.
        let (net, [l0, l1, l2]) = corridor(30.0, 900.0);
        let mut q = LinkQueue::new(l1, &net, &QueueConfig::default());
        let mut rng = SmallRng::seed_from_u64(0xf1f0);
        let mut events = Vec::new();
        let mut upstream = Vec::new();
        let mut starting = Vec::new();
        let mut exits = Vec::new();

        for t in 0..1_500u64 {
            let now = Tick(t);
            if t < 300 {
                if rng.gen_bool(0.3) {
                    let mut v = car(upstream.len() as u32, &[l0, l1, l2], 1.0);
                    v.advance_route();
                    let id = v.id();
                    if q.arrive_from_upstream(v, now).is_ok() {
                        upstream.push(id);
                    }
                }
                if rng.gen_bool(0.1) {
                    let v = car(10_000 + starting.len() as u32, &[l1, l2], 1.0);
                    starting.push(v.id());
                    q.add_waiting(v);
                }
            }
            assert!(q.advance(now, &mut events).is_empty());
            while rng.gen_bool(0.5) {
                match q.pop_buffer() {
                    Some(v) => exits.push(v.id()),
                    None => break,
                }
            }
        }

        assert_eq!(q.vehicle_count(), 0);
        assert!(upstream.len() > 20 && starting.len() > 10);
        let from_upstream: Vec<_> = exits.iter().copied().filter(|id| id.0 < 10_000).collect();
        let from_waiting: Vec<_> = exits.iter().copied().filter(|id| id.0 >= 10_000).collect();
        assert_eq!(from_upstream, upstream);
        assert_eq!(from_waiting, starting);
    }
}

// ── Node mover ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod node_mover {
    use qs_core::{NodeId, Tick, VehicleId};
    use qs_events::{AbortReason, EventKind};

    use super::helpers::{car, corridor};
    use crate::{LinkQueue, Movable, QueueConfig, move_node};

    #[test]
    fn moves_buffer_head_downstream() {
        let (net, [l0, l1, l2]) = corridor(100.0, 3_600.0);
        let mut links = LinkQueue::for_network(&net, &QueueConfig::default());
        let mut events = Vec::new();
        let mut removed = Vec::new();

        links[l0.index()].add_waiting(car(0, &[l0, l1, l2], 1.0));
        links[l0.index()].advance(Tick(1), &mut events);
        events.clear();

        let moved = move_node(NodeId(1), &net, &mut links, Tick(1), None, &mut events, &mut removed).unwrap();
        assert_eq!(moved, 1);
        assert!(removed.is_empty());
        assert_eq!(links[l1.index()].queue_len(), 1);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0].kind, EventKind::LinkLeave { link, .. } if link == l0));
        assert!(matches!(events[1].kind, EventKind::LinkEnter { link, .. } if link == l1));
    }

    #[test]
    fn full_downstream_link_spills_back() {
        let (net, [l0, l1, l2]) = corridor(7.5, 3_600.0);
        let mut links = LinkQueue::for_network(&net, &QueueConfig::default());
        let mut events = Vec::new();
        let mut removed = Vec::new();

        // Occupy the single cell of l1.
        links[l1.index()].arrive_from_upstream(car(9, &[l1, l2], 1.0), Tick(0)).unwrap();

        links[l0.index()].add_waiting(car(0, &[l0, l1, l2], 1.0));
        links[l0.index()].add_waiting(car(1, &[l0, l1, l2], 1.0));
        links[l0.index()].advance(Tick(1), &mut events);

        let moved = move_node(NodeId(1), &net, &mut links, Tick(1), None, &mut events, &mut removed).unwrap();
        assert_eq!(moved, 0);
        assert_eq!(links[l0.index()].buffer_head_blocked_since(), Some(Tick(1)));
        assert_eq!(links[l0.index()].peek_buffer().map(|v| v.id()), Some(VehicleId(0)));
        assert_eq!(links[l0.index()].waiting_len(), 1);
    }

    #[test]
    fn stuck_vehicle_removed_after_threshold() {
        let (net, [l0, l1, l2]) = corridor(7.5, 3_600.0);
        let mut links = LinkQueue::for_network(&net, &QueueConfig::default());
        let mut events = Vec::new();
        let mut removed = Vec::new();

        links[l1.index()].arrive_from_upstream(car(9, &[l1, l2], 1.0), Tick(0)).unwrap();
        links[l0.index()].add_waiting(car(0, &[l0, l1, l2], 1.0));
        links[l0.index()].advance(Tick(1), &mut events);

        for t in 1..4 {
            move_node(NodeId(1), &net, &mut links, Tick(t), Some(3), &mut events, &mut removed).unwrap();
            assert!(removed.is_empty());
        }
        move_node(NodeId(1), &net, &mut links, Tick(4), Some(3), &mut events, &mut removed).unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].reason, AbortReason::Stuck);
        assert_eq!(removed[0].link, l0);
        assert_eq!(links[l0.index()].buffer_len(), 0);
    }

    #[test]
    fn inconsistent_route_removes_vehicle() {
        let (net, [l0, _, l2]) = corridor(100.0, 3_600.0);
        let mut links = LinkQueue::for_network(&net, &QueueConfig::default());
        let mut events = Vec::new();
        let mut removed = Vec::new();

        // l2 does not leave n1.
        links[l0.index()].add_waiting(car(0, &[l0, l2], 1.0));
        links[l0.index()].advance(Tick(1), &mut events);
        move_node(NodeId(1), &net, &mut links, Tick(1), None, &mut events, &mut removed).unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].reason, AbortReason::RouteInconsistent);
        assert_eq!(links[l2.index()].vehicle_count(), 0);
    }
}
