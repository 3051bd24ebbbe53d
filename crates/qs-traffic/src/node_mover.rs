//! Moving vehicles across a node.

use qs_core::{LinkId, NodeId, Tick};
use qs_events::{AbortReason, Event, EventKind};
use qs_network::Network;

use crate::{LinkQueue, Movable, TrafficError, TrafficResult, Vehicle};

/// A vehicle taken off the network by the node mover.  Its driver and
/// passengers must be aborted by the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct RemovedVehicle {
    pub vehicle: Vehicle,
    /// Link whose buffer it was removed from.
    pub link:    LinkId,
    pub reason:  AbortReason,
}

/// Serve every incoming link of `node` for tick `now`.
///
/// Incoming links are visited in ascending `LinkId` order.  Each buffer is
/// emptied head first until a vehicle cannot enter its next link, which
/// leaves that vehicle and everyone behind it in place.  With
/// `stuck_threshold` set, a head blocked for that many ticks is removed
/// instead.
///
/// Returns the number of vehicles that crossed the node.
pub fn move_node(
    node:            NodeId,
    network:         &Network,
    links:           &mut [LinkQueue],
    now:             Tick,
    stuck_threshold: Option<u64>,
    events:          &mut Vec<Event>,
    removed:         &mut Vec<RemovedVehicle>,
) -> TrafficResult<usize> {
    let mut moved = 0;
    for &in_link in network.in_links(node) {
        loop {
            let (pce, next) = match links[in_link.index()].peek_buffer() {
                Some(head) => (head.pce(), head.next_link()),
                None => break,
            };

            let next = match next {
                Some(next) if network.contains_link(next) && network.link_from[next.index()] == node => next,
                _ => {
                    if let Some(vehicle) = links[in_link.index()].pop_buffer() {
                        log::warn!(
                            "{now}: vehicle {} cannot continue from {in_link} (next {next:?})",
                            vehicle.id()
                        );
                        removed.push(RemovedVehicle {
                            vehicle,
                            link: in_link,
                            reason: AbortReason::RouteInconsistent,
                        });
                    }
                    continue;
                }
            };

            if !links[next.index()].has_space(pce) {
                let queue = &mut links[in_link.index()];
                queue.mark_blocked(now);
                match stuck_threshold {
                    Some(limit) if queue.blocked_for(now) >= limit => {
                        if let Some(vehicle) = queue.pop_buffer() {
                            log::warn!("{now}: vehicle {} stuck on {in_link}, removed", vehicle.id());
                            removed.push(RemovedVehicle { vehicle, link: in_link, reason: AbortReason::Stuck });
                        }
                        continue;
                    }
                    _ => break,
                }
            }

            let Some(mut vehicle) = links[in_link.index()].pop_buffer() else { break };
            let id = vehicle.id();
            events.push(Event::new(now, EventKind::LinkLeave { vehicle: id, link: in_link }));
            vehicle.advance_route();
            events.push(Event::new(now, EventKind::LinkEnter { vehicle: id, link: next }));

            let downstream = &mut links[next.index()];
            downstream
                .arrive_from_upstream(vehicle, now)
                .map_err(|_| TrafficError::AdmissionRefused { link: next, vehicle: id })?;
            downstream.check_storage()?;
            moved += 1;
        }
    }
    Ok(moved)
}
