//! Per-link queue state.
//!
//! Every link owns the vehicles currently on it, spread over five places:
//!
//! | Place      | Holds                                                  | Storage |
//! |------------|--------------------------------------------------------|---------|
//! | queue      | vehicles that entered from upstream, FIFO              | yes     |
//! | waiting    | vehicles starting a leg here, placed at the link end   | no      |
//! | held       | transit vehicles dwelling at a stop on this link       | kept    |
//! | departing  | transit vehicles that finished their dwell             | kept    |
//! | buffer     | vehicles ready to cross the downstream node            | no      |
//!
//! Storage is taken on entry from upstream and given back when the vehicle
//! moves into the buffer or finishes its trip on this link.

use std::collections::VecDeque;

use qs_core::{LinkId, PCE_EPSILON, Tick};
use qs_events::{Event, EventKind};
use qs_network::Network;

use crate::{FlowCapacity, Movable, QueueConfig, Storage, TrafficError, TrafficResult, Vehicle};

/// Where a vehicle came from before it stopped at a transit stop, which
/// decides whether it still holds storage.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Origin {
    Queue,
    Waiting,
}

/// A transit vehicle parked at a stop.
#[derive(Clone, Debug, PartialEq)]
pub struct HeldVehicle {
    pub vehicle:   Vehicle,
    pub origin:    Origin,
    /// First tick at which the stop handler looks at it again.
    pub resume_at: Tick,
}

#[derive(Clone, Debug, PartialEq)]
struct Queued {
    vehicle:   Vehicle,
    exit_tick: Tick,
}

#[derive(Clone, Debug)]
pub struct LinkQueue {
    link:            LinkId,
    length_m:        f64,
    freespeed_mps:   f64,
    tick_secs:       f64,
    buffer_capacity: usize,

    flow:    FlowCapacity,
    storage: Storage,

    queue:     VecDeque<Queued>,
    waiting:   VecDeque<Vehicle>,
    held:      Vec<HeldVehicle>,
    departing: VecDeque<(Vehicle, Origin)>,
    buffer:    VecDeque<Vehicle>,

    blocked_since: Option<Tick>,
}

impl LinkQueue {
    /// Derive flow, buffer and storage capacity of `link` from the network.
    pub fn new(link: LinkId, network: &Network, config: &QueueConfig) -> Self {
        let i = link.index();
        let length_m      = network.link_length_m[i];
        let freespeed_mps = network.link_freespeed_mps[i];
        let per_tick = network.capacity_per_sec(link) * config.tick_secs * config.flow_capacity_factor;

        let free_flow_ticks = (length_m / freespeed_mps / config.tick_secs).ceil();
        let capacity = (length_m * network.link_lanes[i] / config.effective_cell_size_m
            * config.storage_capacity_factor)
            .max(per_tick.ceil())
            .max(free_flow_ticks * per_tick)
            .max(1.0);

        Self {
            link,
            length_m,
            freespeed_mps,
            tick_secs: config.tick_secs,
            buffer_capacity: (per_tick.ceil() as usize).max(1),
            flow: FlowCapacity::new(per_tick),
            storage: Storage::new(capacity),
            queue: VecDeque::new(),
            waiting: VecDeque::new(),
            held: Vec::new(),
            departing: VecDeque::new(),
            buffer: VecDeque::new(),
            blocked_since: None,
        }
    }

    /// One queue per network link, indexed by `LinkId`.
    pub fn for_network(network: &Network, config: &QueueConfig) -> Vec<LinkQueue> {
        (0..network.link_count())
            .map(|i| LinkQueue::new(LinkId(i as u32), network, config))
            .collect()
    }

    // ── Entry ─────────────────────────────────────────────────────────────

    #[inline]
    pub fn has_space(&self, pce: f64) -> bool {
        self.storage.has_space(pce)
    }

    /// Ticks a vehicle needs to traverse this link, at least one.
    pub fn traversal_ticks(&self, vehicle: &Vehicle) -> u64 {
        let speed = match vehicle.max_speed_mps() {
            Some(max) => self.freespeed_mps.min(max),
            None => self.freespeed_mps,
        };
        ((self.length_m / speed / self.tick_secs).ceil() as u64).max(1)
    }

    /// Append `vehicle` at the tail of the queue, or hand it back if the
    /// link has no room for it.
    pub fn arrive_from_upstream(&mut self, vehicle: Vehicle, now: Tick) -> Result<(), Vehicle> {
        if !self.has_space(vehicle.pce()) {
            return Err(vehicle);
        }
        self.storage.consume(vehicle.pce());
        let exit_tick = now + self.traversal_ticks(&vehicle);
        self.queue.push_back(Queued { vehicle, exit_tick });
        Ok(())
    }

    /// Put a vehicle that starts its trip here on the waiting list.
    pub fn add_waiting(&mut self, vehicle: Vehicle) {
        self.waiting.push_back(vehicle);
    }

    // ── Advance ───────────────────────────────────────────────────────────

    /// Move vehicles towards the exit buffer for tick `now`.
    ///
    /// Vehicles leaving a stop go first, then the queue, then the waiting
    /// list, each in FIFO order until its head is blocked.  Returns the
    /// vehicles whose trip ends on this link.
    pub fn advance(&mut self, now: Tick, events: &mut Vec<Event>) -> Vec<Vehicle> {
        self.flow.replenish(now);
        let mut arrivals = Vec::new();

        while let Some((vehicle, origin)) = self.departing.pop_front() {
            if let Err(vehicle) = self.try_exit(vehicle, origin, now, events, &mut arrivals) {
                self.departing.push_front((vehicle, origin));
                break;
            }
        }

        while self.queue.front().is_some_and(|q| q.exit_tick <= now) {
            let Some(Queued { vehicle, exit_tick }) = self.queue.pop_front() else { break };
            if let Err(vehicle) = self.try_exit(vehicle, Origin::Queue, now, events, &mut arrivals) {
                self.queue.push_front(Queued { vehicle, exit_tick });
                break;
            }
        }

        while let Some(vehicle) = self.waiting.pop_front() {
            if let Err(vehicle) = self.try_exit(vehicle, Origin::Waiting, now, events, &mut arrivals) {
                self.waiting.push_front(vehicle);
                break;
            }
        }

        arrivals
    }

    fn try_exit(
        &mut self,
        vehicle:  Vehicle,
        origin:   Origin,
        now:      Tick,
        events:   &mut Vec<Event>,
        arrivals: &mut Vec<Vehicle>,
    ) -> Result<(), Vehicle> {
        if vehicle.stops_on(self.link) {
            self.held.push(HeldVehicle { vehicle, origin, resume_at: now });
            return Ok(());
        }

        if vehicle.is_on_last_link() {
            match origin {
                Origin::Queue => self.storage.release(vehicle.pce()),
                Origin::Waiting => events.push(self.enters_traffic(&vehicle, now)),
            }
            events.push(Event::new(now, EventKind::VehicleLeavesTraffic {
                agent:   vehicle.driver(),
                vehicle: vehicle.id(),
                link:    self.link,
                mode:    vehicle.mode(),
            }));
            arrivals.push(vehicle);
            return Ok(());
        }

        if self.buffer.len() >= self.buffer_capacity || !self.flow.can_release() {
            return Err(vehicle);
        }
        self.flow.consume(vehicle.pce());
        match origin {
            Origin::Queue => self.storage.release(vehicle.pce()),
            Origin::Waiting => events.push(self.enters_traffic(&vehicle, now)),
        }
        self.buffer.push_back(vehicle);
        Ok(())
    }

    fn enters_traffic(&self, vehicle: &Vehicle, now: Tick) -> Event {
        Event::new(now, EventKind::VehicleEntersTraffic {
            agent:   vehicle.driver(),
            vehicle: vehicle.id(),
            link:    self.link,
            mode:    vehicle.mode(),
        })
    }

    // ── Buffer ────────────────────────────────────────────────────────────

    #[inline]
    pub fn peek_buffer(&self) -> Option<&Vehicle> {
        self.buffer.front()
    }

    /// Remove the buffer head.  The next head starts with a clean blocked
    /// record.
    pub fn pop_buffer(&mut self) -> Option<Vehicle> {
        self.blocked_since = None;
        self.buffer.pop_front()
    }

    /// Record that the buffer head could not move at `now`.
    pub fn mark_blocked(&mut self, now: Tick) {
        self.blocked_since.get_or_insert(now);
    }

    #[inline]
    pub fn buffer_head_blocked_since(&self) -> Option<Tick> {
        self.blocked_since
    }

    /// Ticks the buffer head has been blocked, 0 if it is not.
    pub fn blocked_for(&self, now: Tick) -> u64 {
        self.blocked_since.map_or(0, |since| now.since(since))
    }

    // ── Transit stops ─────────────────────────────────────────────────────

    /// Remove and return every held vehicle due at or before `now`, in the
    /// order they stopped.
    pub fn take_due_stops(&mut self, now: Tick) -> Vec<HeldVehicle> {
        if self.held.is_empty() {
            return Vec::new();
        }
        let (due, keep): (Vec<_>, Vec<_>) = std::mem::take(&mut self.held)
            .into_iter()
            .partition(|h| h.resume_at <= now);
        self.held = keep;
        due
    }

    /// Park a transit vehicle at its stop until `resume_at`.
    pub fn hold(&mut self, vehicle: Vehicle, origin: Origin, resume_at: Tick) {
        self.held.push(HeldVehicle { vehicle, origin, resume_at });
    }

    /// A transit vehicle finished its dwell and rejoins traffic ahead of the
    /// queue on the next advance.
    pub fn release_from_stop(&mut self, vehicle: Vehicle, origin: Origin) {
        self.departing.push_back((vehicle, origin));
    }

    /// Give back the storage of a vehicle that leaves this link outside the
    /// normal flow (a transit vehicle removed at a stop).
    pub fn forget(&mut self, vehicle: &Vehicle, origin: Origin) {
        if origin == Origin::Queue {
            self.storage.release(vehicle.pce());
        }
    }

    // ── Checks and accessors ──────────────────────────────────────────────

    /// Fail if several vehicles together exceed the storage capacity.
    pub fn check_storage(&self) -> TrafficResult<()> {
        if self.storage.within_capacity() {
            Ok(())
        } else {
            Err(TrafficError::StorageOverflow {
                link:     self.link,
                used:     self.storage.used(),
                capacity: self.storage.capacity(),
            })
        }
    }

    /// Remove every vehicle still on the link, e.g. at the end of a run.
    pub fn drain(&mut self) -> Vec<Vehicle> {
        let mut out: Vec<Vehicle> = self.buffer.drain(..).collect();
        out.extend(self.departing.drain(..).map(|(v, _)| v));
        out.extend(self.held.drain(..).map(|h| h.vehicle));
        out.extend(self.queue.drain(..).map(|q| q.vehicle));
        out.extend(self.waiting.drain(..));
        self.storage = Storage::new(self.storage.capacity());
        self.blocked_since = None;
        out
    }

    #[inline] pub fn link(&self) -> LinkId { self.link }
    #[inline] pub fn occupied_storage(&self) -> f64 { self.storage.used() }
    #[inline] pub fn storage_capacity(&self) -> f64 { self.storage.capacity() }
    #[inline] pub fn buffer_capacity(&self) -> usize { self.buffer_capacity }
    #[inline] pub fn flow_per_tick(&self) -> f64 { self.flow.per_tick() }
    #[inline] pub fn flow_accumulator(&self) -> f64 { self.flow.accumulator() }
    #[inline] pub fn queue_len(&self) -> usize { self.queue.len() }
    #[inline] pub fn waiting_len(&self) -> usize { self.waiting.len() }
    #[inline] pub fn buffer_len(&self) -> usize { self.buffer.len() }
    #[inline] pub fn held_len(&self) -> usize { self.held.len() + self.departing.len() }

    pub fn vehicle_count(&self) -> usize {
        self.queue.len() + self.waiting.len() + self.buffer.len() + self.held_len()
    }

    /// `true` if any vehicle is on the link.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.vehicle_count() > 0
    }

    /// Fraction of storage in use, for snapshots.
    pub fn density(&self) -> f64 {
        if self.storage.capacity() <= PCE_EPSILON {
            0.0
        } else {
            self.storage.used() / self.storage.capacity()
        }
    }
}
