//! Unit tests for qs-events.

#[cfg(test)]
mod helpers {
    use std::sync::Arc;

    use qs_core::{AgentId, LinkId, Tick, VehicleId};
    use crate::{Event, EventKind};

    pub fn enter(t: u64, v: u32, l: u32) -> Event {
        Event::new(Tick(t), EventKind::LinkEnter { vehicle: VehicleId(v), link: LinkId(l) })
    }

    pub fn act_end(t: u64, a: u32) -> Event {
        Event::new(
            Tick(t),
            EventKind::ActivityEnd { agent: AgentId(a), link: LinkId(0), act_type: Arc::from("home") },
        )
    }
}

// ── Event vocabulary ─────────────────────────────────────────────────────────

#[cfg(test)]
mod event {
    use qs_core::{AgentId, LinkId, StopId, Tick, TransportMode, VehicleId};
    use crate::{AbortReason, Event, EventKind};

    #[test]
    fn accessors() {
        let e = EventKind::VehicleEntersTraffic {
            agent:   AgentId(3),
            vehicle: VehicleId(7),
            link:    LinkId(2),
            mode:    TransportMode::Car,
        };
        assert_eq!(e.name(), "vehicle enters traffic");
        assert_eq!(e.agent(), Some(AgentId(3)));
        assert_eq!(e.vehicle(), Some(VehicleId(7)));
        assert_eq!(e.link(), Some(LinkId(2)));
        assert_eq!(e.stop(), None);

        let w = EventKind::WaitingForPt { agent: AgentId(1), stop: StopId(4), destination: StopId(5) };
        assert_eq!(w.stop(), Some(StopId(4)));
        assert_eq!(w.detail(), "destinationStop=5");
    }

    #[test]
    fn display_lists_ids_and_detail() {
        let e = Event::new(
            Tick(12),
            EventKind::AgentStuck {
                agent:  AgentId(0),
                link:   LinkId(1),
                mode:   Some(TransportMode::Car),
                reason: AbortReason::Stuck,
            },
        );
        assert_eq!(e.to_string(), "T12 stuckAndAbort agent=0 link=1 legMode=car;reason=stuck");
    }
}

// ── Dispatcher ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod manager {
    use std::sync::{Arc, Mutex};

    use super::helpers::{act_end, enter};
    use crate::{EventCollector, EventCounter, EventsManager};

    #[test]
    fn flush_sorts_by_time_and_keeps_production_order() {
        let collector = Arc::new(Mutex::new(EventCollector::new()));
        let mut em = EventsManager::new();
        em.add_handler(Arc::clone(&collector));

        em.process_event(enter(5, 0, 0));
        em.process_event(enter(3, 1, 0));
        em.process_event(enter(5, 2, 0));
        em.process_event(enter(3, 3, 0));
        assert_eq!(em.pending_len(), 4);
        assert_eq!(em.flush(), 4);
        assert_eq!(em.pending_len(), 0);

        let got = collector.lock().unwrap().events.clone();
        assert_eq!(got, vec![enter(3, 1, 0), enter(3, 3, 0), enter(5, 0, 0), enter(5, 2, 0)]);
    }

    #[test]
    fn every_handler_sees_every_event() {
        let a = Arc::new(Mutex::new(EventCounter::new()));
        let b = Arc::new(Mutex::new(EventCollector::new()));
        let mut em = EventsManager::new();
        em.add_handler(Arc::clone(&a));
        em.add_handler(Arc::clone(&b));
        assert_eq!(em.handler_count(), 2);

        em.extend([act_end(1, 0), enter(1, 0, 4), act_end(2, 1)]);
        em.flush();
        em.process_event(enter(3, 0, 5));
        em.flush();

        let counter = a.lock().unwrap();
        assert_eq!(counter.count("actend"), 2);
        assert_eq!(counter.count("entered link"), 2);
        assert_eq!(counter.count("arrival"), 0);
        assert_eq!(counter.total(), 4);
        assert_eq!(b.lock().unwrap().events.len(), 4);
        assert_eq!(em.delivered(), 4);
    }

    #[test]
    fn discard_drops_pending_only() {
        let collector = Arc::new(Mutex::new(EventCollector::new()));
        let mut em = EventsManager::new();
        em.add_handler(Arc::clone(&collector));
        em.process_event(enter(0, 0, 0));
        em.flush();
        em.process_event(enter(1, 0, 1));
        assert_eq!(em.discard_pending(), 1);
        assert_eq!(em.flush(), 0);
        assert_eq!(collector.lock().unwrap().events.len(), 1);
    }

    #[test]
    fn reset_clears_handlers() {
        let counter = Arc::new(Mutex::new(EventCounter::new()));
        let mut em = EventsManager::new();
        em.add_handler(Arc::clone(&counter));
        em.process_event(enter(0, 0, 0));
        em.flush();
        em.reset(1);
        assert_eq!(counter.lock().unwrap().total(), 0);
        assert_eq!(em.delivered(), 0);
    }
}
