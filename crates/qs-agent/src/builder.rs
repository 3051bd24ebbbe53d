//! Fluent construction of an [`AgentStore`].
//!
//! ```rust
//! use qs_agent::AgentStoreBuilder;
//! use qs_core::AgentId;
//!
//! let store = AgentStoreBuilder::new(3).transit_drivers(2).build();
//! assert_eq!(store.count, 5);
//! assert!(store.is_driver(AgentId(3)));
//! ```

use qs_core::{AgentId, LinkId};

use crate::AgentStore;

pub struct AgentStoreBuilder {
    persons:     usize,
    drivers:     usize,
    start_links: Vec<LinkId>,
}

impl AgentStoreBuilder {
    pub fn new(persons: usize) -> Self {
        Self { persons, drivers: 0, start_links: Vec::new() }
    }

    /// Reserve ids for `n` synthetic transit drivers after the persons.
    pub fn transit_drivers(mut self, n: usize) -> Self {
        self.drivers = n;
        self
    }

    /// Place persons on the link of their first activity.  Missing entries
    /// stay `LinkId::INVALID`.
    pub fn start_links(mut self, links: Vec<LinkId>) -> Self {
        self.start_links = links;
        self
    }

    pub fn build(self) -> AgentStore {
        let mut store = AgentStore::new(self.persons, self.drivers);
        for (i, link) in self.start_links.into_iter().take(self.persons).enumerate() {
            store.link[AgentId(i as u32).index()] = link;
        }
        store
    }
}
