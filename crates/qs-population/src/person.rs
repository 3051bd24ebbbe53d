//! Persons and the population container.

use qs_core::AgentId;

use crate::{Plan, PopulationError, PopulationResult};

/// One simulated person with a fixed plan.
#[derive(Clone, Debug, PartialEq)]
pub struct Person {
    pub plan: Plan,
    /// Size of the person's private vehicle in vehicle-equivalents.
    pub vehicle_pce: f64,
    /// Top speed of the person's private vehicle, `None` for unlimited.
    pub vehicle_max_speed_mps: Option<f64>,
}

impl Person {
    pub fn new(plan: Plan) -> Self {
        Self { plan, vehicle_pce: 1.0, vehicle_max_speed_mps: None }
    }

    pub fn with_vehicle(mut self, pce: f64, max_speed_mps: Option<f64>) -> Self {
        self.vehicle_pce = pce;
        self.vehicle_max_speed_mps = max_speed_mps;
        self
    }
}

/// All persons, indexed by `AgentId`.
#[derive(Clone, Debug, Default)]
pub struct Population {
    pub persons: Vec<Person>,
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a person and return its id (sequential from 0).
    pub fn push(&mut self, person: Person) -> AgentId {
        let id = AgentId(self.persons.len() as u32);
        self.persons.push(person);
        id
    }

    pub fn len(&self) -> usize {
        self.persons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }

    pub fn get(&self, agent: AgentId) -> Option<&Person> {
        self.persons.get(agent.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = (AgentId, &Person)> {
        self.persons
            .iter()
            .enumerate()
            .map(|(i, p)| (AgentId(i as u32), p))
    }

    /// Check every plan's structure and vehicle size.
    pub fn validate(&self) -> PopulationResult<()> {
        for (agent, person) in self.iter() {
            person
                .plan
                .check_structure()
                .map_err(|reason| PopulationError::MalformedPlan { agent, reason })?;
            if !(person.vehicle_pce.is_finite() && person.vehicle_pce > 0.0) {
                return Err(PopulationError::MalformedPlan {
                    agent,
                    reason: "vehicle size must be positive",
                });
            }
        }
        Ok(())
    }
}
