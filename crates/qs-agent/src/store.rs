//! Structure-of-Arrays agent storage.

use qs_core::{AgentId, LinkId, VehicleId};

use crate::{AgentError, AgentResult, AgentState, LegStage};

/// State of every agent, indexed by `AgentId`.
///
/// Persons occupy ids `0..person_count`; transit drivers follow.  Every
/// `Vec` field has exactly `count` elements.
///
/// Fields are public for cheap reads; writes should go through the
/// transition methods, which keep `en_route` consistent and reject illegal
/// moves.
pub struct AgentStore {
    pub count:        usize,
    pub person_count: usize,

    pub state: Vec<AgentState>,

    /// Index of the current plan element.  Always 0 for drivers.
    pub element: Vec<usize>,

    /// Link of the current activity, or where the current leg started.
    pub link: Vec<LinkId>,

    /// The person's private vehicle.  Drivers get theirs from the
    /// transit engine.
    pub vehicle: Vec<VehicleId>,

    en_route: usize,
}

impl AgentStore {
    pub(crate) fn new(person_count: usize, driver_count: usize) -> Self {
        let count = person_count + driver_count;
        Self {
            count,
            person_count,
            state:   vec![AgentState::Activity; count],
            element: vec![0; count],
            link:    vec![LinkId::INVALID; count],
            vehicle: (0..count as u32).map(VehicleId).collect(),
            en_route: 0,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn agent_ids(&self) -> impl Iterator<Item = AgentId> + '_ {
        (0..self.count as u32).map(AgentId)
    }

    #[inline]
    pub fn is_driver(&self, agent: AgentId) -> bool {
        agent.index() >= self.person_count && agent.index() < self.count
    }

    /// Agents currently in `LEG`.
    #[inline]
    pub fn en_route(&self) -> usize {
        self.en_route
    }

    pub fn state_of(&self, agent: AgentId) -> AgentResult<AgentState> {
        self.state
            .get(agent.index())
            .copied()
            .ok_or(AgentError::UnknownAgent(agent))
    }

    /// Number of agents in the `ABORT` state.
    pub fn aborted(&self) -> usize {
        self.state.iter().filter(|s| **s == AgentState::Abort).count()
    }

    // ── Transitions ───────────────────────────────────────────────────────

    /// `ACTIVITY → LEG(stage)`.  Advances to the next plan element and
    /// returns its index.
    pub fn start_leg(&mut self, agent: AgentId, stage: LegStage) -> AgentResult<usize> {
        self.expect(agent, AgentState::Activity, "activity")?;
        let i = agent.index();
        self.state[i] = AgentState::Leg(stage);
        self.element[i] += 1;
        self.en_route += 1;
        Ok(self.element[i])
    }

    /// Driver of a transit departure: `ACTIVITY → LEG(Driving)` without a
    /// plan.
    pub fn start_driving(&mut self, agent: AgentId, vehicle: VehicleId, link: LinkId) -> AgentResult<()> {
        self.expect(agent, AgentState::Activity, "activity")?;
        let i = agent.index();
        self.state[i] = AgentState::Leg(LegStage::Driving(vehicle));
        self.vehicle[i] = vehicle;
        self.link[i] = link;
        self.en_route += 1;
        Ok(())
    }

    /// Change what a travelling agent is doing.
    pub fn set_stage(&mut self, agent: AgentId, stage: LegStage) -> AgentResult<()> {
        match self.state_of(agent)? {
            AgentState::Leg(_) => {
                self.state[agent.index()] = AgentState::Leg(stage);
                Ok(())
            }
            found => Err(AgentError::WrongState { agent, expected: "leg", found }),
        }
    }

    /// `LEG → ACTIVITY` at `link`.  Returns the index of the activity now
    /// being performed.
    pub fn end_leg(&mut self, agent: AgentId, link: LinkId) -> AgentResult<usize> {
        match self.state_of(agent)? {
            AgentState::Leg(_) => {}
            found => return Err(AgentError::WrongState { agent, expected: "leg", found }),
        }
        let i = agent.index();
        self.state[i] = AgentState::Activity;
        self.element[i] += 1;
        self.link[i] = link;
        self.en_route -= 1;
        Ok(self.element[i])
    }

    /// Any state → `ABORT`.  Returns `false` if the agent was already
    /// aborted.
    pub fn abort(&mut self, agent: AgentId) -> AgentResult<bool> {
        let prev = self.state_of(agent)?;
        if prev == AgentState::Abort {
            return Ok(false);
        }
        if prev.is_leg() {
            self.en_route -= 1;
        }
        self.state[agent.index()] = AgentState::Abort;
        Ok(true)
    }

    fn expect(&self, agent: AgentId, want: AgentState, expected: &'static str) -> AgentResult<()> {
        match self.state_of(agent)? {
            s if s == want => Ok(()),
            found => Err(AgentError::WrongState { agent, expected, found }),
        }
    }
}
