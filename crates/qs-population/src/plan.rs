//! Plan elements: activities and legs.

use std::sync::Arc;

use qs_core::{Coord, LinkId, TransportMode};

use crate::Route;

// ── Activity ──────────────────────────────────────────────────────────────────

/// A stationary stay at a location.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Activity {
    /// Application-defined label ("home", "work", …), echoed in events.
    pub act_type: Arc<str>,

    /// Link the activity takes place on.  `LinkId::INVALID` means "derive
    /// from `coord`", done once at setup time.
    pub link: LinkId,

    pub coord: Option<Coord>,

    /// Absolute end time in seconds after midnight.
    pub end_secs: Option<u64>,

    /// Used when `end_secs` is absent: the activity lasts this long.
    pub max_duration_secs: Option<u64>,
}

impl Activity {
    pub fn on_link(act_type: &str, link: LinkId) -> Self {
        Self {
            act_type:          Arc::from(act_type),
            link,
            coord:             None,
            end_secs:          None,
            max_duration_secs: None,
        }
    }

    /// An activity located only by coordinate.
    pub fn at_coord(act_type: &str, coord: Coord) -> Self {
        Self { coord: Some(coord), ..Self::on_link(act_type, LinkId::INVALID) }
    }

    pub fn ending_at(mut self, secs: u64) -> Self {
        self.end_secs = Some(secs);
        self
    }

    pub fn lasting(mut self, secs: u64) -> Self {
        self.max_duration_secs = Some(secs);
        self
    }

    /// When an activity begun at `start_secs` ends, never before it began.
    ///
    /// `None` means the activity has no end (typically the last one).
    pub fn end_after(&self, start_secs: u64) -> Option<u64> {
        match (self.end_secs, self.max_duration_secs) {
            (Some(end), _) => Some(end.max(start_secs)),
            (None, Some(dur)) => Some(start_secs + dur),
            (None, None) => None,
        }
    }
}

// ── Leg ───────────────────────────────────────────────────────────────────────

/// A trip between two activities.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Leg {
    pub mode: TransportMode,
    /// `None` until the simulation builder routes the leg.
    pub route: Option<Route>,
}

impl Leg {
    pub fn new(mode: TransportMode) -> Self {
        Self { mode, route: None }
    }

    pub fn with_route(mode: TransportMode, route: Route) -> Self {
        Self { mode, route: Some(route) }
    }
}

// ── Plan ──────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlanElement {
    Activity(Activity),
    Leg(Leg),
}

/// Ordered daily plan of one person.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Plan {
    pub elements: Vec<PlanElement>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activity(mut self, act: Activity) -> Self {
        self.elements.push(PlanElement::Activity(act));
        self
    }

    pub fn leg(mut self, leg: Leg) -> Self {
        self.elements.push(PlanElement::Leg(leg));
        self
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn activity_at(&self, index: usize) -> Option<&Activity> {
        match self.elements.get(index)? {
            PlanElement::Activity(a) => Some(a),
            PlanElement::Leg(_) => None,
        }
    }

    pub fn leg_at(&self, index: usize) -> Option<&Leg> {
        match self.elements.get(index)? {
            PlanElement::Leg(l) => Some(l),
            PlanElement::Activity(_) => None,
        }
    }

    pub fn activities_mut(&mut self) -> impl Iterator<Item = &mut Activity> {
        self.elements.iter_mut().filter_map(|e| match e {
            PlanElement::Activity(a) => Some(a),
            PlanElement::Leg(_) => None,
        })
    }

    /// `true` if `index` is the final element of the plan.
    #[inline]
    pub fn is_last(&self, index: usize) -> bool {
        index + 1 == self.elements.len()
    }

    /// Structural check: non-empty, activity first and last, alternating.
    pub fn check_structure(&self) -> Result<(), &'static str> {
        if self.elements.is_empty() {
            return Err("plan is empty");
        }
        for (i, e) in self.elements.iter().enumerate() {
            let expect_activity = i % 2 == 0;
            match (e, expect_activity) {
                (PlanElement::Activity(_), true) | (PlanElement::Leg(_), false) => {}
                (PlanElement::Leg(_), true) => return Err("activities and legs must alternate"),
                (PlanElement::Activity(_), false) => return Err("activities and legs must alternate"),
            }
        }
        if self.elements.len() % 2 == 0 {
            return Err("plan must end with an activity");
        }
        Ok(())
    }
}
