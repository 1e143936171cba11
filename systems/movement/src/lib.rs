#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Continuous route following for walking entities.
//!
//! A [`RouteFollower`] owns a [`Route`] and a waypoint cursor. Each call to
//! [`RouteFollower::advance`] converts speed and elapsed time into a distance
//! budget and spends it across as many waypoints as it reaches, so a fast
//! entity or a long tick never loses movement.

use std::time::Duration;

use castle_defence_core::{CellCoord, Facing, Position, Route};

/// Waypoints closer than this distance are snapped to without spending budget.
pub const WAYPOINT_EPSILON: f32 = 1.0e-4;

/// Outcome of a single [`RouteFollower::advance`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    /// Waypoints remain ahead of the follower.
    Walking,
    /// The follower consumed the final waypoint.
    Arrived,
}

/// Walks a position along a route, one waypoint at a time.
#[derive(Clone, Debug)]
pub struct RouteFollower {
    route: Route,
    position: Position,
    next: usize,
    previous: usize,
    facing: Facing,
}

impl RouteFollower {
    /// Places a follower on the first cell of `route`.
    ///
    /// Returns `None` for an empty route, which cannot be walked.
    #[must_use]
    pub fn new(route: Route) -> Option<Self> {
        let start = route.first()?;
        let mut follower = Self {
            route,
            position: Position::of_cell(start),
            next: 1,
            previous: 0,
            facing: Facing::default(),
        };
        follower.update_facing();
        Some(follower)
    }

    /// Advances the follower by `speed * dt` tiles along its route.
    ///
    /// Non-positive speeds and zero durations leave the follower untouched.
    pub fn advance(&mut self, speed: f32, dt: Duration) -> Progress {
        let mut budget = speed * dt.as_secs_f32();
        if !budget.is_finite() || budget <= 0.0 {
            return self.progress();
        }

        while let Some(cell) = self.route.get(self.next) {
            let target = Position::of_cell(cell);
            let distance = self.position.distance_to(target);

            if distance < WAYPOINT_EPSILON {
                self.position = target;
                self.pass_waypoint();
                continue;
            }

            if budget <= 0.0 {
                break;
            }

            if budget >= distance {
                budget -= distance;
                self.position = target;
                self.pass_waypoint();
            } else {
                let ratio = budget / distance;
                self.position = Position::new(
                    self.position.x() + (target.x() - self.position.x()) * ratio,
                    self.position.y() + (target.y() - self.position.y()) * ratio,
                );
                break;
            }
        }

        self.progress()
    }

    /// Current continuous position.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Horizontal direction derived from the active route segment.
    #[must_use]
    pub const fn facing(&self) -> Facing {
        self.facing
    }

    /// Route being followed.
    #[must_use]
    pub const fn route(&self) -> &Route {
        &self.route
    }

    /// Index of the next uncompleted waypoint.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.next
    }

    /// Index of the waypoint most recently passed.
    #[must_use]
    pub const fn previous_index(&self) -> usize {
        self.previous
    }

    /// Next waypoint the follower walks toward, if any remain.
    #[must_use]
    pub fn next_waypoint(&self) -> Option<CellCoord> {
        self.route.get(self.next)
    }

    /// Reports whether the final waypoint was reached.
    #[must_use]
    pub fn has_arrived(&self) -> bool {
        self.next >= self.route.len()
    }

    fn progress(&self) -> Progress {
        if self.has_arrived() {
            Progress::Arrived
        } else {
            Progress::Walking
        }
    }

    fn pass_waypoint(&mut self) {
        self.previous = self.next;
        self.next += 1;
        self.update_facing();
    }

    fn update_facing(&mut self) {
        let (Some(from), Some(to)) = (self.route.get(self.previous), self.route.get(self.next))
        else {
            return;
        };

        if to.column() > from.column() {
            self.facing = Facing::Right;
        } else if to.column() < from.column() {
            self.facing = Facing::Left;
        }
    }
}
