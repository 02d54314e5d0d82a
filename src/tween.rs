use std::fmt::{Debug, Formatter};

use crate::geometry::Point;
use crate::node::{DisplayKey, NodeId};

/// Quadratic ease-in: `start + change * (t / duration)^2`.
fn ease_in_quad(t: f64, start: f64, change: f64, duration: f64) -> f64 {
    let t = t / duration;
    change * t * t + start
}

/// Quadratic ease-out: `start - change * (t / duration) * ((t / duration) - 2)`.
fn ease_out_quad(t: f64, start: f64, change: f64, duration: f64) -> f64 {
    let t = t / duration;
    -change * t * (t - 2.0) + start
}

/// Where a [`MovementBehavior`] is in its flight.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum MotionState {
    /// Stepping towards the destination.
    Moving,
    /// Parked exactly on the destination.
    Idle,
}

/// Moves a point to a destination along a straight line.
///
/// Speed eases in over the first half of the distance and out over the second, staying within `[min_speed, max_speed]`
/// pixels per tick. The final step lands exactly on the destination.
#[derive(Clone, Debug)]
pub struct MovementBehavior {
    state: MotionState,
    start: Point,
    position: Point,
    destination: Point,
    bearing: Point,
    half_distance: f64,
    min_speed: f64,
    max_speed: f64,
    speed: f64,
    angle: f64,
}

impl MovementBehavior {
    /// Begin a flight from `start` to `destination`. `angle` is the rotation to draw with, in radians.
    ///
    /// The speed bounds are taken in whichever order they arrive; a non-positive lower bound would never arrive, so it is
    /// raised to the smallest positive step.
    pub fn new(start: Point, destination: Point, angle: f64, min_speed: f64, max_speed: f64) -> Self {
        let (min_speed, max_speed) = (min_speed.min(max_speed).max(f64::EPSILON), max_speed.max(min_speed));
        let distance = start.distance(destination);
        let bearing = if distance > 0.0 {
            Point::new((destination.x - start.x) / distance, (destination.y - start.y) / distance)
        } else {
            Point::default()
        };

        Self {
            state: if distance > 0.0 { MotionState::Moving } else { MotionState::Idle },
            start,
            position: if distance > 0.0 { start } else { destination },
            destination,
            bearing,
            half_distance: distance / 2.0,
            min_speed,
            max_speed,
            speed: 0.0,
            angle,
        }
    }

    /// Advance one tick.
    pub fn update(&mut self) {
        if self.state == MotionState::Idle {
            return;
        }

        let travelled = self.start.distance(self.position);
        let change = self.max_speed - self.min_speed;
        self.speed = if travelled < self.half_distance {
            ease_in_quad(travelled, self.min_speed, change, self.half_distance)
        } else {
            ease_out_quad(travelled, self.min_speed, change, self.half_distance)
        }
        .max(self.min_speed)
        .min(self.max_speed);

        if self.position.distance(self.destination) <= self.speed {
            self.position = self.destination;
            self.speed = 0.0;
            self.state = MotionState::Idle;
            return;
        }

        self.position.x += self.bearing.x * self.speed;
        self.position.y += self.bearing.y * self.speed;
        if self.has_arrived() {
            self.state = MotionState::Idle;
        }
    }

    /// Whether the destination has been reached.
    pub fn has_arrived(&self) -> bool {
        self.position == self.destination
    }

    /// Current state.
    pub fn state(&self) -> MotionState {
        self.state
    }

    /// Current position.
    pub fn position(&self) -> Point {
        self.position
    }

    /// Where the flight ends.
    pub fn destination(&self) -> Point {
        self.destination
    }

    /// Distance covered by the last step.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// The fixed rotation to draw with, in radians counter-clockwise.
    pub fn angle(&self) -> f64 {
        self.angle
    }
}

/// Where an [`AnimatedAction`] is in its life.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ActionState {
    /// In flight.
    Primary,
    /// Landed; the commit has just run.
    Completion,
    /// Finished. The owner should drop the action.
    Disposal,
}

type Commit<T> = Box<dyn FnOnce(&mut T)>;

/// One node's flight plus the state change to apply when it lands.
///
/// The commit runs exactly once, on entry to [`ActionState::Completion`], and never while the node is moving. `T` is
/// whatever the commit mutates; a [`Session`](crate::session::Session) uses its [`Puzzle`](crate::puzzle::Puzzle).
pub struct AnimatedAction<T> {
    node: NodeId,
    key: DisplayKey,
    movement: MovementBehavior,
    state: ActionState,
    commit: Option<Commit<T>>,
}

impl<T> AnimatedAction<T> {
    /// Animate `node`, drawn as `key`, along `movement`, then run `commit`.
    pub fn new(node: NodeId, key: DisplayKey, movement: MovementBehavior, commit: impl FnOnce(&mut T) + 'static) -> Self {
        Self {
            node,
            key,
            movement,
            state: ActionState::Primary,
            commit: Some(Box::new(commit)),
        }
    }

    /// Advance one tick, committing into `target` on arrival.
    pub fn update(&mut self, target: &mut T) {
        match self.state {
            ActionState::Primary => {
                if self.movement.has_arrived() {
                    self.state = ActionState::Completion;
                    if let Some(commit) = self.commit.take() {
                        commit(target);
                    }
                } else {
                    self.movement.update();
                }
            }
            ActionState::Completion => self.state = ActionState::Disposal,
            ActionState::Disposal => {}
        }
    }

    /// Whether the owner may drop this action.
    pub fn ready_for_disposal(&self) -> bool {
        self.state == ActionState::Disposal
    }

    /// Current state.
    pub fn state(&self) -> ActionState {
        self.state
    }

    /// The node being animated.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// What to draw.
    pub fn key(&self) -> DisplayKey {
        self.key
    }

    /// Where to draw it.
    pub fn position(&self) -> Point {
        self.movement.position()
    }

    /// At what rotation, in radians counter-clockwise.
    pub fn angle(&self) -> f64 {
        self.movement.angle()
    }

    /// The flight itself.
    pub fn movement(&self) -> &MovementBehavior {
        &self.movement
    }
}

impl<T> Debug for AnimatedAction<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimatedAction")
            .field("node", &self.node)
            .field("key", &self.key)
            .field("movement", &self.movement)
            .field("state", &self.state)
            .field("committed", &self.commit.is_none())
            .finish()
    }
}
