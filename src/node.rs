use std::f64::consts::PI;

use itertools::Itertools;
use strum::{Display, EnumString, VariantArray};

use crate::direction::{Direction, Orientation};
use crate::location::Location;

/// Stable index of a node inside its [`Grid`](crate::grid::Grid) arena.
///
/// Every cross-node reference is one of these; identity never depends on addresses or hashes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The arena index.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// The state of one side of a node.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Slot {
    /// An opening with nothing attached.
    #[default]
    Open,
    /// A permanent cap. Never links.
    Blocked,
    /// An established connection to the neighbor on this side.
    Linked(NodeId),
}

/// The kinds of node that can sit on the board.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, VariantArray, Display, EnumString)]
#[strum(ascii_case_insensitive, serialize_all = "snake_case")]
pub enum PartKind {
    /// A quarter bend.
    Elbow,
    /// A straight run.
    #[strum(to_string = "straight", serialize = "pipe")]
    Straight,
    /// Three openings.
    #[strum(to_string = "tee", serialize = "t_junction")]
    Tee,
    /// All four openings.
    Cross,
    /// Where flow starts. Stationary.
    Source,
    /// Where flow must arrive. Stationary.
    Sink,
}

impl PartKind {
    /// Sources and sinks never move or rotate.
    pub fn is_stationary(self) -> bool {
        matches!(self, Self::Source | Self::Sink)
    }

    /// Which sides are capped at rotation index 0, in [`Direction`] order.
    pub(crate) fn blocked_at_rest(self) -> [bool; 4] {
        match self {
            Self::Elbow => [true, false, false, true],
            Self::Straight | Self::Source | Self::Sink => [true, false, true, false],
            Self::Tee => [false, false, false, true],
            Self::Cross => [false; 4],
        }
    }
}

/// What the rendering layer should draw for a node.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, VariantArray, Display)]
#[strum(serialize_all = "snake_case")]
pub enum DisplayKey {
    /// An empty board cell.
    Tile,
    /// An [`Elbow`](PartKind::Elbow).
    Elbow,
    /// A [`Straight`](PartKind::Straight).
    Straight,
    /// A [`Tee`](PartKind::Tee).
    Tee,
    /// A [`Cross`](PartKind::Cross).
    Cross,
    /// A source, or a sink that flow reaches.
    LitGauge,
    /// A sink that flow does not reach.
    UnlitGauge,
}

/// Quarter turns counter-clockwise from the rest pattern, always in `0..4`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Rotation(u8);

impl Rotation {
    const ANGLES: [f64; 4] = [0.0, PI * 0.5, PI, PI * 1.5];

    /// Wraps `index` into `0..4`.
    pub fn new(index: u8) -> Self {
        Self(index % 4)
    }

    /// The rotation index.
    pub fn index(self) -> u8 {
        self.0
    }

    /// One quarter turn counter-clockwise.
    pub fn turned_left(self) -> Self {
        Self((self.0 + 1) % 4)
    }

    /// One quarter turn clockwise.
    pub fn turned_right(self) -> Self {
        Self((self.0 + 3) % 4)
    }

    /// Left turns needed to get from `self` to `target`.
    pub fn left_turns_to(self, target: Self) -> u8 {
        (target.0 + 4 - self.0) % 4
    }

    /// Absolute angle in radians, counter-clockwise.
    pub fn angle(self) -> f64 {
        Self::ANGLES[self.0 as usize]
    }

    /// Snap a rotation factor, expressed in multiples of pi, to the nearest quarter turn.
    ///
    /// Boundaries belong to the lower interval: `0.25` snaps to 0, `0.75` to 1, `1.25` to 2 and `1.75` to 3.
    /// Factors outside `[0, 2)` are wrapped first; anything non-finite snaps to 0.
    pub fn from_factor(factor: f64) -> Self {
        let factor = factor.rem_euclid(2.0);
        let index = if factor > 0.25 && factor <= 0.75 {
            1
        } else if factor > 0.75 && factor <= 1.25 {
            2
        } else if factor > 1.25 && factor <= 1.75 {
            3
        } else {
            0
        };
        Self(index)
    }
}

/// Where a node belongs in the canonical solution.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct SolutionTarget {
    /// Target cell.
    pub location: Location,
    /// Target rotation.
    pub rotation: Rotation,
}

/// A pipe segment, source, or sink.
#[derive(Clone, Debug)]
pub struct Node {
    pub(crate) kind: PartKind,
    pub(crate) slots: [Slot; 4],
    pub(crate) rotation: Rotation,
    // None while the node is off the board, e.g. mid-flight during an animation
    pub(crate) location: Option<Location>,
    pub(crate) solution: Option<SolutionTarget>,
    pub(crate) lit: bool,
}

impl Node {
    fn at_rest(kind: PartKind) -> Self {
        let blocked = kind.blocked_at_rest();
        Self {
            kind,
            slots: blocked.map(|capped| if capped { Slot::Blocked } else { Slot::Open }),
            rotation: Rotation::default(),
            location: None,
            solution: None,
            lit: false,
        }
    }

    /// A movable part, not yet on the board.
    pub(crate) fn part(kind: PartKind, solution: Option<SolutionTarget>) -> Self {
        Self { solution, ..Self::at_rest(kind) }
    }

    /// A source or sink at its fixed `location`.
    pub(crate) fn terminal(kind: PartKind, orientation: Orientation, location: Location) -> Self {
        let mut node = Self::at_rest(kind);
        if orientation == Orientation::Vertical {
            node.rotate_left();
        }
        node.location = Some(location);
        node
    }

    /// The kind tag.
    pub fn kind(&self) -> PartKind {
        self.kind
    }

    /// Shorthand for `self.kind().is_stationary()`.
    pub fn is_stationary(&self) -> bool {
        self.kind.is_stationary()
    }

    /// The slot on side `direction`.
    pub fn slot(&self, direction: Direction) -> Slot {
        self.slots[direction.index()]
    }

    pub(crate) fn slot_mut(&mut self, direction: Direction) -> &mut Slot {
        &mut self.slots[direction.index()]
    }

    /// Whether side `direction` can ever hold a link.
    pub fn is_open(&self, direction: Direction) -> bool {
        self.slot(direction) != Slot::Blocked
    }

    /// The neighbor linked on side `direction`, if any.
    pub fn link(&self, direction: Direction) -> Option<NodeId> {
        match self.slot(direction) {
            Slot::Linked(other) => Some(other),
            _ => None,
        }
    }

    /// All live links, in north, east, south, west order.
    pub fn links(&self) -> impl Iterator<Item = (Direction, NodeId)> + '_ {
        Direction::VARIANTS.iter().filter_map(|d| self.link(*d).map(|other| (*d, other)))
    }

    /// The sides that are not capped.
    pub fn openings(&self) -> Vec<Direction> {
        Direction::VARIANTS.iter().copied().filter(|d| self.is_open(*d)).collect_vec()
    }

    /// Current rotation.
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Current rotation as an absolute angle.
    pub fn angle(&self) -> f64 {
        self.rotation.angle()
    }

    /// The cell this node occupies, or [`None`] while it is off the board.
    pub fn location(&self) -> Option<Location> {
        self.location
    }

    /// Target placement in the canonical solution.
    pub fn solution(&self) -> Option<SolutionTarget> {
        self.solution
    }

    /// For sinks, whether flow from some source currently reaches this node.
    pub fn is_lit(&self) -> bool {
        self.lit
    }

    /// What to draw for this node.
    pub fn display_key(&self) -> DisplayKey {
        match self.kind {
            PartKind::Elbow => DisplayKey::Elbow,
            PartKind::Straight => DisplayKey::Straight,
            PartKind::Tee => DisplayKey::Tee,
            PartKind::Cross => DisplayKey::Cross,
            PartKind::Source => DisplayKey::LitGauge,
            PartKind::Sink if self.lit => DisplayKey::LitGauge,
            PartKind::Sink => DisplayKey::UnlitGauge,
        }
    }

    /// Turn counter-clockwise by `quarter_turns`.
    ///
    /// Only the local slot pattern moves; callers disconnect first so no live link is carried around.
    pub(crate) fn rotate_by(&mut self, quarter_turns: u8) {
        let quarter_turns = quarter_turns % 4;
        self.slots.rotate_left(quarter_turns as usize);
        self.rotation = Rotation::new(self.rotation.index() + quarter_turns);
    }

    pub(crate) fn rotate_left(&mut self) {
        self.rotate_by(1);
    }

    pub(crate) fn rotate_right(&mut self) {
        self.rotate_by(3);
    }

    pub(crate) fn set_rotation(&mut self, rotation: Rotation) {
        self.rotate_by(self.rotation.left_turns_to(rotation));
    }
}
