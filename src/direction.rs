use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, VariantArray};

use crate::location::Location;

/// The four sides of a cell.
///
/// Variants are declared clockwise from north, and that order is also the slot order inside a
/// [`Node`](crate::node::Node), so a quarter turn is a single offset into the slot array.
#[derive(Copy, Clone, VariantArray, Eq, PartialEq, Hash, Debug, Ord, PartialOrd, Display)]
pub enum Direction {
    /// Toward `y - 1`.
    North,
    /// Toward `x + 1`.
    East,
    /// Toward `y + 1`.
    South,
    /// Toward `x - 1`.
    West,
}

impl Direction {
    /// Position of this side in a slot array.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The side facing this one across a shared edge.
    pub fn invert(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    fn delta(self) -> (isize, isize) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }

    /// Attempt the step from `location` toward this side of a `size` by `size` board.
    ///
    /// Returns [`None`] if the step would fall off the board.
    pub fn attempt_from(self, location: Location, size: usize) -> Option<Location> {
        location.offset_within(self.delta(), size)
    }
}

/// How a source or sink gauge is laid into the board. Fixed at creation.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(ascii_case_insensitive, serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Open east and west.
    #[default]
    Horizontal,
    /// Open north and south.
    Vertical,
}
