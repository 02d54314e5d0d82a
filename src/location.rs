use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// One axis of a [`Location`].
pub type Coord = usize;

/// A cell on the board, in `(x, y)` order with `y` growing downward.
#[derive(Clone, Eq, Hash, Copy, PartialEq, Ord, PartialOrd, Debug, Serialize, Deserialize)]
pub struct Location(pub Coord, pub Coord);

impl Location {
    /// Index into a row-major cell array.
    pub(crate) fn as_index(&self) -> (Coord, Coord) {
        (self.1, self.0)
    }

    pub(crate) fn from_index(index: (Coord, Coord)) -> Self {
        Self(index.1, index.0)
    }

    /// Step by `rhs`, returning [`None`] when the result would leave a `size` by `size` board.
    pub fn offset_within(self, rhs: (isize, isize), size: usize) -> Option<Self> {
        let x = self.0.checked_add_signed(rhs.0)?;
        let y = self.1.checked_add_signed(rhs.1)?;
        (x < size && y < size).then_some(Self(x, y))
    }

    /// Whether this location lies on a `size` by `size` board.
    pub fn within(&self, size: usize) -> bool {
        self.0 < size && self.1 < size
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}
