use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, VariantArray};

use crate::direction::Orientation;
use crate::error::{DataError, DataResult};
use crate::location::Location;
use crate::node::{PartKind, Rotation, SolutionTarget};

/// One of the three fixed difficulty groupings of puzzles.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd, VariantArray, Display, EnumString, Serialize, Deserialize)]
#[strum(ascii_case_insensitive, serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// The first tier.
    #[default]
    Easy,
    /// The second tier.
    Medium,
    /// The third tier.
    Hard,
}

/// Part counts as declared by the puzzle author.
///
/// Informational only; never checked against the solution list.
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PartCounts {
    #[serde(default)]
    pub elbows: usize,
    #[serde(default)]
    pub straights: usize,
    #[serde(default)]
    pub tees: usize,
    #[serde(default)]
    pub crosses: usize,
}

/// A fixed source or sink placement.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Terminal {
    /// Column.
    pub x: usize,
    /// Row.
    pub y: usize,
    /// Which way the gauge's openings face.
    #[serde(default)]
    pub orientation: Orientation,
}

impl Terminal {
    /// The cell this terminal sits on.
    pub fn location(&self) -> Location {
        Location(self.x, self.y)
    }
}

/// One movable part and where it belongs in the canonical solution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolutionEntry {
    /// Part kind tag, e.g. `elbow`, `straight`, `tee`, `cross`.
    pub kind: String,
    /// Target column.
    pub x: usize,
    /// Target row.
    pub y: usize,
    /// Target rotation in multiples of pi: 0.0, 0.5, 1.0 or 1.5.
    #[serde(default)]
    pub angle: f64,
}

impl SolutionEntry {
    /// Parse the kind tag, rejecting unknown and stationary kinds.
    pub fn part_kind(&self) -> DataResult<PartKind> {
        let kind = PartKind::from_str(&self.kind).map_err(|_| DataError::UnknownPartKind { tag: self.kind.clone() })?;
        if kind.is_stationary() {
            return Err(DataError::StationaryInSolution { kind: self.kind.clone() });
        }
        Ok(kind)
    }

    /// The solution target described by this entry.
    pub fn target(&self) -> SolutionTarget {
        SolutionTarget {
            location: Location(self.x, self.y),
            rotation: Rotation::from_factor(self.angle),
        }
    }
}

/// Everything needed to set up one puzzle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PuzzleData {
    /// Developer-assigned identifier; puzzles within a tier are ordered by it.
    pub id: u32,
    /// The board is `size` by `size` cells.
    pub size: usize,
    /// Declared part counts.
    #[serde(default)]
    pub parts: PartCounts,
    /// Fixed flow origins.
    #[serde(default)]
    pub sources: Vec<Terminal>,
    /// Fixed flow destinations.
    #[serde(default)]
    pub sinks: Vec<Terminal>,
    /// Movable parts in placement order, each with its solved cell and rotation.
    #[serde(default)]
    pub solution: Vec<SolutionEntry>,
}

impl PuzzleData {
    /// Parse and validate a single puzzle from JSON.
    pub fn from_json(json: &str) -> DataResult<Self> {
        let data: Self = serde_json::from_str(json)?;
        data.validate()?;
        Ok(data)
    }

    /// Check that this record describes a loadable board.
    ///
    /// There must be at least one movable part and one sink.
    /// Every placement must be on the board and no two placements (terminals or solution targets) may share a cell.
    pub fn validate(&self) -> DataResult<()> {
        if self.size == 0 {
            return Err(DataError::EmptyGrid);
        }
        if self.solution.is_empty() {
            return Err(DataError::MissingSolution { id: self.id });
        }
        if self.sinks.is_empty() {
            return Err(DataError::MissingSink { id: self.id });
        }

        let mut taken = HashSet::with_capacity(self.sources.len() + self.sinks.len() + self.solution.len());
        let terminals = self.sources.iter().chain(self.sinks.iter()).map(|t| (t.x, t.y));
        let targets = self.solution.iter().map(|s| (s.x, s.y));
        for (x, y) in terminals.chain(targets) {
            if !Location(x, y).within(self.size) {
                return Err(DataError::OutOfBounds { x, y, size: self.size });
            }
            if !taken.insert((x, y)) {
                return Err(DataError::Overlap { x, y });
            }
        }

        for entry in &self.solution {
            entry.part_kind()?;
            if !entry.angle.is_finite() {
                return Err(DataError::BadAngle { x: entry.x, y: entry.y, angle: entry.angle });
            }
        }

        Ok(())
    }
}
