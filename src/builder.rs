use std::collections::HashSet;
use std::num::NonZero;

use crate::data::{PartCounts, PuzzleData, SolutionEntry, Terminal};
use crate::direction::Orientation;
use crate::location::Location;
use crate::node::{PartKind, Rotation};

/// Side length of a board.
pub type Dimension = NonZero<usize>;

/// Reasons a builder may become invalid while building.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BuilderInvalidReason {
    /// A source, sink or part was placed outside the board.
    FeatureOutOfBounds,
    /// Something was placed on a cell that is already taken.
    FeatureOverlap,
    /// A source or sink was passed to [`PuzzleBuilder::add_part`].
    StationaryPart,
}

/// Assembles a [`PuzzleData`] in code, for tests and generated puzzles.
///
/// Builders mutate themselves while building but can be [`Clone`]d to save their state at some point.
/// Once a builder is invalid every further call does nothing.
#[derive(Clone, Debug)]
pub struct PuzzleBuilder {
    id: u32,
    size: Dimension,
    sources: Vec<Terminal>,
    sinks: Vec<Terminal>,
    solution: Vec<SolutionEntry>,
    occupied: HashSet<Location>,
    invalid_reasons: Vec<BuilderInvalidReason>,
}

impl Default for PuzzleBuilder {
    fn default() -> Self {
        Self::with_size(NonZero::<usize>::MIN.saturating_add(4))
    }
}

impl PuzzleBuilder {
    /// Construct a new builder for a `size` by `size` board.
    pub fn with_size(size: Dimension) -> Self {
        Self {
            id: 0,
            size,
            sources: Default::default(),
            sinks: Default::default(),
            solution: Default::default(),
            occupied: Default::default(),
            invalid_reasons: Default::default(),
        }
    }

    /// Set the puzzle's identifier. Defaults to 0.
    pub fn with_id(&mut self, id: u32) -> &mut Self {
        self.id = id;
        self
    }

    fn claim(&mut self, location: Location) -> bool {
        if !self.invalid_reasons.is_empty() {
            return false;
        }
        if !location.within(self.size.get()) {
            self.invalid_reasons.push(BuilderInvalidReason::FeatureOutOfBounds);
            return false;
        }
        if !self.occupied.insert(location) {
            self.invalid_reasons.push(BuilderInvalidReason::FeatureOverlap);
            return false;
        }
        true
    }

    /// Add a source at `location`.
    ///
    /// May cause the builder to enter a [`FeatureOutOfBounds`](BuilderInvalidReason::FeatureOutOfBounds) or
    /// [`FeatureOverlap`](BuilderInvalidReason::FeatureOverlap) invalid state.
    pub fn add_source(&mut self, location: Location, orientation: Orientation) -> &mut Self {
        if self.claim(location) {
            self.sources.push(Terminal { x: location.0, y: location.1, orientation });
        }
        self
    }

    /// Add a sink at `location`, with the same conditions as [`Self::add_source`].
    pub fn add_sink(&mut self, location: Location, orientation: Orientation) -> &mut Self {
        if self.claim(location) {
            self.sinks.push(Terminal { x: location.0, y: location.1, orientation });
        }
        self
    }

    /// Add a movable part whose solved placement is `location` at `rotation`.
    ///
    /// Parts are shuffled and animated in the order they are added.
    /// Besides the conditions of [`Self::add_source`], `kind` must not be stationary.
    pub fn add_part(&mut self, kind: PartKind, location: Location, rotation: Rotation) -> &mut Self {
        if !self.invalid_reasons.is_empty() {
            return self;
        }
        if kind.is_stationary() {
            self.invalid_reasons.push(BuilderInvalidReason::StationaryPart);
            return self;
        }
        if self.claim(location) {
            self.solution.push(SolutionEntry {
                kind: kind.to_string(),
                x: location.0,
                y: location.1,
                angle: f64::from(rotation.index()) * 0.5,
            });
        }
        self
    }

    /// Remove the most recently added part.
    ///
    /// If the builder is in an invalid state or no parts are present, this function does nothing.
    pub fn pop_part(&mut self) -> &mut Self {
        if !self.invalid_reasons.is_empty() {
            return self;
        }
        if let Some(entry) = self.solution.pop() {
            self.occupied.remove(&Location(entry.x, entry.y));
        }
        self
    }

    /// Check the validity of this builder.
    ///
    /// Returns `None` if the builder is valid, `Some(&Vec<BuilderInvalidReason>)` otherwise.
    pub fn is_valid(&self) -> Option<&Vec<BuilderInvalidReason>> {
        if self.invalid_reasons.is_empty() {
            None
        } else {
            Some(&self.invalid_reasons)
        }
    }

    /// Convert the state of this builder into puzzle data.
    /// If the builder is invalid for any reason, a reference to a [`Vec`] of [`BuilderInvalidReason`] will indicate why.
    ///
    /// A builder with no parts still builds, but the result will be refused on load.
    pub fn build(&self) -> Result<PuzzleData, &Vec<BuilderInvalidReason>> {
        if let Some(reasons) = self.is_valid() {
            return Err(reasons);
        }

        let mut parts = PartCounts::default();
        for entry in &self.solution {
            match entry.part_kind() {
                Ok(PartKind::Elbow) => parts.elbows += 1,
                Ok(PartKind::Straight) => parts.straights += 1,
                Ok(PartKind::Tee) => parts.tees += 1,
                Ok(PartKind::Cross) => parts.crosses += 1,
                _ => {}
            }
        }

        Ok(PuzzleData {
            id: self.id,
            size: self.size.get(),
            parts,
            sources: self.sources.clone(),
            sinks: self.sinks.clone(),
            solution: self.solution.clone(),
        })
    }
}
