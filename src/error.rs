/// Puzzle-definition data that cannot be turned into a board.
///
/// Only data crossing into the crate is checked; controller operations never fail.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// The JSON did not parse into the expected records.
    #[error("malformed puzzle data: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A solution entry names a part kind that does not exist.
    #[error("unknown part kind {tag:?}")]
    UnknownPartKind {
        /// The tag as written.
        tag: String,
    },

    /// A solution entry names a source or sink.
    #[error("{kind} parts are stationary and cannot appear in a solution")]
    StationaryInSolution {
        /// The tag as written.
        kind: String,
    },

    /// The board has no cells.
    #[error("grid size must be at least 1")]
    EmptyGrid,

    /// A placement falls off the board.
    #[error("({x}, {y}) is outside a {size}x{size} grid")]
    OutOfBounds {
        /// Column of the placement.
        x: usize,
        /// Row of the placement.
        y: usize,
        /// Side length of the board.
        size: usize,
    },

    /// Two placements share a cell.
    #[error("more than one placement at ({x}, {y})")]
    Overlap {
        /// Column of the shared cell.
        x: usize,
        /// Row of the shared cell.
        y: usize,
    },

    /// There are no movable parts to place.
    #[error("puzzle {id} has no solution entries")]
    MissingSolution {
        /// The puzzle's identifier.
        id: u32,
    },

    /// There is nothing for flow to reach, so the puzzle would count as solved before any move.
    #[error("puzzle {id} has no sinks")]
    MissingSink {
        /// The puzzle's identifier.
        id: u32,
    },

    /// A solution angle is NaN or infinite.
    #[error("solution angle {angle} at ({x}, {y}) is not a finite number")]
    BadAngle {
        /// Column of the entry.
        x: usize,
        /// Row of the entry.
        y: usize,
        /// The angle as read.
        angle: f64,
    },
}

/// A [`SessionConfig`](crate::config::SessionConfig) that cannot drive animations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// The slowest speed is zero, negative, or not a number.
    #[error("minimum speed must be positive and finite, got {0}")]
    MinSpeed(f64),

    /// The fastest speed is below the slowest, or not finite.
    #[error("maximum speed {max} is below minimum speed {min}")]
    SpeedBounds {
        /// Configured minimum.
        min: f64,
        /// Configured maximum.
        max: f64,
    },

    /// The viewport has no area to draw into.
    #[error("viewport {width}x{height} has no area")]
    EmptyViewport {
        /// Configured width.
        width: f64,
        /// Configured height.
        height: f64,
    },
}

/// Result type for puzzle loading.
pub type DataResult<T> = Result<T, DataError>;
