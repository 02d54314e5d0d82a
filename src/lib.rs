#![warn(missing_docs)]

//! # `pipeworks`
//!
//! The engine behind a rotate-and-place pipe puzzle. A square board holds fixed sources and sinks plus movable pipe
//! segments; the player rotates and moves segments until flow from the sources reaches every sink.
//! Load a [`PuzzleData`] into a [`Puzzle`] to work with the board directly, or into a [`Session`] to get the
//! shuffle-in and solve-reveal animations and a play clock as well.
//!
//! # Internals
//! Nodes live in an arena owned by a [`Grid`] and refer to each other only by [`NodeId`].
//! Each node has four slots, one per side, held in north, east, south, west order; a quarter turn is an offset into
//! that array rather than a shuffle of named fields. A slot is capped, open, or linked to the neighbor on that side,
//! and links are always recorded on both ends.
//!
//! A rotation or move is a disconnect, a local change, then a reconnect against the neighbors. After every change:
//!
//! 1. each source is traced with [`trace()`], following live links depth-first,
//! 2. consecutive nodes of the trace are merged in an [`Equivalence`] (a union-find over arena indices),
//! 3. a sink is lit when it shares a class with some source.
//!
//! The puzzle is solved when every sink is lit.
//!
//! Animated batches never touch links while parts are in flight. Each [`AnimatedAction`] commits its node exactly
//! once, on arrival, and a full connect pass runs only after the last one lands.

pub use catalog::{BestTimes, Catalog, Navigator};
pub use config::SessionConfig;
pub use data::{Difficulty, PuzzleData};
pub use equivalence::Equivalence;
pub use error::{ConfigError, DataError};
pub use grid::Grid;
pub use location::Location;
pub use node::{NodeId, PartKind, Rotation};
pub use puzzle::{Placement, Puzzle};
pub use session::{Mode, PuzzleKey, Session};
pub use trace::trace;
pub use tween::{AnimatedAction, MovementBehavior};

pub mod builder;
pub mod catalog;
pub mod config;
pub mod data;
pub mod direction;
pub mod equivalence;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod location;
pub mod node;
pub mod port;
pub mod puzzle;
pub mod session;
pub(crate) mod trace;
pub mod tween;
mod tests;
