use std::time::Duration;

use crate::geometry::{Point, Rect};
use crate::node::DisplayKey;
use crate::session::{Mode, PuzzleKey};

/// A drawing target supplied by the host once per frame.
///
/// Coordinates are screen pixels. Image lookup and scaling are the host's business; the session only names what to
/// draw with a [`DisplayKey`].
pub trait Surface {
    /// Clear the whole drawing area.
    fn fill_background(&mut self);

    /// Draw an empty board cell with its top-left corner at `at`.
    fn draw_tile(&mut self, at: Point, size: f64);

    /// Draw a part image with its top-left corner at `at`, turned `angle` radians counter-clockwise about its centre.
    fn draw_part(&mut self, key: DisplayKey, at: Point, size: f64, angle: f64);

    /// Called once per frame before anything else, with the board's pixel rectangle.
    fn begin(&mut self, _bounds: Rect) {}
}

/// Receives session events. Every method defaults to doing nothing.
pub trait SessionListener {
    /// The play clock moved on.
    fn elapsed(&mut self, _elapsed: Duration) {}

    /// The player connected every sink.
    fn solved(&mut self, _puzzle: PuzzleKey, _elapsed: Duration) {}

    /// The session changed mode.
    fn mode_changed(&mut self, _mode: Mode) {}
}

impl SessionListener for () {}
