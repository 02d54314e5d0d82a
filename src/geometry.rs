use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::location::Location;

/// A position in screen pixels. `y` grows downwards.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal pixel position.
    pub x: f64,
    /// Vertical pixel position.
    pub y: f64,
}

impl Point {
    /// Shorthand constructor.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Straight-line distance to `other`.
    pub fn distance(self, other: Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Width and height in screen pixels.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Size {
    /// Shorthand constructor.
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Rect {
    /// Top-left corner.
    pub origin: Point,
    /// Extent from the origin.
    pub size: Size,
}

impl Rect {
    /// Whether `point` lies inside. The right and bottom edges are exclusive.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.origin.x
            && point.y >= self.origin.y
            && point.x < self.origin.x + self.size.width
            && point.y < self.origin.y + self.size.height
    }
}

/// Where the board sits in the viewport and how large each cell is drawn.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoardGeometry {
    bounds: Rect,
    cell: f64,
    cells: usize,
}

impl BoardGeometry {
    /// Lay out a `cells` by `cells` board centred in `viewport`.
    ///
    /// Each cell is the viewport's shorter side split `cells` ways, less `cells` pixels of margin, rounded to a whole
    /// pixel and never smaller than one.
    pub fn fit(viewport: Size, cells: usize) -> Self {
        let n = cells.max(1) as f64;
        let cell = (viewport.width.min(viewport.height) / n - n).round().max(1.0);
        let side = cell * n;

        Self {
            bounds: Rect {
                origin: Point::new(((viewport.width - side) / 2.0).round(), ((viewport.height - side) / 2.0).round()),
                size: Size::new(side, side),
            },
            cell,
            cells,
        }
    }

    /// The board's pixel rectangle.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Side length of one cell in pixels.
    pub fn cell_size(&self) -> f64 {
        self.cell
    }

    /// Top-left pixel of the cell at `location`.
    pub fn grid_to_screen(&self, location: Location) -> Point {
        Point::new(
            self.bounds.origin.x + location.0 as f64 * self.cell,
            self.bounds.origin.y + location.1 as f64 * self.cell,
        )
    }

    /// The cell under `point`, or [`None`] outside the board.
    pub fn screen_to_grid(&self, point: Point) -> Option<Location> {
        if !self.bounds.contains(point) {
            return None;
        }
        let x = ((point.x - self.bounds.origin.x) / self.cell).floor() as usize;
        let y = ((point.y - self.bounds.origin.y) / self.cell).floor() as usize;
        Some(Location(x, y)).filter(|l| l.within(self.cells))
    }

    /// A uniformly chosen side of the board, then a uniform point along it.
    pub fn perimeter_point<R: Rng + ?Sized>(&self, rng: &mut R) -> Point {
        let Rect { origin, size } = self.bounds;
        let along_x = rng.gen_range(origin.x..=origin.x + size.width);
        let along_y = rng.gen_range(origin.y..=origin.y + size.height);

        match (rng.gen_bool(0.5), rng.gen_bool(0.5)) {
            (true, true) => Point::new(along_x, origin.y),
            (true, false) => Point::new(origin.x, along_y),
            (false, true) => Point::new(along_x, origin.y + size.height),
            (false, false) => Point::new(origin.x + size.width, along_y),
        }
    }
}
