use std::fmt::{Display, Formatter};
use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use strum::{Display, VariantArray};
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::data::{Difficulty, PuzzleData};
use crate::error::{ConfigError, DataResult};
use crate::geometry::{BoardGeometry, Point, Rect, Size};
use crate::location::Location;
use crate::port::{SessionListener, Surface};
use crate::puzzle::Puzzle;
use crate::tween::{AnimatedAction, MovementBehavior};

/// Which update and render behaviour is active.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, VariantArray, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Mode {
    /// Parts are flying in to their shuffled cells. Entered on every load.
    #[default]
    Shuffle,
    /// The player is solving.
    NormalPlay,
    /// Parts are flying to, or resting on, their solved cells.
    Solution,
}

/// Identifies a puzzle across tiers.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PuzzleKey {
    /// The tier the puzzle belongs to.
    pub tier: Difficulty,
    /// The puzzle's identifier within its tier.
    pub id: u32,
}

impl Display for PuzzleKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} #{}", self.tier, self.id)
    }
}

/// Render a play time as `m:ss`, or `h:mm:ss` from one hour on.
pub fn format_elapsed(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs();
    let (hours, minutes, seconds) = (seconds / 3600, seconds / 60 % 60, seconds % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

// Draws of a shuffle plan before accepting one that lands solved.
const SHUFFLE_ATTEMPTS: usize = 8;

// The play clock starts on the first selection and stops when the puzzle is solved or revealed.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
enum Clock {
    #[default]
    Waiting,
    Running(Duration),
    Stopped(Duration),
}

impl Clock {
    fn elapsed(self) -> Duration {
        match self {
            Self::Waiting => Duration::ZERO,
            Self::Running(elapsed) | Self::Stopped(elapsed) => elapsed,
        }
    }

    fn start(&mut self) {
        if *self == Self::Waiting {
            *self = Self::Running(Duration::ZERO);
        }
    }

    fn stop(&mut self) {
        *self = Self::Stopped(self.elapsed());
    }
}

/// One player's game: the loaded puzzle, the active mode, and any parts in flight.
///
/// The host calls [`update`](Self::update) and then [`render`](Self::render) once per tick, and forwards pointer input
/// in between. Animation advances one step per update regardless of the tick length; only the play clock uses it.
/// Input is acted on only in [`Mode::NormalPlay`].
pub struct Session {
    config: SessionConfig,
    rng: ChaCha8Rng,
    viewport: Size,
    geometry: BoardGeometry,
    mode: Mode,
    current: Option<(PuzzleKey, Puzzle)>,
    actions: Vec<AnimatedAction<Puzzle>>,
    clock: Clock,
    drag: Option<Point>,
    listener: Box<dyn SessionListener>,
}

impl Session {
    /// A session with nothing loaded yet.
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Ok(Self {
            rng,
            viewport: config.viewport,
            geometry: BoardGeometry::fit(config.viewport, 1),
            config,
            mode: Mode::default(),
            current: None,
            actions: Vec::new(),
            clock: Clock::default(),
            drag: None,
            listener: Box::new(()),
        })
    }

    /// Replace whoever is told about session events.
    pub fn set_listener(&mut self, listener: impl SessionListener + 'static) {
        self.listener = Box::new(listener);
    }

    /// Swap in a new puzzle and start its shuffle-in.
    ///
    /// Anything still in flight from the previous puzzle is dropped without committing.
    pub fn load_puzzle(&mut self, tier: Difficulty, data: &PuzzleData) -> DataResult<()> {
        let puzzle = Puzzle::load(data)?;
        let key = PuzzleKey { tier, id: data.id };
        info!(puzzle = %key, "starting puzzle");

        self.geometry = BoardGeometry::fit(self.viewport, data.size);
        self.current = Some((key, puzzle));
        self.actions.clear();
        self.clock = Clock::default();
        self.drag = None;
        self.enter_shuffle();
        Ok(())
    }

    fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            info!(from = %self.mode, to = %mode, "mode changed");
            self.mode = mode;
            self.listener.mode_changed(mode);
        }
    }

    // A plan that would land solved is drawn again, up to SHUFFLE_ATTEMPTS times in all.
    fn enter_shuffle(&mut self) {
        self.set_mode(Mode::Shuffle);
        let Some((_, puzzle)) = self.current.as_mut() else {
            return;
        };

        let mut plan = puzzle.plan_shuffle(&mut self.rng);
        for _ in 1..SHUFFLE_ATTEMPTS {
            if !puzzle.plan_solves(&plan) {
                break;
            }
            debug!(puzzle = puzzle.id(), "shuffle would land solved, drawing again");
            plan = puzzle.plan_shuffle(&mut self.rng);
        }

        for placement in plan {
            let start = self.geometry.perimeter_point(&mut self.rng);
            let movement = MovementBehavior::new(
                start,
                self.geometry.grid_to_screen(placement.location),
                placement.rotation.angle(),
                self.config.min_speed,
                self.config.max_speed,
            );
            let key = puzzle.grid()[placement.node].display_key();
            self.actions.push(AnimatedAction::new(placement.node, key, movement, move |puzzle: &mut Puzzle| {
                puzzle.commit_placement(&placement);
            }));
        }

        if self.actions.is_empty() {
            self.finish_batch();
        }
    }

    fn enter_solution(&mut self) {
        self.clock.stop();
        self.drag = None;
        self.set_mode(Mode::Solution);
        let Some((_, puzzle)) = self.current.as_mut() else {
            return;
        };

        puzzle.disconnect_all();
        let starts = puzzle
            .grid()
            .movable()
            .iter()
            .map(|id| puzzle.grid()[*id].location())
            .collect::<Vec<_>>();
        puzzle.lift_movable();

        for (placement, start) in puzzle.solution_plan().into_iter().zip(starts) {
            let start = match start {
                Some(location) => self.geometry.grid_to_screen(location),
                None => self.geometry.perimeter_point(&mut self.rng),
            };
            let movement = MovementBehavior::new(
                start,
                self.geometry.grid_to_screen(placement.location),
                placement.rotation.angle(),
                self.config.min_speed,
                self.config.max_speed,
            );
            let key = puzzle.grid()[placement.node].display_key();
            let node = placement.node;
            self.actions.push(AnimatedAction::new(node, key, movement, move |puzzle: &mut Puzzle| {
                puzzle.commit_solution(node);
            }));
        }

        if self.actions.is_empty() {
            self.finish_batch();
        }
    }

    // Every part of the batch has landed.
    fn finish_batch(&mut self) {
        let Some((key, puzzle)) = self.current.as_mut() else {
            return;
        };
        puzzle.connect_all();
        debug_assert!(puzzle.grid().is_consistent());
        let (key, solved) = (*key, puzzle.is_solved());

        match self.mode {
            Mode::Shuffle => {
                self.set_mode(Mode::NormalPlay);
                // only when every redraw in enter_shuffle also came out solved
                self.check_solved();
            }
            Mode::Solution => info!(puzzle = %key, solved, "solution revealed"),
            Mode::NormalPlay => {}
        }
    }

    /// Advance one tick.
    ///
    /// In [`Mode::Shuffle`] and [`Mode::Solution`] every part in flight takes one step; in [`Mode::NormalPlay`] the play
    /// clock moves on by `tick`.
    pub fn update(&mut self, tick: Duration) {
        match self.mode {
            Mode::Shuffle | Mode::Solution => self.advance_actions(),
            Mode::NormalPlay => {
                if let Clock::Running(elapsed) = &mut self.clock {
                    *elapsed += tick;
                    self.listener.elapsed(*elapsed);
                }
            }
        }
    }

    fn advance_actions(&mut self) {
        let Some((_, puzzle)) = self.current.as_mut() else {
            return;
        };
        if self.actions.is_empty() {
            return;
        }

        for action in &mut self.actions {
            action.update(puzzle);
        }
        self.actions.retain(|action| !action.ready_for_disposal());

        if self.actions.is_empty() {
            self.finish_batch();
        }
    }

    /// Draw the current frame.
    ///
    /// Empty cells first, then placed parts, then anything in flight. While a drag is in progress the selected part is
    /// drawn centred on the pointer instead of in its cell.
    pub fn render(&self, surface: &mut dyn Surface) {
        surface.begin(self.geometry.bounds());
        surface.fill_background();
        let Some((_, puzzle)) = &self.current else {
            return;
        };

        let cell = self.geometry.cell_size();
        let size = puzzle.grid().size();
        for y in 0..size {
            for x in 0..size {
                surface.draw_tile(self.geometry.grid_to_screen(Location(x, y)), cell);
            }
        }

        let dragged = match (self.mode, self.drag) {
            (Mode::NormalPlay, Some(_)) => puzzle.selected(),
            _ => None,
        };
        for (id, node) in puzzle.grid().nodes() {
            let Some(location) = node.location() else {
                continue;
            };
            if Some(id) != dragged {
                surface.draw_part(node.display_key(), self.geometry.grid_to_screen(location), cell, node.angle());
            }
        }

        for action in &self.actions {
            surface.draw_part(action.key(), action.position(), cell, action.angle());
        }

        if let (Some(id), Some(pointer)) = (dragged, self.drag) {
            let node = &puzzle.grid()[id];
            let at = Point::new(pointer.x - cell / 2.0, pointer.y - cell / 2.0);
            surface.draw_part(node.display_key(), at, cell, node.angle());
        }
    }

    fn playing(&mut self) -> Option<&mut Puzzle> {
        if self.mode != Mode::NormalPlay {
            return None;
        }
        self.current.as_mut().map(|(_, puzzle)| puzzle)
    }

    /// Select the movable part under `point`. The first selection of a puzzle starts the play clock.
    pub fn select_at(&mut self, point: Point) {
        let Some(location) = self.geometry.screen_to_grid(point) else {
            return;
        };
        let Some(puzzle) = self.playing() else {
            return;
        };
        puzzle.select_at(location);
        if puzzle.selected().is_some() {
            self.clock.start();
        }
    }

    /// Turn the selected part a quarter turn counter-clockwise.
    pub fn rotate_selected(&mut self) {
        if let Some(puzzle) = self.playing() {
            puzzle.rotate_selected();
            self.check_solved();
        }
    }

    /// Move the selected part to the empty cell under `point`.
    pub fn move_selected(&mut self, point: Point) {
        let Some(location) = self.geometry.screen_to_grid(point) else {
            return;
        };
        if let Some(puzzle) = self.playing() {
            puzzle.move_selected(location);
            self.check_solved();
        }
    }

    /// Drop the selection and any drag in progress.
    pub fn unselect(&mut self) {
        self.drag = None;
        if let Some(puzzle) = self.playing() {
            puzzle.unselect();
        }
    }

    /// Where the pointer is while dragging the selected part, or [`None`] when not dragging.
    pub fn set_drag(&mut self, pointer: Option<Point>) {
        self.drag = pointer;
    }

    fn check_solved(&mut self) {
        let Some((key, puzzle)) = &self.current else {
            return;
        };
        if !puzzle.is_solved() || matches!(self.clock, Clock::Stopped(_)) {
            return;
        }

        let key = *key;
        self.clock.stop();
        let elapsed = self.clock.elapsed();
        info!(puzzle = %key, elapsed = %format_elapsed(elapsed), "solved");
        self.listener.solved(key, elapsed);
    }

    /// Fly every part to its solved cell.
    ///
    /// Ignored while parts are still in flight or the solution is already showing.
    pub fn reveal_solution(&mut self) {
        if self.current.is_none() || !self.actions.is_empty() || self.mode == Mode::Solution {
            debug!(mode = %self.mode, in_flight = self.actions.len(), "ignoring solution request");
            return;
        }
        self.enter_solution();
    }

    /// Shuffle the current puzzle again and restart its clock.
    ///
    /// Ignored while parts are still in flight.
    pub fn reshuffle(&mut self) {
        if self.current.is_none() || !self.actions.is_empty() {
            debug!(mode = %self.mode, in_flight = self.actions.len(), "ignoring shuffle request");
            return;
        }
        self.clock = Clock::default();
        self.drag = None;
        self.enter_shuffle();
    }

    /// Re-fit the board into a new drawing area.
    ///
    /// Parts already in flight keep their old screen destination; where they land logically is unaffected.
    pub fn resize(&mut self, viewport: Size) {
        self.viewport = viewport;
        let cells = self.current.as_ref().map_or(1, |(_, puzzle)| puzzle.grid().size());
        self.geometry = BoardGeometry::fit(viewport, cells);
    }

    /// Whether every sink of the loaded puzzle is lit.
    pub fn is_solved(&self) -> bool {
        self.current.as_ref().is_some_and(|(_, puzzle)| puzzle.is_solved())
    }

    /// The board's pixel rectangle.
    pub fn bounds(&self) -> Rect {
        self.geometry.bounds()
    }

    /// Side length of one cell in pixels.
    pub fn cell_size(&self) -> f64 {
        self.geometry.cell_size()
    }

    /// The active mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Play time so far.
    pub fn elapsed(&self) -> Duration {
        self.clock.elapsed()
    }

    /// The loaded puzzle, if any.
    pub fn puzzle(&self) -> Option<&Puzzle> {
        self.current.as_ref().map(|(_, puzzle)| puzzle)
    }

    /// Which puzzle is loaded, if any.
    pub fn key(&self) -> Option<PuzzleKey> {
        self.current.as_ref().map(|(key, _)| *key)
    }

    /// Parts still in flight.
    pub fn actions(&self) -> &[AnimatedAction<Puzzle>] {
        &self.actions
    }

    /// Screen layout of the board.
    pub fn geometry(&self) -> &BoardGeometry {
        &self.geometry
    }
}
