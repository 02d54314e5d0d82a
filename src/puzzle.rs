use itertools::Itertools;
use rand::Rng;
use tracing::{debug, info, trace};

use crate::data::PuzzleData;
use crate::equivalence::Equivalence;
use crate::error::DataResult;
use crate::grid::Grid;
use crate::location::Location;
use crate::node::{Node, NodeId, Rotation};
use crate::trace::trace;

/// Where one movable node should land, and at what rotation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Placement {
    /// The node being placed.
    pub node: NodeId,
    /// Its destination cell.
    pub location: Location,
    /// Its rotation once placed.
    pub rotation: Rotation,
}

/// A loaded puzzle: the grid plus the player's current selection.
///
/// Every operation here is a no-op rather than an error on bad input. Clicks outside the board, on an empty cell, or on
/// a source or sink are routine, so they are simply ignored. After each mutation the sinks are re-evaluated, so
/// [`is_solved`](Self::is_solved) always reflects the current links.
#[derive(Clone, Debug)]
pub struct Puzzle {
    id: u32,
    grid: Grid,
    selected: Option<NodeId>,
}

impl Puzzle {
    /// Build the nodes for `data`.
    ///
    /// Sources and sinks are placed; movable parts are left off the board until a shuffle or solution places them.
    pub fn load(data: &PuzzleData) -> DataResult<Self> {
        let grid = Grid::from_data(data)?;
        info!(
            puzzle = data.id,
            size = data.size,
            parts = grid.movable().len(),
            sources = grid.sources().len(),
            sinks = grid.sinks().len(),
            "loaded puzzle"
        );

        let mut puzzle = Self { id: data.id, grid, selected: None };
        puzzle.evaluate();
        Ok(puzzle)
    }

    /// The developer-assigned identifier of the loaded puzzle.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Read access to the board.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The currently selected node.
    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    /// Select the movable node at `location`.
    ///
    /// Does nothing if the cell is off the board, empty, or holds a source or sink.
    pub fn select_at(&mut self, location: Location) {
        let Some(id) = self.grid.node_at(location) else {
            return;
        };
        if self.grid[id].is_stationary() {
            return;
        }
        trace!(puzzle = self.id, %location, "selected");
        self.selected = Some(id);
    }

    /// Clear the selection.
    pub fn unselect(&mut self) {
        self.selected = None;
    }

    fn selected_location(&self) -> Option<(NodeId, Location)> {
        let id = self.selected?;
        Some((id, self.grid[id].location()?))
    }

    /// Turn the selected node a quarter turn counter-clockwise, then clear the selection.
    pub fn rotate_selected(&mut self) {
        self.rotate_selected_with(Node::rotate_left);
    }

    /// Turn the selected node a quarter turn clockwise, then clear the selection.
    pub fn rotate_selected_right(&mut self) {
        self.rotate_selected_with(Node::rotate_right);
    }

    fn rotate_selected_with(&mut self, turn: fn(&mut Node)) {
        let Some((id, location)) = self.selected_location() else {
            return;
        };

        self.grid.disconnect(location);
        turn(self.grid.node_mut(id));
        self.grid.connect(location);
        trace!(puzzle = self.id, %location, rotation = self.grid[id].rotation().index(), "rotated");

        self.selected = None;
        self.evaluate();
        debug_assert!(self.grid.is_consistent());
    }

    /// Move the selected node to the vacant cell at `location`, then clear the selection.
    ///
    /// Does nothing, and keeps the selection, if the target is occupied or off the board.
    pub fn move_selected(&mut self, location: Location) {
        let Some((id, from)) = self.selected_location() else {
            return;
        };
        if !self.grid.is_vacant(location) {
            return;
        }

        self.grid.lift(id);
        self.grid.place(id, location);
        self.grid.connect(location);
        trace!(puzzle = self.id, %from, to = %location, "moved");

        self.selected = None;
        self.evaluate();
        debug_assert!(self.grid.is_consistent());
    }

    /// Link the node at `location` to every compatible neighbor. Returns the number of links made.
    pub fn connect(&mut self, location: Location) -> usize {
        self.grid.connect(location)
    }

    /// Drop every live link on the node at `location`. Returns the number of links cleared.
    pub fn disconnect(&mut self, location: Location) -> usize {
        self.grid.disconnect(location)
    }

    /// Connect every placed node, then re-evaluate the sinks.
    ///
    /// Required once all nodes of a batch have landed: random placement can leave neighbors already aligned,
    /// and those alignments only become links through a connect pass.
    pub fn connect_all(&mut self) {
        let made = self.grid.connect_all();
        debug!(puzzle = self.id, made, "connected all parts");
        self.evaluate();
    }

    /// Drop every live link on the board.
    pub fn disconnect_all(&mut self) {
        self.grid.disconnect_all();
        self.evaluate();
    }

    /// Take every movable node off the board, clearing its links and the selection.
    pub fn lift_movable(&mut self) {
        self.selected = None;
        for id in self.grid.movable().to_vec() {
            self.grid.lift(id);
        }
        self.evaluate();
    }

    /// Choose a random vacant cell and a random extra 0 to 3 left turns for each movable node.
    ///
    /// All movable nodes are lifted first, so only the fixed source and sink cells are occupied when cells are drawn.
    /// Nothing is placed; feed the result to [`commit_placement`](Self::commit_placement) one node at a time.
    pub fn plan_shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<Placement> {
        self.lift_movable();

        let size = self.grid.size();
        let mut vacant = (0..size)
            .cartesian_product(0..size)
            .map(|(y, x)| Location(x, y))
            .filter(|l| self.grid.is_vacant(*l))
            .collect_vec();

        let mut plan = Vec::with_capacity(self.grid.movable().len());
        for id in self.grid.movable() {
            if vacant.is_empty() {
                break;
            }
            let location = vacant.swap_remove(rng.gen_range(0..vacant.len()));
            let turns = rng.gen_range(0..=3u8);
            plan.push(Placement {
                node: *id,
                location,
                rotation: Rotation::new(self.grid[*id].rotation().index() + turns),
            });
        }
        plan
    }

    /// Put an off-board movable node where `placement` says, without linking it.
    ///
    /// Returns whether anything changed.
    pub fn commit_placement(&mut self, placement: &Placement) -> bool {
        let Some(node) = self.grid.get(placement.node) else {
            return false;
        };
        if node.is_stationary() || node.location().is_some() || !self.grid.is_vacant(placement.location) {
            return false;
        }

        self.grid.node_mut(placement.node).set_rotation(placement.rotation);
        self.grid.place(placement.node, placement.location)
    }

    /// Shuffle instantly: plan, place everything, then run the connect pass.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let plan = self.plan_shuffle(rng);
        for placement in &plan {
            self.commit_placement(placement);
        }
        self.connect_all();
        debug_assert!(self.grid.is_consistent());
    }

    /// The canonical solution, in solution order.
    pub fn solution_plan(&self) -> Vec<Placement> {
        self.grid
            .movable()
            .iter()
            .filter_map(|id| {
                self.grid[*id].solution().map(|target| Placement {
                    node: *id,
                    location: target.location,
                    rotation: target.rotation,
                })
            })
            .collect_vec()
    }

    /// Put `id` straight onto its solution cell at its solution rotation.
    ///
    /// The destination is known to be correct, so no links are made here; run [`connect_all`](Self::connect_all)
    /// once the whole solution has been committed. Any links the node had are dropped.
    ///
    /// Does nothing if another node holds the solution cell. Returns whether the node was placed.
    pub fn commit_solution(&mut self, id: NodeId) -> bool {
        let Some(target) = self.grid.get(id).and_then(|n| n.solution()) else {
            return false;
        };
        let occupant = self.grid.node_at(target.location);
        if occupant.is_some() && occupant != Some(id) {
            debug!(puzzle = self.id, location = %target.location, "solution cell occupied");
            return false;
        }

        self.grid.lift(id);
        self.grid.node_mut(id).set_rotation(target.rotation);
        let placed = self.grid.place(id, target.location);
        self.evaluate();
        placed
    }

    /// Whether committing every placement of `plan` and running the connect pass would leave the puzzle solved.
    ///
    /// Works on a copy; `self` is untouched.
    pub fn plan_solves(&self, plan: &[Placement]) -> bool {
        let mut trial = self.clone();
        for placement in plan {
            trial.commit_placement(placement);
        }
        trial.grid.connect_all();
        trial.evaluate();
        trial.is_solved()
    }

    /// Reveal the solution instantly.
    pub fn apply_solution(&mut self) {
        self.lift_movable();
        for id in self.grid.movable().to_vec() {
            self.commit_solution(id);
        }
        self.connect_all();
        debug_assert!(self.grid.is_consistent());
    }

    /// Recompute which sinks are lit.
    ///
    /// For each source, the reachable set is traced and its consecutive members are merged into one equivalence class;
    /// a sink is lit if it shares a class with any source.
    pub fn evaluate(&mut self) {
        let sinks = self.grid.sinks().to_vec();
        for sink in &sinks {
            self.grid.node_mut(*sink).lit = false;
        }

        for source in self.grid.sources().to_vec() {
            let path = trace(&self.grid, source);
            let mut classes = Equivalence::new(self.grid.node_count());
            for (a, b) in path.iter().tuple_windows() {
                classes.union(*a, *b);
            }
            for sink in &sinks {
                if classes.equivalent(*sink, source) {
                    self.grid.node_mut(*sink).lit = true;
                }
            }
        }

        trace!(
            puzzle = self.id,
            lit = self.sink_states().iter().filter(|(_, lit)| *lit).count(),
            sinks = sinks.len(),
            "evaluated"
        );
    }

    /// Each sink with whether it is lit.
    pub fn sink_states(&self) -> Vec<(NodeId, bool)> {
        self.grid.sinks().iter().map(|id| (*id, self.grid[*id].is_lit())).collect_vec()
    }

    /// Whether every sink is lit.
    pub fn is_solved(&self) -> bool {
        self.grid.sinks().iter().all(|id| self.grid[*id].is_lit())
    }
}
