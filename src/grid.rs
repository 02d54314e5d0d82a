use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::ops::Index;

use itertools::Itertools;
use ndarray::Array2;
use strum::VariantArray;
use unordered_pair::UnorderedPair;

use crate::data::PuzzleData;
use crate::direction::Direction;
use crate::error::DataResult;
use crate::location::Location;
use crate::node::{Node, NodeId, PartKind, Slot};

/// The board: an arena of nodes plus the cell array saying which node sits where.
///
/// The cell array is authoritative for placement; each node's stored location mirrors it.
/// Nodes are created once per puzzle load and live until the grid is dropped.
#[derive(Clone, Debug)]
pub struct Grid {
    size: usize,
    cells: Array2<Option<NodeId>>,
    nodes: Vec<Node>,
    movable: Vec<NodeId>,
    sources: Vec<NodeId>,
    sinks: Vec<NodeId>,
}

impl Grid {
    /// Build the arena for `data`.
    ///
    /// Sources and sinks are placed at their fixed cells; movable parts start off the board, in solution order.
    pub(crate) fn from_data(data: &PuzzleData) -> DataResult<Self> {
        data.validate()?;

        let mut grid = Self {
            size: data.size,
            cells: Array2::from_elem((data.size, data.size), None),
            nodes: Vec::with_capacity(data.sources.len() + data.sinks.len() + data.solution.len()),
            movable: Vec::with_capacity(data.solution.len()),
            sources: Vec::with_capacity(data.sources.len()),
            sinks: Vec::with_capacity(data.sinks.len()),
        };

        for (kind, terminals) in [(PartKind::Source, &data.sources), (PartKind::Sink, &data.sinks)] {
            for terminal in terminals {
                let id = grid.push(Node::terminal(kind, terminal.orientation, terminal.location()));
                grid.cells[terminal.location().as_index()] = Some(id);
                match kind {
                    PartKind::Source => grid.sources.push(id),
                    _ => grid.sinks.push(id),
                }
            }
        }

        for entry in &data.solution {
            let id = grid.push(Node::part(entry.part_kind()?, Some(entry.target())));
            grid.movable.push(id);
        }

        Ok(grid)
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// The board is `size` by `size` cells.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Total number of nodes, placed or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Look up a node by id.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Every node with its id, in arena order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Movable parts, in solution order.
    pub fn movable(&self) -> &[NodeId] {
        &self.movable
    }

    /// Source nodes, in load order.
    pub fn sources(&self) -> &[NodeId] {
        &self.sources
    }

    /// Sink nodes, in load order.
    pub fn sinks(&self) -> &[NodeId] {
        &self.sinks
    }

    /// The node at `location`, or [`None`] if the cell is empty or off the board.
    pub fn node_at(&self, location: Location) -> Option<NodeId> {
        self.cells.get(location.as_index()).copied().flatten()
    }

    /// Whether `location` is on the board and holds nothing.
    pub fn is_vacant(&self, location: Location) -> bool {
        location.within(self.size) && self.node_at(location).is_none()
    }

    /// Put an off-board node onto a vacant cell. Does not link anything.
    ///
    /// Returns whether the node was placed.
    pub(crate) fn place(&mut self, id: NodeId, location: Location) -> bool {
        if self.nodes[id.0].location.is_some() || !self.is_vacant(location) {
            return false;
        }
        self.cells[location.as_index()] = Some(id);
        self.nodes[id.0].location = Some(location);
        true
    }

    /// Take a node off the board, dropping any live links first.
    pub(crate) fn lift(&mut self, id: NodeId) {
        let Some(location) = self.nodes[id.0].location else {
            return;
        };
        self.disconnect(location);
        self.cells[location.as_index()] = None;
        self.nodes[id.0].location = None;
    }

    /// Link every uncapped, unlinked side of the node at `location` to a neighbor whose facing side is also uncapped and unlinked.
    ///
    /// Returns the number of links made.
    pub(crate) fn connect(&mut self, location: Location) -> usize {
        let Some(id) = self.node_at(location) else {
            return 0;
        };

        let mut made = 0;
        for direction in Direction::VARIANTS {
            if self.nodes[id.0].slot(*direction) != Slot::Open {
                continue;
            }
            let Some(neighbor) = direction.attempt_from(location, self.size).and_then(|l| self.node_at(l)) else {
                continue;
            };
            if self.nodes[neighbor.0].slot(direction.invert()) != Slot::Open {
                continue;
            }
            *self.nodes[id.0].slot_mut(*direction) = Slot::Linked(neighbor);
            *self.nodes[neighbor.0].slot_mut(direction.invert()) = Slot::Linked(id);
            made += 1;
        }
        made
    }

    /// Clear both ends of every live link on the node at `location`. Caps are never touched.
    ///
    /// Returns the number of links cleared.
    pub(crate) fn disconnect(&mut self, location: Location) -> usize {
        let Some(id) = self.node_at(location) else {
            return 0;
        };

        let mut cleared = 0;
        for direction in Direction::VARIANTS {
            let Slot::Linked(neighbor) = self.nodes[id.0].slot(*direction) else {
                continue;
            };
            *self.nodes[id.0].slot_mut(*direction) = Slot::Open;
            let mirrored = self.nodes[neighbor.0].slot_mut(direction.invert());
            if *mirrored == Slot::Linked(id) {
                *mirrored = Slot::Open;
            }
            cleared += 1;
        }
        cleared
    }

    fn placed_locations(&self) -> Vec<Location> {
        self.nodes.iter().filter_map(|n| n.location).collect_vec()
    }

    /// Run [`connect`](Self::connect) on every placed node.
    pub(crate) fn connect_all(&mut self) -> usize {
        self.placed_locations().into_iter().map(|l| self.connect(l)).sum()
    }

    /// Run [`disconnect`](Self::disconnect) on every placed node.
    pub(crate) fn disconnect_all(&mut self) -> usize {
        self.placed_locations().into_iter().map(|l| self.disconnect(l)).sum()
    }

    /// Every live link, once per pair.
    pub fn links(&self) -> HashSet<UnorderedPair<NodeId>> {
        self.nodes()
            .flat_map(|(id, node)| node.links().map(move |(_, other)| UnorderedPair(id, other)))
            .collect()
    }

    /// Check the placement and link invariants.
    ///
    /// Placement: the cell array and each node's stored location agree.
    /// Links: every live link is mirrored by the neighbor, and the neighbor really is adjacent on that side.
    pub fn is_consistent(&self) -> bool {
        let cells_agree = self.cells.indexed_iter().all(|(index, cell)| match cell {
            Some(id) => self.nodes[id.0].location == Some(Location::from_index(index)),
            None => true,
        });
        let nodes_agree = self.nodes().all(|(id, node)| match node.location {
            Some(location) => self.node_at(location) == Some(id),
            None => node.links().next().is_none(),
        });
        let links_mirrored = self.nodes().all(|(id, node)| {
            node.links().all(|(direction, other)| {
                let adjacent = node.location.and_then(|l| direction.attempt_from(l, self.size));
                self.nodes[other.0].link(direction.invert()) == Some(id)
                    && adjacent.is_some()
                    && adjacent == self.nodes[other.0].location
            })
        });

        cells_agree && nodes_agree && links_mirrored
    }

    fn glyph(node: &Node) -> char {
        match node.kind() {
            PartKind::Source => return 'S',
            PartKind::Sink => return if node.is_lit() { 'D' } else { 'd' },
            _ => {}
        }

        use Direction::*;
        match node.openings().as_slice() {
            [North, South] => '│',
            [East, West] => '─',
            [North, East] => '└',
            [East, South] => '┌',
            [South, West] => '┐',
            [North, West] => '┘',
            [North, East, South] => '├',
            [East, South, West] => '┬',
            [North, South, West] => '┤',
            [North, East, West] => '┴',
            [North, East, South, West] => '┼',
            _ => '?',
        }
    }
}

impl Index<NodeId> for Grid {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Self::Output {
        &self.nodes[id.0]
    }
}

impl Display for Grid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut out = String::with_capacity(self.cells.nrows() * (self.cells.ncols() + 1) * 3);

        for row in self.cells.rows() {
            for cell in row {
                out.push(match cell {
                    Some(id) => Self::glyph(&self.nodes[id.0]),
                    None => '.',
                });
            }
            out.push('\n');
        }

        write!(f, "{}", out)
    }
}
