use strum::VariantArray;

use crate::direction::Direction;
use crate::grid::Grid;
use crate::node::NodeId;

/// Collect every node reachable from `start` by following live links only.
///
/// The walk is depth-first and prefers north, east, south, then west, so the order of the result is reproducible.
/// `start` is always first. Each node appears at most once, so the result never holds more than
/// [`Grid::node_count`] entries. Open and capped slots are never followed.
///
/// All traversal state lives in this call; nothing is shared between invocations.
pub fn trace(grid: &Grid, start: NodeId) -> Vec<NodeId> {
    if grid.get(start).is_none() {
        return Vec::new();
    }

    let mut visited = vec![false; grid.node_count()];
    let mut path = Vec::new();
    let mut stack = vec![start];

    while let Some(current) = stack.pop() {
        if visited[current.index()] {
            continue;
        }
        visited[current.index()] = true;
        path.push(current);

        // reversed so that north comes off the stack first
        for direction in Direction::VARIANTS.iter().rev() {
            if let Some(next) = grid[current].link(*direction) {
                if !visited[next.index()] {
                    stack.push(next);
                }
            }
        }
    }

    path
}
