//! A* search over the grid map.
//!
//! 4-connected movement with a Manhattan heuristic, which is admissible and
//! consistent on a uniform-cost grid, so the first time the goal closes the
//! path through the `prev` chain is shortest.
//!
//! The search mutates the map's per-cell bookkeeping; callers reset it with
//! [`GridMap::initialize`] before each search (passing `preserve_blocked =
//! true` to keep obstacle memory between replans).

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::grid::{GridCoord, GridMap};

/// Neighbor offsets for 4-connected movement. Diagonals are not moves this
/// robot can make.
const NEIGHBORS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Heap entry: a snapshot of a cell's total cost at insertion time.
///
/// Ordering is reversed on `f` so the `BinaryHeap` behaves as a min-heap.
/// A popped entry whose cell has since closed is stale and skipped.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct OpenEntry {
    f: u32,
    index: usize,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.f.cmp(&self.f)
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Manhattan distance between two cells.
fn heuristic(ax: i32, ay: i32, b: GridCoord) -> u32 {
    ax.abs_diff(b.x) + ay.abs_diff(b.y)
}

/// Find a shortest 4-connected path from `start` to `goal`.
///
/// Returns the inclusive cell chain `start..=goal`, or `None` when the goal
/// is unreachable (the open set drained without closing it). Unreachable is
/// an expected outcome, not an error; after the call the goal cell's
/// `closed` flag records the same answer.
///
/// The map must have been reset with [`GridMap::initialize`] since the last
/// search.
pub fn find_path(map: &mut GridMap, start: GridCoord, goal: GridCoord) -> Option<Vec<GridCoord>> {
    log::trace!("find_path: start={} goal={}", start, goal);

    let Some(start_idx) = map.index(start.x, start.y) else {
        log::debug!("find_path: start {} outside grid", start);
        return None;
    };
    let Some(goal_idx) = map.index(goal.x, goal.y) else {
        log::debug!("find_path: goal {} outside grid", goal);
        return None;
    };

    let mut open = BinaryHeap::new();

    // Seed the start cell.
    {
        let cell = map.cell_mut(start.x, start.y).expect("start in bounds");
        cell.g = 0;
        cell.h = heuristic(start.x, start.y, goal);
        cell.f = cell.g + cell.h;
        cell.open = true;
        open.push(OpenEntry {
            f: cell.f,
            index: start_idx,
        });
    }

    while let Some(entry) = open.pop() {
        // Stale heap entry for a cell that already closed.
        if map.cell_by_index(entry.index as u32).expect("valid index").closed {
            continue;
        }

        let (cx, cy, cg) = {
            let cell = map.cell_by_index_mut(entry.index);
            cell.open = false;
            cell.closed = true;
            (cell.x, cell.y, cell.g)
        };

        if entry.index == goal_idx {
            break;
        }

        for (dx, dy) in NEIGHBORS {
            let (nx, ny) = (cx + dx, cy + dy);
            let Some(n_idx) = map.index(nx, ny) else {
                continue;
            };
            let adj = map.cell_by_index_mut(n_idx);
            if adj.blocked || adj.closed {
                continue;
            }

            // Relax only on strict improvement. The unset sentinel is the
            // maximum cost, so unvisited neighbors always take this branch.
            let g = cg + 1;
            if g < adj.g {
                let h = heuristic(nx, ny, goal);
                adj.prev = Some(entry.index as u32);
                adj.g = g;
                adj.h = h;
                adj.f = g + h;
                adj.open = true;
                // Decrease-key by reinsertion; the superseded entry is
                // skipped as stale when it surfaces.
                let f = adj.f;
                open.push(OpenEntry { f, index: n_idx });
            }
        }
    }

    if !map.cell_by_index(goal_idx as u32).expect("valid index").closed {
        log::debug!("find_path: goal {} unreachable from {}", goal, start);
        return None;
    }

    // Walk the prev chain back from the goal and reverse it.
    let mut path = Vec::new();
    let mut cursor = goal_idx as u32;
    loop {
        let cell = map.cell_by_index(cursor).expect("valid prev index");
        path.push(cell.coord());
        match cell.prev {
            Some(prev) => cursor = prev,
            None => break,
        }
    }
    path.reverse();

    log::debug!(
        "find_path: {} -> {} in {} moves",
        start,
        goal,
        path.len().saturating_sub(1)
    );
    Some(path)
}
