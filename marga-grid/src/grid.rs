//! Grid map storage.
//!
//! The map owns a dense row-major arena of [`Cell`]s. Search state lives in
//! the cells themselves (open/closed flags, costs, parent links), which
//! keeps the A* inner loop allocation-free after the map is built. Parent
//! links are arena indices, never references, so a path can be recovered
//! after the search without holding borrows across the map.

use thiserror::Error;

/// Cost sentinel for cells not yet reached by a search.
pub const COST_UNSET: u32 = u32::MAX;

/// Grid map error type
#[derive(Debug, Error)]
pub enum GridError {
    /// The cell arena could not be reserved
    #[error("failed to allocate grid of {cells} cells")]
    Allocation { cells: usize },

    /// Dimensions must be positive
    #[error("invalid grid dimensions {dim_x}x{dim_y}")]
    InvalidDimensions { dim_x: i32, dim_y: i32 },

    /// Coordinate outside the allocated grid
    #[error("coordinate ({x}, {y}) outside grid")]
    OutOfBounds { x: i32, y: i32 },
}

/// A grid coordinate (cell units)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridCoord {
    pub x: i32,
    pub y: i32,
}

impl GridCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for GridCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// One map cell with its search bookkeeping.
///
/// A cell is in at most one of the open or closed sets at any time. The
/// `blocked` flag is obstacle memory and survives re-initialization when
/// requested; everything else is per-search state.
#[derive(Clone, Debug)]
pub struct Cell {
    /// Location; uniquely identifies the cell within its map
    pub x: i32,
    pub y: i32,
    /// Path cost from the search start ([`COST_UNSET`] until reached)
    pub g: u32,
    /// Heuristic distance to the goal ([`COST_UNSET`] until reached)
    pub h: u32,
    /// Total cost `g + h`; meaningful only once `g` and `h` are set
    pub f: u32,
    /// On the open (frontier) list
    pub open: bool,
    /// Finalized by the search
    pub closed: bool,
    /// Known obstacle; sticky across searches unless explicitly cleared
    pub blocked: bool,
    /// Back-link to the parent cell, as an index into the map's arena
    pub prev: Option<u32>,
}

impl Cell {
    fn new(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            g: COST_UNSET,
            h: COST_UNSET,
            f: COST_UNSET,
            open: false,
            closed: false,
            blocked: false,
            prev: None,
        }
    }

    /// Coordinate of this cell
    pub fn coord(&self) -> GridCoord {
        GridCoord::new(self.x, self.y)
    }

    /// Reset per-search state, keeping coordinates and (optionally) the
    /// blocked flag.
    fn reset(&mut self, preserve_blocked: bool) {
        self.g = COST_UNSET;
        self.h = COST_UNSET;
        self.f = COST_UNSET;
        self.open = false;
        self.closed = false;
        self.prev = None;
        if !preserve_blocked {
            self.blocked = false;
        }
    }
}

/// Dense row-major grid of [`Cell`]s.
#[derive(Clone, Debug)]
pub struct GridMap {
    dim_x: i32,
    dim_y: i32,
    cells: Vec<Cell>,
}

impl GridMap {
    /// Allocate a `dim_x` x `dim_y` map with every cell pre-populated with
    /// its own coordinates and all search state cleared.
    pub fn alloc(dim_x: i32, dim_y: i32) -> Result<Self, GridError> {
        if dim_x <= 0 || dim_y <= 0 {
            return Err(GridError::InvalidDimensions { dim_x, dim_y });
        }
        let count = (dim_x as usize)
            .checked_mul(dim_y as usize)
            .ok_or(GridError::Allocation { cells: usize::MAX })?;

        let mut cells = Vec::new();
        cells
            .try_reserve_exact(count)
            .map_err(|_| GridError::Allocation { cells: count })?;

        for y in 0..dim_y {
            for x in 0..dim_x {
                cells.push(Cell::new(x, y));
            }
        }
        debug_assert_eq!(cells.len(), count);

        log::debug!("allocated {}x{} grid ({} cells)", dim_x, dim_y, count);
        Ok(Self { dim_x, dim_y, cells })
    }

    /// Grid width in cells
    #[inline]
    pub fn dim_x(&self) -> i32 {
        self.dim_x
    }

    /// Grid height in cells
    #[inline]
    pub fn dim_y(&self) -> i32 {
        self.dim_y
    }

    /// Whether a coordinate lies inside the allocated grid
    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.dim_x && y < self.dim_y
    }

    /// Row-major arena index for a coordinate
    #[inline]
    pub fn index(&self, x: i32, y: i32) -> Option<usize> {
        if self.in_bounds(x, y) {
            Some(x as usize + self.dim_x as usize * y as usize)
        } else {
            None
        }
    }

    /// Cell at a coordinate
    pub fn cell(&self, x: i32, y: i32) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    /// Mutable cell at a coordinate
    pub fn cell_mut(&mut self, x: i32, y: i32) -> Option<&mut Cell> {
        self.index(x, y).map(move |i| &mut self.cells[i])
    }

    /// Cell by arena index (as stored in [`Cell::prev`])
    pub fn cell_by_index(&self, index: u32) -> Option<&Cell> {
        self.cells.get(index as usize)
    }

    pub(crate) fn cell_by_index_mut(&mut self, index: usize) -> &mut Cell {
        &mut self.cells[index]
    }

    /// Mark or clear an obstacle.
    pub fn set_blocked(&mut self, x: i32, y: i32, blocked: bool) -> Result<(), GridError> {
        let cell = self
            .cell_mut(x, y)
            .ok_or(GridError::OutOfBounds { x, y })?;
        cell.blocked = blocked;
        Ok(())
    }

    /// Whether a coordinate is a known obstacle. Out-of-bounds reads as
    /// blocked so callers cannot plan through the map edge.
    pub fn is_blocked(&self, x: i32, y: i32) -> bool {
        self.cell(x, y).map(|c| c.blocked).unwrap_or(true)
    }

    /// Reset every cell's search state. With `preserve_blocked` the
    /// accumulated obstacle memory is kept, so repeated searches on the
    /// same map route around everything discovered so far.
    pub fn initialize(&mut self, preserve_blocked: bool) {
        for cell in &mut self.cells {
            cell.reset(preserve_blocked);
        }
    }
}
