//! Marga-Grid: grid map and path planning for Yatra
//!
//! Provides the planning-side building blocks for the navigation stack:
//!
//! - [`grid`]: a dense cell arena with per-cell search state and sticky
//!   obstacle memory
//! - [`search`]: 4-connected A* with a Manhattan heuristic
//! - [`direction`]: the cardinal-direction calculus that converts path
//!   deltas into physical 90° turns
//!
//! ## Coordinate frame
//!
//! Grid coordinates are row-major with `x` increasing to the right and `y`
//! increasing forward (the robot's canonical facing). One cell edge equals
//! one unit move; physical scale is applied by the executor.

pub mod direction;
pub mod grid;
pub mod search;

pub use direction::{rotation_between, Direction, Rotation, Sense};
pub use grid::{Cell, GridCoord, GridError, GridMap};
pub use search::find_path;
