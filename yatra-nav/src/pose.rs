//! Dead-reckoned robot pose.

use marga_grid::Direction;

/// Robot facing plus accumulated position in millimeters.
///
/// The position is integrated from per-tick travel estimates signed by the
/// current facing: left/right move along x, forward/back along y. There is
/// no ground-truth correction, so it drifts with wheel slip; that is an
/// accepted limitation of the platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pose {
    pub facing: Direction,
    pub x_mm: i32,
    pub y_mm: i32,
}

impl Pose {
    /// Starting pose: origin, facing forward.
    pub fn origin() -> Self {
        Pose {
            facing: Direction::Forward,
            x_mm: 0,
            y_mm: 0,
        }
    }

    /// Integrate travel along the current facing. Negative distance is
    /// reverse travel.
    pub fn advance(&mut self, distance_mm: i32) {
        let (dx, dy) = self.facing.unit_delta();
        self.x_mm += dx * distance_mm;
        self.y_mm += dy * distance_mm;
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::origin()
    }
}

impl std::fmt::Display for Pose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({} mm, {} mm) facing {}",
            self.x_mm, self.y_mm, self.facing
        )
    }
}
