//! Cardinal-direction calculus.
//!
//! Directions are encoded on a fixed cycle where adding or subtracting one
//! (mod 4) is a 90° turn. The rotation math relies on this encoding; don't
//! change the discriminants.

/// Robot facing, one of four cardinal values.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Left = 0,
    Forward = 1,
    Right = 2,
    Back = 3,
}

/// Turn sense for an in-place rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sense {
    Left,
    Right,
}

/// A rotation plan: how many 90° turns, and which way.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rotation {
    pub turns: u8,
    pub sense: Sense,
}

impl Direction {
    /// Direction implied by a unit 4-connected path delta.
    ///
    /// Exactly one of `dx`, `dy` must be ±1; anything else (diagonal or
    /// zero deltas) has no defined facing and maps to `None`. Path
    /// following only ever produces unit steps, so a `None` here means the
    /// caller handed us a malformed path.
    pub fn from_delta(dx: i32, dy: i32) -> Option<Direction> {
        match (dx, dy) {
            (-1, 0) => Some(Direction::Left),
            (1, 0) => Some(Direction::Right),
            (0, -1) => Some(Direction::Back),
            (0, 1) => Some(Direction::Forward),
            _ => None,
        }
    }

    /// Unit travel delta for this facing: left/right move along x,
    /// forward/back along y. This is the sign convention the dead-reckoning
    /// accumulator uses.
    pub fn unit_delta(self) -> (i32, i32) {
        match self {
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Forward => (0, 1),
            Direction::Back => (0, -1),
        }
    }

    /// Facing after one 90° turn in the given sense.
    pub fn rotated(self, sense: Sense) -> Direction {
        let step = match sense {
            Sense::Left => 3, // -1 mod 4
            Sense::Right => 1,
        };
        Self::from_ordinal((self as u8 + step) % 4)
    }

    fn from_ordinal(v: u8) -> Direction {
        match v {
            0 => Direction::Left,
            1 => Direction::Forward,
            2 => Direction::Right,
            3 => Direction::Back,
            _ => unreachable!("ordinal masked to 0..4"),
        }
    }

    /// Handy for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Forward => "forward",
            Direction::Right => "right",
            Direction::Back => "back",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimal rotation taking `current` to `next`.
///
/// The cyclic encoding makes this a signed difference, with one
/// normalization: three steps one way is the same as one step the other,
/// so |delta| == 3 collapses to a single opposite-sense turn. The result
/// is always 0, 1 or 2 turns.
pub fn rotation_between(current: Direction, next: Direction) -> Rotation {
    let mut delta = next as i8 - current as i8;
    if delta.abs() == 3 {
        delta = -delta.signum();
    }
    let sense = if delta < 0 { Sense::Left } else { Sense::Right };
    Rotation {
        turns: delta.unsigned_abs(),
        sense,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Forward,
        Direction::Right,
        Direction::Back,
    ];

    #[test]
    fn from_delta_maps_unit_steps() {
        assert_eq!(Direction::from_delta(-1, 0), Some(Direction::Left));
        assert_eq!(Direction::from_delta(1, 0), Some(Direction::Right));
        assert_eq!(Direction::from_delta(0, -1), Some(Direction::Back));
        assert_eq!(Direction::from_delta(0, 1), Some(Direction::Forward));
    }

    #[test]
    fn from_delta_rejects_non_unit_steps() {
        assert_eq!(Direction::from_delta(0, 0), None);
        assert_eq!(Direction::from_delta(1, 1), None);
        assert_eq!(Direction::from_delta(-1, 1), None);
        assert_eq!(Direction::from_delta(2, 0), None);
    }

    #[test]
    fn rotation_cycle_closes() {
        // For every (current, next) pair: at most two turns, and applying
        // them in the returned sense lands exactly on `next`.
        for current in ALL {
            for next in ALL {
                let r = rotation_between(current, next);
                assert!(r.turns <= 2, "{current}->{next} took {} turns", r.turns);

                let mut facing = current;
                for _ in 0..r.turns {
                    facing = facing.rotated(r.sense);
                }
                assert_eq!(facing, next, "{current}->{next} via {:?}", r);
            }
        }
    }

    #[test]
    fn wraparound_is_one_turn() {
        // Back(3) -> Left(0) is delta -3, normalized to a single right turn
        let r = rotation_between(Direction::Back, Direction::Left);
        assert_eq!(r, Rotation { turns: 1, sense: Sense::Right });

        // Left(0) -> Back(3) is delta +3, normalized to a single left turn
        let r = rotation_between(Direction::Left, Direction::Back);
        assert_eq!(r, Rotation { turns: 1, sense: Sense::Left });
    }

    #[test]
    fn opposite_directions_take_two_turns() {
        let r = rotation_between(Direction::Forward, Direction::Back);
        assert_eq!(r.turns, 2);
        let r = rotation_between(Direction::Left, Direction::Right);
        assert_eq!(r.turns, 2);
    }

    #[test]
    fn unit_delta_round_trips_through_from_delta() {
        for d in ALL {
            let (dx, dy) = d.unit_delta();
            assert_eq!(Direction::from_delta(dx, dy), Some(d));
        }
    }
}
