//! Fixed tables for board geometry, cropping, and labeling.
//!
//! Board size is a runtime value (it comes from the `SZ` property of a move
//! tree), so everything here is either size-independent or keyed by size.

use crate::point::Point;

// =============================================================================
// Board Geometry
// =============================================================================

/// Board size assumed when a tree carries no `SZ` property.
pub const DEFAULT_BOARD_SIZE: usize = 19;

/// Smallest board on which quadrant cropping applies. Smaller boards are
/// always shown whole.
pub const CROP_REGION_MIN_SIZE: usize = 19;

const STAR_POINTS_9: [Point; 5] = [
    Point::new(2, 2),
    Point::new(6, 2),
    Point::new(4, 4),
    Point::new(2, 6),
    Point::new(6, 6),
];

const STAR_POINTS_13: [Point; 5] = [
    Point::new(3, 3),
    Point::new(9, 3),
    Point::new(6, 6),
    Point::new(3, 9),
    Point::new(9, 9),
];

const STAR_POINTS_19: [Point; 9] = [
    Point::new(3, 3),
    Point::new(9, 3),
    Point::new(15, 3),
    Point::new(3, 9),
    Point::new(9, 9),
    Point::new(15, 9),
    Point::new(3, 15),
    Point::new(9, 15),
    Point::new(15, 15),
];

/// Star points (hoshi) for the standard sizes; other sizes have none.
pub fn star_points(size: usize) -> &'static [Point] {
    match size {
        9 => &STAR_POINTS_9,
        13 => &STAR_POINTS_13,
        19 => &STAR_POINTS_19,
        _ => &[],
    }
}

// =============================================================================
// Cropping
// =============================================================================

/// Lines of padding added around the minimal bounding box for the
/// `Minimal` board region.
pub const MINIMAL_CROP_MARGIN: usize = 1;

// =============================================================================
// Next Moves
// =============================================================================

/// How far `find_next_moves_path` walks up the tree by default.
pub const DEFAULT_NEXT_MOVES_LIMIT: usize = 20;

// =============================================================================
// Labels
// =============================================================================

/// Labels handed out, in order, to moves played on top of an existing stone.
pub const COLLISION_LABELS: &str = "abcdefghijklmnopqrstuvwxyz";
