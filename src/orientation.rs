//! Cropping and canonical orientation.
//!
//! A position is cropped to one of a few fixed board regions (a side, a
//! corner, or the whole board) by finding the smallest box covering its
//! stones and checking which region's crop box covers that. Problems can also
//! be rotated so their action always lands in a preferred corner or side.

use serde::Serialize;

use crate::bbox::BoundingBox;
use crate::constants::CROP_REGION_MIN_SIZE;
use crate::error::{Error, Result};
use crate::movetree::MoveTree;
use crate::point::{Point, Rotation};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoardRegion {
    #[default]
    All,
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    /// Crop to the stones themselves plus a small margin.
    Minimal,
    /// Pick a region from the stones.
    Auto,
}

impl BoardRegion {
    pub const CORNERS: [BoardRegion; 4] = [
        BoardRegion::TopLeft,
        BoardRegion::TopRight,
        BoardRegion::BottomLeft,
        BoardRegion::BottomRight,
    ];

    pub const SIDES: [BoardRegion; 4] = [
        BoardRegion::Top,
        BoardRegion::Bottom,
        BoardRegion::Left,
        BoardRegion::Right,
    ];

    pub fn is_corner(self) -> bool {
        Self::CORNERS.contains(&self)
    }

    pub fn is_side(self) -> bool {
        Self::SIDES.contains(&self)
    }

    /// Where this region ends up when the board is turned by `rotation`.
    pub fn rotate(self, rotation: Rotation) -> BoardRegion {
        let turns = rotation.degrees() / 90;
        (0..turns).fold(self, |region, _| region.rotate_clockwise())
    }

    fn rotate_clockwise(self) -> BoardRegion {
        use BoardRegion::*;
        match self {
            TopLeft => TopRight,
            TopRight => BottomRight,
            BottomRight => BottomLeft,
            BottomLeft => TopLeft,
            Top => Right,
            Right => Bottom,
            Bottom => Left,
            Left => Top,
            other => other,
        }
    }
}

// =============================================================================
// Crop boxes
// =============================================================================

/// The fixed crop box for `region` on a `size` board.
///
/// Side crops run one line past the middle; corner crops one line past in
/// height and two in width.
pub fn crop_box(region: BoardRegion, size: usize) -> Result<BoundingBox> {
    let max = size.saturating_sub(1);
    let half = max.div_ceil(2);
    let low = |d: usize| half.saturating_sub(d);
    let high = |d: usize| (half + d).min(max);
    let (left, top, right, bot) = match region {
        BoardRegion::All => (0, 0, max, max),
        BoardRegion::Left => (0, 0, high(1), max),
        BoardRegion::Right => (low(1), 0, max, max),
        BoardRegion::Top => (0, 0, max, high(1)),
        BoardRegion::Bottom => (0, low(1), max, max),
        BoardRegion::TopLeft => (0, 0, high(2), high(1)),
        BoardRegion::TopRight => (low(2), 0, max, high(1)),
        BoardRegion::BottomLeft => (0, low(1), high(2), max),
        BoardRegion::BottomRight => (low(2), low(1), max, max),
        BoardRegion::Minimal | BoardRegion::Auto => return Err(Error::UnresolvedRegion(region)),
    };
    BoundingBox::new(Point::new(left, top), Point::new(right, bot))
}

/// Region lookup table for one board size, checked in order.
///
/// Boxes where two corner crops overlap come first: a position sitting in the
/// overlap of the two top corners is shown as the whole top side, and one in
/// the overlap of all four is shown as the whole board.
#[derive(Clone, Debug)]
pub struct CropRegions {
    size: usize,
    table: Vec<(BoardRegion, BoundingBox)>,
}

impl CropRegions {
    pub fn new(size: usize) -> Self {
        let full = BoundingBox::full_board(size);
        let corner = |region| crop_box(region, size).unwrap_or(full);
        let tl = corner(BoardRegion::TopLeft);
        let tr = corner(BoardRegion::TopRight);
        let bl = corner(BoardRegion::BottomLeft);
        let br = corner(BoardRegion::BottomRight);

        let mut table = Vec::new();
        let center = tl
            .intersect(&tr)
            .and_then(|b| b.intersect(&bl))
            .and_then(|b| b.intersect(&br));
        let overlaps = [
            (BoardRegion::All, center),
            (BoardRegion::Top, tl.intersect(&tr)),
            (BoardRegion::Bottom, bl.intersect(&br)),
            (BoardRegion::Left, tl.intersect(&bl)),
            (BoardRegion::Right, tr.intersect(&br)),
        ];
        table.extend(overlaps.into_iter().filter_map(|(region, bbox)| Some((region, bbox?))));
        for region in BoardRegion::CORNERS.into_iter().chain(BoardRegion::SIDES) {
            table.push((region, crop_box(region, size).unwrap_or(full)));
        }
        table.push((BoardRegion::All, full));
        Self { size, table }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// First region whose box covers `bbox`.
    pub fn classify(&self, bbox: &BoundingBox) -> Result<BoardRegion> {
        self.table
            .iter()
            .find(|(_, region_box)| region_box.covers(bbox))
            .map(|(region, _)| *region)
            .ok_or_else(|| Error::UncoveredRegion(format!("{bbox:?}")))
    }
}

// =============================================================================
// Minimal bounding box
// =============================================================================

/// Smallest box around the interesting points of `movetree`.
///
/// - `None`: every stone placed or played anywhere in the tree.
/// - `Some(&[])`: stones and marks of the current node.
/// - `Some(path)`: stones of each node along `path`, with the marks of the
///   node the path ends at.
///
/// With nothing to cover, the whole board.
pub fn minimal_bounding_box(
    movetree: &MoveTree,
    next_moves: Option<&[usize]>,
) -> Result<BoundingBox> {
    let size = movetree.intersections();
    let mut points: Vec<Point> = Vec::new();

    match next_moves {
        None => {
            let mut result = Ok(());
            movetree.recurse_from_root(|mt| {
                if result.is_err() {
                    return;
                }
                match mt.properties().get_all_stones() {
                    Ok(stones) => points.extend(stones.iter().filter_map(|mv| mv.point)),
                    Err(e) => result = Err(e),
                }
            });
            result?;
        }
        Some([]) => {
            let props = movetree.properties();
            points.extend(props.get_all_stones()?.iter().filter_map(|mv| mv.point));
            points.extend(props.get_all_mark_points()?);
        }
        Some(path) => {
            let mut mt = movetree.new_tree_ref();
            for &idx in path {
                if !mt.move_down(idx) {
                    break;
                }
                let stones = mt.properties().get_all_stones()?;
                points.extend(stones.iter().filter_map(|mv| mv.point));
            }
            points.extend(mt.properties().get_all_mark_points()?);
        }
    }

    points.retain(|pt| pt.in_bounds(size));
    Ok(BoundingBox::from_points(&points).unwrap_or_else(|| BoundingBox::full_board(size)))
}

/// The board region `movetree`'s stones fall in. Boards smaller than 19x19
/// are never cropped.
pub fn quad_crop_from_movetree(
    regions: &CropRegions,
    movetree: &MoveTree,
    next_moves: Option<&[usize]>,
) -> Result<BoardRegion> {
    let size = movetree.intersections();
    if size < CROP_REGION_MIN_SIZE {
        return Ok(BoardRegion::All);
    }
    let bbox = minimal_bounding_box(movetree, next_moves)?;
    if regions.size() == size {
        regions.classify(&bbox)
    } else {
        CropRegions::new(size).classify(&bbox)
    }
}

// =============================================================================
// Canonical rotation
// =============================================================================

/// Where rotated problems should end up.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RegionOrdering {
    pub corner: BoardRegion,
    pub side: BoardRegion,
}

impl Default for RegionOrdering {
    fn default() -> Self {
        Self {
            corner: BoardRegion::TopRight,
            side: BoardRegion::Top,
        }
    }
}

fn corner_degrees(region: BoardRegion) -> Option<i32> {
    match region {
        BoardRegion::TopLeft => Some(0),
        BoardRegion::BottomLeft => Some(90),
        BoardRegion::BottomRight => Some(180),
        BoardRegion::TopRight => Some(270),
        _ => None,
    }
}

fn side_degrees(region: BoardRegion) -> Option<i32> {
    match region {
        BoardRegion::Top => Some(0),
        BoardRegion::Left => Some(90),
        BoardRegion::Bottom => Some(180),
        BoardRegion::Right => Some(270),
        _ => None,
    }
}

/// Rotation that moves `movetree`'s action into the preferred corner or side.
/// Whole-board positions are left alone.
pub fn find_canonical_rotation(
    regions: &CropRegions,
    movetree: &MoveTree,
    ordering: &RegionOrdering,
) -> Result<Rotation> {
    let region = quad_crop_from_movetree(regions, movetree, None)?;
    let degrees = if region.is_corner() {
        corner_degrees(region).zip(corner_degrees(ordering.corner))
    } else if region.is_side() {
        side_degrees(region).zip(side_degrees(ordering.side))
    } else {
        None
    };
    Ok(degrees
        .and_then(|(start, end)| Rotation::from_degrees(360 + start - end))
        .unwrap_or_default())
}

/// `bbox` turned by `rotation` on a `size` board.
pub fn rotate_bounding_box(
    bbox: &BoundingBox,
    size: usize,
    rotation: Rotation,
) -> Result<BoundingBox> {
    let corners = [
        bbox.top_left().rotate(size, rotation)?,
        bbox.bot_right().rotate(size, rotation)?,
    ];
    Ok(BoundingBox::from_points(&corners).unwrap_or(*bbox))
}
