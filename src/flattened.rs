//! The flattened snapshot handed to diagram renderers.
//!
//! Everything here is plain data: a cropped grid of [`Intersection`]s plus the
//! bookkeeping a renderer needs to annotate a diagram (collisions, move
//! numbers, comment).

use std::collections::BTreeMap;

use serde::Serialize;

use crate::bbox::BoundingBox;
use crate::constants::star_points;
use crate::error::Result;
use crate::goban::{Color, Move};
use crate::orientation::BoardRegion;
use crate::point::{Point, Rotation};
use crate::problems::ProblemResult;
use crate::properties::{MARK_PROPS, Prop, Properties};

// =============================================================================
// Symbols
// =============================================================================

/// The board line drawing under an intersection. Depends only on position.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BaseSymbol {
    TopLeft,
    TopRight,
    BotLeft,
    BotRight,
    TopEdge,
    BotEdge,
    LeftEdge,
    RightEdge,
    Center,
    CenterStarpoint,
}

impl BaseSymbol {
    pub fn at(pt: Point, size: usize) -> BaseSymbol {
        let max = size.saturating_sub(1);
        match (pt.x, pt.y) {
            (0, 0) => BaseSymbol::TopLeft,
            (x, 0) if x == max => BaseSymbol::TopRight,
            (0, y) if y == max => BaseSymbol::BotLeft,
            (x, y) if x == max && y == max => BaseSymbol::BotRight,
            (_, 0) => BaseSymbol::TopEdge,
            (_, y) if y == max => BaseSymbol::BotEdge,
            (0, _) => BaseSymbol::LeftEdge,
            (x, _) if x == max => BaseSymbol::RightEdge,
            _ if star_points(size).contains(&pt) => BaseSymbol::CenterStarpoint,
            _ => BaseSymbol::Center,
        }
    }
}

/// Markup drawn on top of an intersection.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mark {
    Circle,
    Square,
    Triangle,
    XMark,
    /// Text from the label map.
    TextLabel,
    LastMove,
    KoLocation,
    /// A child move of the shown position.
    NextVariation,
}

impl Mark {
    pub fn from_prop(prop: Prop) -> Option<Mark> {
        match prop {
            Prop::CR => Some(Mark::Circle),
            Prop::SQ => Some(Mark::Square),
            Prop::TR => Some(Mark::Triangle),
            Prop::MA => Some(Mark::XMark),
            Prop::LB => Some(Mark::TextLabel),
            _ => None,
        }
    }
}

// =============================================================================
// Mark map
// =============================================================================

/// Marks and label text by point.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MarkMap {
    marks: BTreeMap<Point, Mark>,
    labels: BTreeMap<Point, String>,
}

impl MarkMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Markup of one node. Later properties win on shared points.
    pub fn from_properties(props: &Properties) -> Result<MarkMap> {
        let mut map = MarkMap::new();
        for prop in MARK_PROPS {
            if prop == Prop::LB {
                for (pt, text) in props.get_labels()? {
                    map.set_label(pt, text);
                }
                continue;
            }
            let Some(mark) = Mark::from_prop(prop) else {
                continue;
            };
            for pt in props.get_points(prop)? {
                map.set_mark(pt, mark);
            }
        }
        Ok(map)
    }

    pub fn mark(&self, pt: Point) -> Option<Mark> {
        self.marks.get(&pt).copied()
    }

    pub fn label(&self, pt: Point) -> Option<&str> {
        self.labels.get(&pt).map(String::as_str)
    }

    pub fn marks(&self) -> &BTreeMap<Point, Mark> {
        &self.marks
    }

    pub fn labels(&self) -> &BTreeMap<Point, String> {
        &self.labels
    }

    /// Set a non-text mark, dropping any label there.
    pub fn set_mark(&mut self, pt: Point, mark: Mark) {
        self.marks.insert(pt, mark);
        self.labels.remove(&pt);
    }

    pub fn set_label(&mut self, pt: Point, text: impl Into<String>) {
        self.set_labeled_mark(pt, Mark::TextLabel, text);
    }

    /// A mark that carries text, such as a variation number.
    pub fn set_labeled_mark(&mut self, pt: Point, mark: Mark, text: impl Into<String>) {
        self.marks.insert(pt, mark);
        self.labels.insert(pt, text.into());
    }

    /// Drop labels that are plain numbers, along with their marks.
    pub fn strip_numeric_labels(&mut self) {
        let numeric: Vec<Point> = self
            .labels
            .iter()
            .filter(|(_, text)| !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()))
            .map(|(pt, _)| *pt)
            .collect();
        for pt in numeric {
            self.labels.remove(&pt);
            self.marks.remove(&pt);
        }
    }

    pub(crate) fn rotate(&self, size: usize, rotation: Rotation) -> Result<MarkMap> {
        let mut out = MarkMap::new();
        for (pt, mark) in &self.marks {
            out.marks.insert(pt.rotate(size, rotation)?, *mark);
        }
        for (pt, text) in &self.labels {
            out.labels.insert(pt.rotate(size, rotation)?, text.clone());
        }
        Ok(out)
    }
}

// =============================================================================
// Board grid
// =============================================================================

/// Everything drawn at one intersection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Intersection {
    pub base: BaseSymbol,
    pub stone: Option<Color>,
    pub mark: Option<Mark>,
    pub text_label: Option<String>,
}

/// A cropped window of the board, row-major.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Board<T> {
    rows: Vec<Vec<T>>,
    bbox: BoundingBox,
    max_board_size: usize,
}

impl<T> Board<T> {
    /// Fill `bbox` cell by cell with `f(board point)`.
    pub fn from_fn(
        bbox: BoundingBox,
        max_board_size: usize,
        mut f: impl FnMut(Point) -> T,
    ) -> Board<T> {
        let tl = bbox.top_left();
        let rows = (0..bbox.height())
            .map(|dy| (0..bbox.width()).map(|dx| f(Point::new(tl.x + dx, tl.y + dy))).collect())
            .collect();
        Board {
            rows,
            bbox,
            max_board_size,
        }
    }

    /// Cell at a board coordinate, if it is inside the crop.
    pub fn get(&self, pt: Point) -> Option<&T> {
        if !self.bbox.contains(pt) {
            return None;
        }
        let tl = self.bbox.top_left();
        self.get_int(pt.x - tl.x, pt.y - tl.y)
    }

    /// Cell at a coordinate relative to the crop's top-left corner.
    pub fn get_int(&self, x: usize, y: usize) -> Option<&T> {
        self.rows.get(y)?.get(x)
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }

    pub fn width(&self) -> usize {
        self.bbox.width()
    }

    pub fn height(&self) -> usize {
        self.bbox.height()
    }

    /// Size of the uncropped board.
    pub fn max_board_size(&self) -> usize {
        self.max_board_size
    }

    pub fn rows(&self) -> &[Vec<T>] {
        &self.rows
    }

    /// Board translation from board coordinates to crop coordinates.
    pub fn to_cropped(&self, pt: Point) -> Option<Point> {
        let tl = self.bbox.top_left();
        self.bbox.contains(pt).then(|| Point::new(pt.x - tl.x, pt.y - tl.y))
    }

    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> Board<U> {
        Board {
            rows: self.rows.iter().map(|row| row.iter().map(&mut f).collect()).collect(),
            bbox: self.bbox,
            max_board_size: self.max_board_size,
        }
    }
}

// =============================================================================
// Flattened
// =============================================================================

/// A move played onto an already occupied point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Collision {
    pub color: Color,
    pub move_num: usize,
    /// Label shown on the stone underneath, if one was assigned.
    pub label: Option<String>,
    pub collision_stone_color: Option<Color>,
}

/// One rendered position.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Flattened {
    pub(crate) board: Board<Intersection>,
    pub(crate) collisions: Vec<Collision>,
    pub(crate) comment: String,
    pub(crate) is_on_main_path: bool,
    pub(crate) starting_move_num: usize,
    pub(crate) ending_move_num: usize,
    pub(crate) mainline_move_num: usize,
    pub(crate) mainline_move: Option<Move>,
    pub(crate) next_mainline_move: Option<Move>,
    pub(crate) stone_map: BTreeMap<Point, Color>,
    pub(crate) mark_map: MarkMap,
    pub(crate) problem_result: Option<ProblemResult>,
    pub(crate) ko: Option<Point>,
    pub(crate) rotation: Rotation,
    pub(crate) region: BoardRegion,
}

impl Flattened {
    pub fn board(&self) -> &Board<Intersection> {
        &self.board
    }

    /// Collisions in the order the moves were played.
    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    /// Comment at the shown position; empty if there is none.
    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn is_on_main_path(&self) -> bool {
        self.is_on_main_path
    }

    pub fn starting_move_num(&self) -> usize {
        self.starting_move_num
    }

    pub fn ending_move_num(&self) -> usize {
        self.ending_move_num
    }

    /// Move number of the closest mainline ancestor.
    pub fn mainline_move_num(&self) -> usize {
        self.mainline_move_num
    }

    pub fn mainline_move(&self) -> Option<Move> {
        self.mainline_move
    }

    pub fn next_mainline_move(&self) -> Option<Move> {
        self.next_mainline_move
    }

    pub fn stone_map(&self) -> &BTreeMap<Point, Color> {
        &self.stone_map
    }

    pub fn mark_map(&self) -> &MarkMap {
        &self.mark_map
    }

    pub fn problem_result(&self) -> Option<ProblemResult> {
        self.problem_result
    }

    pub fn set_problem_result(&mut self, result: ProblemResult) {
        self.problem_result = Some(result);
    }

    pub fn ko(&self) -> Option<Point> {
        self.ko
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// The region the board was cropped to, after rotation.
    pub fn region(&self) -> BoardRegion {
        self.region
    }
}
