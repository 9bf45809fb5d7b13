//! Board state: stone placement, captures and Ko.
//!
//! A [`Goban`] is a square grid of intersections plus at most one Ko point. It
//! has no move history; replaying a [`MoveTree`] path onto a fresh goban is how
//! a position is reconstructed.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::movetree::MoveTree;
use crate::point::Point;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Color {
    Black,
    White,
}

impl Color {
    pub fn opposite(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// The SGF player token, `"B"` or `"W"`.
    pub fn as_sgf_token(self) -> &'static str {
        match self {
            Color::Black => "B",
            Color::White => "W",
        }
    }

    pub fn from_sgf_token(token: &str) -> Option<Color> {
        match token.trim() {
            "B" | "b" => Some(Color::Black),
            "W" | "w" => Some(Color::White),
            _ => None,
        }
    }
}

/// A played move. `point` is `None` for a pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Move {
    pub color: Color,
    pub point: Option<Point>,
}

impl Move {
    pub fn new(color: Color, point: Point) -> Self {
        Self {
            color,
            point: Some(point),
        }
    }

    pub fn pass(color: Color) -> Self {
        Self { color, point: None }
    }

    pub fn is_pass(&self) -> bool {
        self.point.is_none()
    }
}

/// Why a placement was refused.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MoveError {
    /// Point is not empty
    Occupied,
    /// Point is not on the board
    OutOfBounds,
    /// Point is the current Ko point
    Ko,
    /// Stone would have no liberties and captures nothing
    SelfCapture,
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveError::Occupied => write!(f, "illegal move: point not empty"),
            MoveError::OutOfBounds => write!(f, "illegal move: point off the board"),
            MoveError::Ko => write!(f, "illegal move: retakes ko"),
            MoveError::SelfCapture => write!(f, "illegal move: self-capture"),
        }
    }
}

/// Outcome of [`Goban::add_stone`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoneResult {
    pub successful: bool,
    /// Stones removed from the board, in discovery order.
    pub captures: Vec<Point>,
    /// Ko point created by this move, if any.
    pub ko: Option<Point>,
    pub error: Option<MoveError>,
}

impl StoneResult {
    fn illegal(error: MoveError) -> Self {
        StoneResult {
            successful: false,
            captures: Vec::new(),
            ko: None,
            error: Some(error),
        }
    }
}

/// Stones captured while loading one tree node, split by the captured color.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CaptureResult {
    pub black: Vec<Point>,
    pub white: Vec<Point>,
}

impl CaptureResult {
    fn record(&mut self, captured_color: Color, points: &[Point]) {
        match captured_color {
            Color::Black => self.black.extend_from_slice(points),
            Color::White => self.white.extend_from_slice(points),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.black.is_empty() && self.white.is_empty()
    }
}

/// A 4-connected group of same-colored stones.
#[derive(Clone, Debug)]
pub struct Group {
    pub color: Color,
    pub members: Vec<Point>,
    /// Empty neighbors counted once per adjacent member, so a liberty shared by
    /// two members counts twice. Only zero vs. nonzero is meaningful.
    pub liberties: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Goban {
    size: usize,
    cells: Vec<Option<Color>>,
    ko: Option<Point>,
}

impl Goban {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size],
            ko: None,
        }
    }

    /// Replay every node from the root to the tree's current position.
    ///
    /// Returns the goban plus the captures made at each node along the way.
    pub fn from_movetree(movetree: &MoveTree) -> Result<(Goban, Vec<CaptureResult>)> {
        let mut goban = Goban::new(movetree.intersections());
        let path = movetree.tree_path_to_here();
        let mut mt = movetree.new_tree_ref();
        mt.to_root();
        let mut captures = Vec::with_capacity(path.len() + 1);
        captures.push(goban.load_stones_from_movetree(&mt)?);
        for idx in path {
            mt.move_down(idx);
            captures.push(goban.load_stones_from_movetree(&mt)?);
        }
        Ok((goban, captures))
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn ko(&self) -> Option<Point> {
        self.ko
    }

    fn idx(&self, pt: Point) -> usize {
        pt.y * self.size + pt.x
    }

    pub fn in_bounds(&self, pt: Point) -> bool {
        pt.in_bounds(self.size)
    }

    /// Stone at `pt`; `None` for an empty or off-board point.
    pub fn stone_at(&self, pt: Point) -> Option<Color> {
        if !self.in_bounds(pt) {
            return None;
        }
        self.cells[self.idx(pt)]
    }

    pub fn stone_at_coords(&self, x: usize, y: usize) -> Option<Color> {
        self.stone_at(Point::new(x, y))
    }

    /// Whether a stone of either color could be put on `pt` without touching
    /// capture rules: on the board, empty, and not the Ko point.
    pub fn placeable(&self, pt: Point) -> bool {
        self.in_bounds(pt) && self.stone_at(pt).is_none() && self.ko != Some(pt)
    }

    fn set(&mut self, pt: Point, color: Option<Color>) {
        let i = self.idx(pt);
        self.cells[i] = color;
    }

    /// Remove whatever is on `pt`, returning it.
    pub fn clear_stone(&mut self, pt: Point) -> Option<Color> {
        if !self.in_bounds(pt) {
            return None;
        }
        let prev = self.stone_at(pt);
        self.set(pt, None);
        prev
    }

    pub fn clear_some(&mut self, points: &[Point]) {
        for &pt in points {
            self.clear_stone(pt);
        }
    }

    /// Every stone on the board, row by row.
    pub fn placed_stones(&self) -> Vec<Move> {
        let mut out = Vec::new();
        for y in 0..self.size {
            for x in 0..self.size {
                if let Some(color) = self.stone_at_coords(x, y) {
                    out.push(Move::new(color, Point::new(x, y)));
                }
            }
        }
        out
    }

    /// Flood fill from `start` over stones of `color`.
    pub fn find_connected(&self, start: Point, color: Color) -> Group {
        let mut stack = vec![start];
        let mut visited = vec![false; self.size * self.size];
        let mut members = Vec::new();
        let mut liberties = 0;
        while let Some(pt) = stack.pop() {
            let i = self.idx(pt);
            if visited[i] {
                continue;
            }
            visited[i] = true;
            if self.stone_at(pt) != Some(color) {
                continue;
            }
            members.push(pt);
            for n in pt.neighbors(self.size) {
                match self.stone_at(n) {
                    None => liberties += 1,
                    Some(c) if c == color && !visited[self.idx(n)] => stack.push(n),
                    _ => {}
                }
            }
        }
        Group {
            color,
            members,
            liberties,
        }
    }

    /// Place a stone, resolving captures, self-capture and Ko.
    ///
    /// An illegal move leaves the board untouched and returns
    /// `successful == false`.
    pub fn add_stone(&mut self, pt: Point, color: Color) -> StoneResult {
        if !self.in_bounds(pt) {
            return StoneResult::illegal(MoveError::OutOfBounds);
        }
        if self.stone_at(pt).is_some() {
            return StoneResult::illegal(MoveError::Occupied);
        }
        if self.ko == Some(pt) {
            return StoneResult::illegal(MoveError::Ko);
        }

        self.set(pt, Some(color));
        let captures = self.capture_around(pt, color.opposite());

        if captures.is_empty() && self.find_connected(pt, color).liberties == 0 {
            self.set(pt, None);
            return StoneResult::illegal(MoveError::SelfCapture);
        }

        self.ko = None;
        if let [captured] = captures[..] {
            if self.recapture_takes_only(captured, color.opposite(), pt) {
                self.ko = Some(captured);
            }
        }

        StoneResult {
            successful: true,
            captures,
            ko: self.ko,
            error: None,
        }
    }

    /// Remove every `victim`-colored group next to `pt` that has no liberties.
    fn capture_around(&mut self, pt: Point, victim: Color) -> Vec<Point> {
        let mut captured = Vec::new();
        for n in pt.neighbors(self.size) {
            if self.stone_at(n) != Some(victim) {
                continue;
            }
            let group = self.find_connected(n, victim);
            if group.liberties == 0 {
                self.clear_some(&group.members);
                captured.extend(group.members);
            }
        }
        captured
    }

    /// Would `color` playing at `at` capture exactly the single stone at `target`?
    fn recapture_takes_only(&mut self, at: Point, color: Color, target: Point) -> bool {
        self.set(at, Some(color));
        let victim = color.opposite();
        let mut would_capture = Vec::new();
        for n in at.neighbors(self.size) {
            if self.stone_at(n) == Some(victim) && !would_capture.contains(&n) {
                let group = self.find_connected(n, victim);
                if group.liberties == 0 {
                    would_capture.extend(group.members);
                }
            }
        }
        self.set(at, None);
        would_capture == [target]
    }

    /// Check legality without changing the board.
    pub fn test_add_stone(&mut self, pt: Point, color: Color) -> bool {
        let old_ko = self.ko;
        let result = self.add_stone(pt, color);
        if result.successful {
            for &captured in &result.captures {
                self.set(captured, Some(color.opposite()));
            }
            self.set(pt, None);
            self.ko = old_ko;
        }
        result.successful
    }

    /// Apply the current node's setup (`AB`, `AW`, `AE`) and then its move.
    pub fn load_stones_from_movetree(&mut self, movetree: &MoveTree) -> Result<CaptureResult> {
        let props = movetree.properties();
        let mut captures = CaptureResult::default();

        for pt in props.get_cleared_points()? {
            self.clear_stone(pt);
        }
        for color in [Color::Black, Color::White] {
            for pt in props.get_placements(color)? {
                let result = self.add_stone(pt, color);
                if !result.successful {
                    debug!(point = %pt, ?color, error = ?result.error, "placement rejected");
                }
                captures.record(color.opposite(), &result.captures);
            }
        }

        if let Some(Move {
            color,
            point: Some(pt),
        }) = props.get_move()?
        {
            let result = self.add_stone(pt, color);
            if result.successful {
                captures.record(color.opposite(), &result.captures);
            } else {
                debug!(point = %pt, ?color, error = ?result.error, "move rejected");
            }
        }
        Ok(captures)
    }
}

impl fmt::Display for Goban {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.size {
            for x in 0..self.size {
                let pt = Point::new(x, y);
                let ch = match self.stone_at(pt) {
                    Some(Color::Black) => 'X',
                    Some(Color::White) => 'O',
                    None if self.ko == Some(pt) => '*',
                    None => '.',
                };
                write!(f, "{ch} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
