//! Error types for the rules engine.
//!
//! Illegal moves are not errors: [`crate::goban::Goban::add_stone`] reports them
//! through [`crate::goban::StoneResult`]. Everything here is either malformed input
//! (bad coordinates, treepaths, SGF) or a broken internal invariant.

use thiserror::Error;

use crate::orientation::BoardRegion;
use crate::point::Point;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ========================================================================
    // Structural / parse errors
    // ========================================================================
    #[error("invalid SGF coordinate: {0:?}")]
    InvalidSgfCoord(String),

    #[error("invalid point key {0:?}, expected \"x,y\"")]
    InvalidPointKey(String),

    #[error("point ({x}, {y}) is outside a {size}x{size} board")]
    OutOfBounds { x: i64, y: i64, size: usize },

    #[error("malformed point rectangle: {0:?}")]
    PointRectangle(String),

    #[error("bounding box corners out of order: top-left {top_left}, bottom-right {bot_right}")]
    InvertedBox { top_left: Point, bot_right: Point },

    #[error("split ratios must be positive and sum to less than 1: {0}")]
    BadSplit(String),

    #[error("unexpected token {token:?} in treepath {path:?}")]
    TreepathToken { token: String, path: String },

    #[error("variation multiplier without a preceding variation in treepath {0:?}")]
    TreepathMultiplier(String),

    #[error("SGF parse error at byte {offset}: {message}")]
    Sgf { offset: usize, message: String },

    #[error("unknown property id: {0}")]
    UnknownProperty(String),

    #[error("malformed label value {0:?}, expected \"pt:text\"")]
    InvalidLabel(String),

    // ========================================================================
    // Invariant violations
    // ========================================================================
    #[error("no crop region covers bounding box {0:?}")]
    UncoveredRegion(String),

    #[error("board region {0:?} has no fixed crop box")]
    UnresolvedRegion(BoardRegion),
}
