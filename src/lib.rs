//! goflat: Go rules and board flattening for diagram rendering.
//!
//! Takes a game tree (moves, variations, setup stones, markup), replays it
//! with capture and ko rules, and flattens a chosen position into a cropped
//! grid of symbolic intersections ready for a diagram renderer, with
//! move-number labels and collision bookkeeping.
//!
//! ## Modules
//!
//! - [`point`], [`bbox`] - Coordinates, rotations, and bounding boxes
//! - [`goban`] - Board state, captures, and ko
//! - [`properties`], [`movetree`] - Property bags and the game tree cursor
//! - [`sgf`] - Reading and writing SGF game records
//! - [`treepath`] - Paths through the tree and next-move sequences
//! - [`orientation`] - Crop regions and canonical rotation
//! - [`flattener`], [`flattened`] - The flattening pipeline and its output
//! - [`problems`] - Problem correctness
//!
//! ## Example
//!
//! ```
//! use goflat::flattener::{FlattenOptions, Flattener};
//! use goflat::movetree::MoveTree;
//! use goflat::point::Point;
//! use goflat::treepath::Treepath;
//!
//! let mt = MoveTree::from_sgf("(;SZ[9];B[cc];W[gg];B[gc])").unwrap();
//! let options = FlattenOptions {
//!     next_moves_path: Treepath::parse_fragment("0:3").unwrap(),
//!     ..Default::default()
//! };
//! let flat = Flattener::new().flatten(&mt, &options).unwrap();
//! assert_eq!(flat.ending_move_num(), 3);
//! assert_eq!(flat.mark_map().label(Point::new(6, 2)), Some("3"));
//! ```

pub mod bbox;
pub mod constants;
pub mod error;
pub mod flattened;
pub mod flattener;
pub mod goban;
pub mod movetree;
pub mod orientation;
pub mod point;
pub mod problems;
pub mod properties;
pub mod sgf;
pub mod treepath;

pub use error::{Error, Result};
