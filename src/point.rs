//! Board coordinates and rotations.
//!
//! Points are 0-indexed from the top-left corner. Two encodings are supported:
//! - SGF coordinates, two lowercase letters (`"cd"` is x=2, y=3)
//! - the canonical key `"x,y"` produced by `Display` and read by `FromStr`

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::{Error, Result};

/// An intersection on the board.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

/// One of the four quarter-turn rotations of the board.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rotation {
    #[default]
    NoRotation,
    Clockwise90,
    Clockwise180,
    Clockwise270,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [
        Rotation::NoRotation,
        Rotation::Clockwise90,
        Rotation::Clockwise180,
        Rotation::Clockwise270,
    ];

    pub fn degrees(self) -> u16 {
        match self {
            Rotation::NoRotation => 0,
            Rotation::Clockwise90 => 90,
            Rotation::Clockwise180 => 180,
            Rotation::Clockwise270 => 270,
        }
    }

    /// Rotation for an angle in degrees; only multiples of 90 have one.
    pub fn from_degrees(degrees: i32) -> Option<Rotation> {
        match degrees.rem_euclid(360) {
            0 => Some(Rotation::NoRotation),
            90 => Some(Rotation::Clockwise90),
            180 => Some(Rotation::Clockwise180),
            270 => Some(Rotation::Clockwise270),
            _ => None,
        }
    }

    /// The rotation that undoes this one.
    pub fn inverse(self) -> Rotation {
        match self {
            Rotation::NoRotation => Rotation::NoRotation,
            Rotation::Clockwise90 => Rotation::Clockwise270,
            Rotation::Clockwise180 => Rotation::Clockwise180,
            Rotation::Clockwise270 => Rotation::Clockwise90,
        }
    }
}

impl Point {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn in_bounds(&self, size: usize) -> bool {
        self.x < size && self.y < size
    }

    /// Parse a two-letter SGF coordinate (`'a' + x`, `'a' + y`).
    pub fn from_sgf_coord(s: &str) -> Result<Point> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 || !bytes.iter().all(u8::is_ascii_lowercase) {
            return Err(Error::InvalidSgfCoord(s.to_string()));
        }
        Ok(Point::new((bytes[0] - b'a') as usize, (bytes[1] - b'a') as usize))
    }

    pub fn to_sgf_coord(&self) -> String {
        let x = (b'a' + self.x as u8) as char;
        let y = (b'a' + self.y as u8) as char;
        format!("{x}{y}")
    }

    /// Shift the point, failing if the result leaves a `size` x `size` board.
    pub fn translate(&self, dx: isize, dy: isize, size: usize) -> Result<Point> {
        let x = self.x as i64 + dx as i64;
        let y = self.y as i64 + dy as i64;
        if x < 0 || y < 0 || x >= size as i64 || y >= size as i64 {
            return Err(Error::OutOfBounds { x, y, size });
        }
        Ok(Point::new(x as usize, y as usize))
    }

    /// Rotate clockwise about the center of a `size` x `size` board.
    pub fn rotate(&self, size: usize, rotation: Rotation) -> Result<Point> {
        if !self.in_bounds(size) {
            return Err(Error::OutOfBounds {
                x: self.x as i64,
                y: self.y as i64,
                size,
            });
        }
        let max = size - 1;
        let (x, y) = (self.x, self.y);
        Ok(match rotation {
            Rotation::NoRotation => *self,
            Rotation::Clockwise90 => Point::new(max - y, x),
            Rotation::Clockwise180 => Point::new(max - x, max - y),
            Rotation::Clockwise270 => Point::new(y, max - x),
        })
    }

    /// Undo [`Point::rotate`] with the same rotation.
    pub fn antirotate(&self, size: usize, rotation: Rotation) -> Result<Point> {
        self.rotate(size, rotation.inverse())
    }

    /// The 4-connected neighbors that lie on a `size` x `size` board.
    pub fn neighbors(self, size: usize) -> impl Iterator<Item = Point> {
        let (x, y) = (self.x, self.y);
        let mut v = Vec::with_capacity(4);
        if x > 0 {
            v.push(Point::new(x - 1, y));
        }
        if x + 1 < size {
            v.push(Point::new(x + 1, y));
        }
        if y > 0 {
            v.push(Point::new(x, y - 1));
        }
        if y + 1 < size {
            v.push(Point::new(x, y + 1));
        }
        v.into_iter()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

impl FromStr for Point {
    type Err = Error;

    fn from_str(s: &str) -> Result<Point> {
        let bad = || Error::InvalidPointKey(s.to_string());
        let (x, y) = s.split_once(',').ok_or_else(bad)?;
        let x = x.trim().parse().map_err(|_| bad())?;
        let y = y.trim().parse().map_err(|_| bad())?;
        Ok(Point::new(x, y))
    }
}

// Serialized as the "x,y" key so point-keyed maps survive JSON.
impl Serialize for Point {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Expand an SGF point value, which is either a single coordinate (`"cd"`) or a
/// compressed rectangle (`"aa:cc"`), into its points in row-major order.
pub fn points_from_sgf_value(value: &str) -> Result<Vec<Point>> {
    let Some((from, to)) = value.split_once(':') else {
        return Ok(vec![Point::from_sgf_coord(value)?]);
    };
    let bad = || Error::PointRectangle(value.to_string());
    let tl = Point::from_sgf_coord(from).map_err(|_| bad())?;
    let br = Point::from_sgf_coord(to).map_err(|_| bad())?;
    if tl.x > br.x || tl.y > br.y {
        return Err(bad());
    }
    let mut out = Vec::with_capacity((br.x - tl.x + 1) * (br.y - tl.y + 1));
    for y in tl.y..=br.y {
        for x in tl.x..=br.x {
            out.push(Point::new(x, y));
        }
    }
    Ok(out)
}
