//! Axis-aligned bounding boxes over board intersections.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::point::Point;

/// An inclusive rectangle of intersections.
///
/// `top_left` is never right of or below `bot_right`; [`BoundingBox::new`]
/// rejects boxes that would break that.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct BoundingBox {
    top_left: Point,
    bot_right: Point,
}

impl BoundingBox {
    pub fn new(top_left: Point, bot_right: Point) -> Result<Self> {
        if top_left.x > bot_right.x || top_left.y > bot_right.y {
            return Err(Error::InvertedBox {
                top_left,
                bot_right,
            });
        }
        Ok(Self {
            top_left,
            bot_right,
        })
    }

    /// The whole `size` x `size` board.
    pub fn full_board(size: usize) -> Self {
        let max = size.saturating_sub(1);
        Self {
            top_left: Point::new(0, 0),
            bot_right: Point::new(max, max),
        }
    }

    /// Smallest box covering every point, or `None` for an empty slice.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bbox = Self {
            top_left: *first,
            bot_right: *first,
        };
        for pt in rest {
            bbox = bbox.expand_to_contain(*pt);
        }
        Some(bbox)
    }

    pub fn top_left(&self) -> Point {
        self.top_left
    }

    pub fn bot_right(&self) -> Point {
        self.bot_right
    }

    pub fn top_right(&self) -> Point {
        Point::new(self.bot_right.x, self.top_left.y)
    }

    pub fn bot_left(&self) -> Point {
        Point::new(self.top_left.x, self.bot_right.y)
    }

    /// Corners clockwise from the top-left.
    pub fn corners(&self) -> [Point; 4] {
        [
            self.top_left,
            self.top_right(),
            self.bot_right,
            self.bot_left(),
        ]
    }

    /// Number of columns covered.
    pub fn width(&self) -> usize {
        self.bot_right.x - self.top_left.x + 1
    }

    /// Number of rows covered.
    pub fn height(&self) -> usize {
        self.bot_right.y - self.top_left.y + 1
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.top_left.x + self.bot_right.x) as f64 / 2.0,
            (self.top_left.y + self.bot_right.y) as f64 / 2.0,
        )
    }

    pub fn contains(&self, pt: Point) -> bool {
        pt.x >= self.top_left.x
            && pt.x <= self.bot_right.x
            && pt.y >= self.top_left.y
            && pt.y <= self.bot_right.y
    }

    /// Whether `other` lies entirely inside this box.
    pub fn covers(&self, other: &BoundingBox) -> bool {
        self.contains(other.top_left) && self.contains(other.bot_right)
    }

    pub fn intersect(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let top_left = Point::new(
            self.top_left.x.max(other.top_left.x),
            self.top_left.y.max(other.top_left.y),
        );
        let bot_right = Point::new(
            self.bot_right.x.min(other.bot_right.x),
            self.bot_right.y.min(other.bot_right.y),
        );
        BoundingBox::new(top_left, bot_right).ok()
    }

    pub fn expand_to_contain(&self, pt: Point) -> BoundingBox {
        BoundingBox {
            top_left: Point::new(self.top_left.x.min(pt.x), self.top_left.y.min(pt.y)),
            bot_right: Point::new(self.bot_right.x.max(pt.x), self.bot_right.y.max(pt.y)),
        }
    }

    /// Grow by `margin` lines on every side, clamped to a `size` board.
    pub fn grow(&self, margin: usize, size: usize) -> BoundingBox {
        let max = size.saturating_sub(1);
        BoundingBox {
            top_left: Point::new(
                self.top_left.x.saturating_sub(margin),
                self.top_left.y.saturating_sub(margin),
            ),
            bot_right: Point::new(
                (self.bot_right.x + margin).min(max),
                (self.bot_right.y + margin).min(max),
            ),
        }
    }

    pub fn translate(&self, dx: isize, dy: isize) -> Result<BoundingBox> {
        let shift = |pt: Point| -> Result<Point> {
            let x = pt.x as i64 + dx as i64;
            let y = pt.y as i64 + dy as i64;
            if x < 0 || y < 0 {
                return Err(Error::OutOfBounds { x, y, size: 0 });
            }
            Ok(Point::new(x as usize, y as usize))
        };
        Ok(BoundingBox {
            top_left: shift(self.top_left)?,
            bot_right: shift(self.bot_right)?,
        })
    }

    pub fn scale(&self, factor: usize) -> BoundingBox {
        BoundingBox {
            top_left: Point::new(self.top_left.x * factor, self.top_left.y * factor),
            bot_right: Point::new(self.bot_right.x * factor, self.bot_right.y * factor),
        }
    }

    /// Cut into horizontal bands, top to bottom. Each ratio is the share of the
    /// height given to one band; the last band takes what remains. Adjacent
    /// bands share their boundary row.
    pub fn h_split(&self, ratios: &[f64]) -> Result<Vec<BoundingBox>> {
        let cuts = split_points(self.top_left.y, self.bot_right.y, ratios)?;
        Ok(cuts
            .windows(2)
            .map(|w| BoundingBox {
                top_left: Point::new(self.top_left.x, w[0]),
                bot_right: Point::new(self.bot_right.x, w[1]),
            })
            .collect())
    }

    /// Cut into vertical columns, left to right. Same ratio rules as
    /// [`BoundingBox::h_split`].
    pub fn v_split(&self, ratios: &[f64]) -> Result<Vec<BoundingBox>> {
        let cuts = split_points(self.top_left.x, self.bot_right.x, ratios)?;
        Ok(cuts
            .windows(2)
            .map(|w| BoundingBox {
                top_left: Point::new(w[0], self.top_left.y),
                bot_right: Point::new(w[1], self.bot_right.y),
            })
            .collect())
    }
}

fn split_points(start: usize, end: usize, ratios: &[f64]) -> Result<Vec<usize>> {
    let total: f64 = ratios.iter().sum();
    if ratios.iter().any(|r| r.is_nan() || *r <= 0.0) || total >= 1.0 {
        let shown: Vec<String> = ratios.iter().map(|r| r.to_string()).collect();
        return Err(Error::BadSplit(shown.join(", ")));
    }
    let span = (end - start) as f64;
    let mut cuts = Vec::with_capacity(ratios.len() + 2);
    cuts.push(start);
    let mut acc = 0.0;
    for r in ratios {
        acc += r;
        cuts.push(start + (span * acc).floor() as usize);
    }
    cuts.push(end);
    Ok(cuts)
}
