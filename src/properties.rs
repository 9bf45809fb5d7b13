//! SGF-style property bags attached to move-tree nodes.
//!
//! Keys are a closed set of property ids ([`Prop`]); values are kept as the raw
//! strings from the game record and interpreted on access.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::goban::{Color, Move};
use crate::point::{Point, points_from_sgf_value};

macro_rules! props {
    ($($(#[$doc:meta])* $name:ident),* $(,)?) => {
        /// A known SGF property id.
        #[allow(clippy::upper_case_acronyms)]
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub enum Prop {
            $($(#[$doc])* $name,)*
        }

        impl Prop {
            pub const ALL: &'static [Prop] = &[$(Prop::$name,)*];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Prop::$name => stringify!($name),)*
                }
            }
        }

        impl FromStr for Prop {
            type Err = Error;

            fn from_str(s: &str) -> Result<Prop> {
                match s {
                    $(stringify!($name) => Ok(Prop::$name),)*
                    _ => Err(Error::UnknownProperty(s.to_string())),
                }
            }
        }
    };
}

props! {
    // Moves
    /// Black move
    B,
    /// Execute move even if illegal
    KO,
    /// Set move number
    MN,
    /// White move
    W,
    // Setup
    /// Add black stones
    AB,
    /// Clear points
    AE,
    /// Add white stones
    AW,
    /// Player to move
    PL,
    // Node annotation
    /// Comment
    C,
    DM,
    /// Good for black
    GB,
    /// Good for white
    GW,
    HO,
    /// Node name
    N,
    UC,
    V,
    // Move annotation
    BM,
    DO,
    IT,
    TE,
    // Markup
    /// Arrow
    AR,
    /// Circle
    CR,
    DD,
    /// Text label, `pt:text`
    LB,
    LN,
    /// X mark
    MA,
    /// Selected points
    SL,
    /// Square
    SQ,
    /// Triangle
    TR,
    // Root
    AP,
    CA,
    FF,
    GM,
    ST,
    /// Board size
    SZ,
    // Game info
    AN,
    BR,
    BT,
    CP,
    DT,
    EV,
    GN,
    GC,
    ON,
    OT,
    PB,
    PC,
    PW,
    RE,
    RO,
    RU,
    SO,
    TM,
    US,
    WR,
    WT,
    // Timing
    BL,
    OB,
    OW,
    WL,
    // Misc
    FG,
    PM,
    VW,
    // Go
    HA,
    KM,
    TB,
    TW,
}

impl fmt::Display for Prop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Markup properties that put a symbol on a single point.
pub const MARK_PROPS: [Prop; 5] = [Prop::CR, Prop::SQ, Prop::TR, Prop::MA, Prop::LB];

/// Problem conditions: a node matches when it carries any of the keys and, for
/// a non-empty substring list, one of its values contains one of them.
pub type Conditions = BTreeMap<Prop, Vec<String>>;

/// Ordered multi-map from property id to raw values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Properties {
    entries: Vec<(Prop, Vec<String>)>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, prop: Prop) -> Option<&Vec<String>> {
        self.entries.iter().find(|(p, _)| *p == prop).map(|(_, v)| v)
    }

    fn entry_mut(&mut self, prop: Prop) -> Option<&mut Vec<String>> {
        self.entries
            .iter_mut()
            .find(|(p, _)| *p == prop)
            .map(|(_, v)| v)
    }

    /// Append a value, keeping any existing ones.
    pub fn add(&mut self, prop: Prop, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        match self.entry_mut(prop) {
            Some(values) => values.push(value),
            None => self.entries.push((prop, vec![value])),
        }
        self
    }

    /// Replace all values of `prop`.
    pub fn set(&mut self, prop: Prop, values: Vec<String>) -> &mut Self {
        match self.entry_mut(prop) {
            Some(existing) => *existing = values,
            None => self.entries.push((prop, values)),
        }
        self
    }

    pub fn remove(&mut self, prop: Prop) -> Option<Vec<String>> {
        let pos = self.entries.iter().position(|(p, _)| *p == prop)?;
        Some(self.entries.remove(pos).1)
    }

    /// Remove one value; the key goes away with its last value.
    pub fn remove_one_value(&mut self, prop: Prop, value: &str) -> bool {
        let Some(values) = self.entry_mut(prop) else {
            return false;
        };
        let Some(pos) = values.iter().position(|v| v == value) else {
            return false;
        };
        values.remove(pos);
        if values.is_empty() {
            self.remove(prop);
        }
        true
    }

    pub fn contains(&self, prop: Prop) -> bool {
        self.entry(prop).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Prop, &[String])> {
        self.entries.iter().map(|(p, v)| (*p, v.as_slice()))
    }

    pub fn get_all_values(&self, prop: Prop) -> &[String] {
        self.entry(prop).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get_one_value(&self, prop: Prop) -> Option<&str> {
        self.entry(prop)?.first().map(String::as_str)
    }

    pub fn get_comment(&self) -> Option<&str> {
        self.get_one_value(Prop::C)
    }

    /// The `B`/`W` move of this node. An empty value is a pass.
    pub fn get_move(&self) -> Result<Option<Move>> {
        for (prop, color) in [(Prop::B, Color::Black), (Prop::W, Color::White)] {
            if let Some(value) = self.get_one_value(prop) {
                let value = value.trim();
                if value.is_empty() {
                    return Ok(Some(Move::pass(color)));
                }
                return Ok(Some(Move::new(color, Point::from_sgf_coord(value)?)));
            }
        }
        Ok(None)
    }

    /// Player-to-move override from `PL`.
    pub fn player_to_move(&self) -> Option<Color> {
        self.get_one_value(Prop::PL).and_then(Color::from_sgf_token)
    }

    /// Expanded point values of a point-list property.
    pub fn get_points(&self, prop: Prop) -> Result<Vec<Point>> {
        let mut out = Vec::new();
        for value in self.get_all_values(prop) {
            out.extend(points_from_sgf_value(value.trim())?);
        }
        Ok(out)
    }

    /// `AB` or `AW` setup stones.
    pub fn get_placements(&self, color: Color) -> Result<Vec<Point>> {
        match color {
            Color::Black => self.get_points(Prop::AB),
            Color::White => self.get_points(Prop::AW),
        }
    }

    /// `AE` points.
    pub fn get_cleared_points(&self) -> Result<Vec<Point>> {
        self.get_points(Prop::AE)
    }

    /// Setup stones followed by the move, if it is not a pass.
    pub fn get_all_stones(&self) -> Result<Vec<Move>> {
        let mut out = Vec::new();
        for color in [Color::Black, Color::White] {
            out.extend(
                self.get_placements(color)?
                    .into_iter()
                    .map(|pt| Move::new(color, pt)),
            );
        }
        if let Some(mv) = self.get_move()? {
            if !mv.is_pass() {
                out.push(mv);
            }
        }
        Ok(out)
    }

    /// `LB` values as `(point, text)`.
    pub fn get_labels(&self) -> Result<Vec<(Point, String)>> {
        self.get_all_values(Prop::LB)
            .iter()
            .map(|value| {
                let (coord, text) = value
                    .split_once(':')
                    .ok_or_else(|| Error::InvalidLabel(value.clone()))?;
                let pt = Point::from_sgf_coord(coord.trim())
                    .map_err(|_| Error::InvalidLabel(value.clone()))?;
                Ok((pt, text.to_string()))
            })
            .collect()
    }

    /// Points of one markup property; for `LB` the label text is dropped.
    pub fn get_mark_points(&self, prop: Prop) -> Result<Vec<Point>> {
        if prop == Prop::LB {
            return Ok(self.get_labels()?.into_iter().map(|(pt, _)| pt).collect());
        }
        self.get_points(prop)
    }

    /// Every point carrying one of the [`MARK_PROPS`].
    pub fn get_all_mark_points(&self) -> Result<Vec<Point>> {
        let mut out = Vec::new();
        for prop in MARK_PROPS {
            out.extend(self.get_mark_points(prop)?);
        }
        Ok(out)
    }

    pub fn matches(&self, conditions: &Conditions) -> bool {
        conditions.iter().any(|(prop, substrings)| {
            let Some(values) = self.entry(*prop) else {
                return false;
            };
            substrings.is_empty()
                || values
                    .iter()
                    .any(|v| substrings.iter().any(|s| v.contains(s.as_str())))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prop_roundtrip() {
        for prop in Prop::ALL {
            assert_eq!(prop.as_str().parse::<Prop>().unwrap(), *prop);
        }
        assert_eq!(
            "ZZ".parse::<Prop>(),
            Err(Error::UnknownProperty("ZZ".to_string()))
        );
    }

    #[test]
    fn test_add_appends_and_set_replaces() {
        let mut props = Properties::new();
        props.add(Prop::AB, "aa").add(Prop::AB, "bb");
        assert_eq!(props.get_all_values(Prop::AB), ["aa", "bb"]);
        props.set(Prop::AB, vec!["cc".to_string()]);
        assert_eq!(props.get_all_values(Prop::AB), ["cc"]);
    }

    #[test]
    fn test_remove_one_value() {
        let mut props = Properties::new();
        props.add(Prop::TR, "aa").add(Prop::TR, "bb");
        assert!(props.remove_one_value(Prop::TR, "aa"));
        assert!(!props.remove_one_value(Prop::TR, "zz"));
        assert!(props.remove_one_value(Prop::TR, "bb"));
        assert!(!props.contains(Prop::TR));
        assert!(props.is_empty());
    }

    #[test]
    fn test_insertion_order_kept() {
        let mut props = Properties::new();
        props.add(Prop::W, "cc").add(Prop::C, "hi").add(Prop::AB, "dd");
        let keys: Vec<Prop> = props.iter().map(|(p, _)| p).collect();
        assert_eq!(keys, vec![Prop::W, Prop::C, Prop::AB]);
    }

    #[test]
    fn test_get_move() {
        let mut props = Properties::new();
        assert_eq!(props.get_move().unwrap(), None);
        props.add(Prop::W, "");
        assert_eq!(props.get_move().unwrap(), Some(Move::pass(Color::White)));

        let mut props = Properties::new();
        props.add(Prop::B, "pd");
        assert_eq!(
            props.get_move().unwrap(),
            Some(Move::new(Color::Black, Point::new(15, 3)))
        );

        let mut props = Properties::new();
        props.add(Prop::B, "p");
        assert!(props.get_move().is_err());
    }

    #[test]
    fn test_all_stones_expand_rectangles() {
        let mut props = Properties::new();
        props.add(Prop::AB, "aa:ab").add(Prop::AW, "cc").add(Prop::B, "dd");
        let stones = props.get_all_stones().unwrap();
        assert_eq!(
            stones,
            vec![
                Move::new(Color::Black, Point::new(0, 0)),
                Move::new(Color::Black, Point::new(0, 1)),
                Move::new(Color::White, Point::new(2, 2)),
                Move::new(Color::Black, Point::new(3, 3)),
            ]
        );
    }

    #[test]
    fn test_labels() {
        let mut props = Properties::new();
        props.add(Prop::LB, "ab:A").add(Prop::LB, "cd:12:30");
        assert_eq!(
            props.get_labels().unwrap(),
            vec![
                (Point::new(0, 1), "A".to_string()),
                (Point::new(2, 3), "12:30".to_string())
            ]
        );
        props.add(Prop::LB, "nocolon");
        assert!(matches!(props.get_labels(), Err(Error::InvalidLabel(_))));
    }

    #[test]
    fn test_matches() {
        let mut props = Properties::new();
        props.add(Prop::C, "That is correct!");

        let mut conditions = Conditions::new();
        conditions.insert(Prop::GB, vec![]);
        assert!(!props.matches(&conditions));

        conditions.insert(Prop::C, vec!["Correct".to_string(), "correct".to_string()]);
        assert!(props.matches(&conditions));

        let mut strict = Conditions::new();
        strict.insert(Prop::C, vec!["Wrong".to_string()]);
        assert!(!props.matches(&strict));

        props.add(Prop::GB, "1");
        let mut any_gb = Conditions::new();
        any_gb.insert(Prop::GB, vec![]);
        assert!(props.matches(&any_gb));
    }

    #[test]
    fn test_player_to_move() {
        let mut props = Properties::new();
        assert_eq!(props.player_to_move(), None);
        props.add(Prop::PL, "W");
        assert_eq!(props.player_to_move(), Some(Color::White));
    }
}
