//! Treepaths: sequences of child indices through a move tree.
//!
//! Two string forms exist.
//!
//! *Fragments* list variation indices separated by `.`, e.g. `"0.0.2.1"`.
//! `X:N` stands for N copies of `X` (`"0:4"` is `[0, 0, 0, 0]`), and a
//! trailing `+` means "then keep taking the first child until the tree ends".
//!
//! *Initial paths* start with a move number on the mainline instead: `"3"`
//! is three steps down the first child, and `"2.3"` is `[0, 0, 3]`. After the
//! move number comes either `.fragment` or `+`.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::constants::DEFAULT_NEXT_MOVES_LIMIT;
use crate::error::{Error, Result};
use crate::goban::{Color, Goban, Move};
use crate::movetree::MoveTree;
use crate::point::Point;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Treepath {
    steps: Vec<usize>,
    /// Follow first children to the end of the tree after `steps`.
    to_end: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Number(&'a str),
    Dot,
    Colon,
    Plus,
}

fn tokenize(s: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = 0;
    for (i, c) in s.char_indices() {
        let delim = match c {
            '.' => Token::Dot,
            ':' => Token::Colon,
            '+' => Token::Plus,
            _ => continue,
        };
        tokens.push(Token::Number(&s[start..i]));
        tokens.push(delim);
        start = i + c.len_utf8();
    }
    tokens.push(Token::Number(&s[start..]));
    tokens
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum State {
    Variation,
    Separator,
    Multiplier,
}

impl Treepath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: Vec<usize>) -> Self {
        Self {
            steps,
            to_end: false,
        }
    }

    /// The path that follows the mainline from wherever it is applied.
    pub fn to_end_path() -> Self {
        Self {
            steps: Vec::new(),
            to_end: true,
        }
    }

    pub fn steps(&self) -> &[usize] {
        &self.steps
    }

    pub fn to_end(&self) -> bool {
        self.to_end
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty() && !self.to_end
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Parse a fragment such as `"1.2:1.0.2:3"` (which is `[1, 2, 0, 2, 2, 2]`).
    pub fn parse_fragment(s: &str) -> Result<Treepath> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Treepath::new());
        }
        if s == "+" {
            return Ok(Treepath::to_end_path());
        }

        let token_err = |token: &str| Error::TreepathToken {
            token: token.to_string(),
            path: s.to_string(),
        };
        let mut steps = Vec::new();
        let mut state = State::Variation;
        let mut prev: Option<usize> = None;
        let mut tokens = tokenize(s).into_iter();

        while let Some(token) = tokens.next() {
            match (state, token) {
                (State::Separator, Token::Dot) => state = State::Variation,
                (State::Separator, Token::Colon) => state = State::Multiplier,
                (State::Separator, Token::Plus) => {
                    return match tokens.next() {
                        Some(Token::Number("")) | None => Ok(Treepath { steps, to_end: true }),
                        Some(_) => Err(token_err("+")),
                    };
                }
                (State::Separator, Token::Number("")) => {}
                (State::Variation | State::Multiplier, Token::Number(num)) => {
                    let n: usize = num.parse().map_err(|_| token_err(num))?;
                    if state == State::Variation {
                        steps.push(n);
                        prev = Some(n);
                    } else {
                        let var = prev
                            .take()
                            .ok_or_else(|| Error::TreepathMultiplier(s.to_string()))?;
                        // The variation is already in once.
                        if n == 0 {
                            steps.pop();
                        } else {
                            steps.extend(std::iter::repeat_n(var, n - 1));
                        }
                    }
                    state = State::Separator;
                }
                (State::Multiplier, _) => return Err(Error::TreepathMultiplier(s.to_string())),
                (_, token) => return Err(token_err(&token.to_string())),
            }
        }
        if state != State::Separator {
            return Err(token_err(""));
        }
        Ok(Treepath::from_steps(steps))
    }

    /// Parse an initial path such as `"3.1"` (which is `[0, 0, 0, 1]`).
    pub fn parse_initial_path(s: &str) -> Result<Treepath> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Treepath::new());
        }
        if s == "+" {
            return Ok(Treepath::to_end_path());
        }
        let digits = s.bytes().take_while(u8::is_ascii_digit).count();
        let (num, rest) = s.split_at(digits);
        let moves: usize = num.parse().map_err(|_| Error::TreepathToken {
            token: s.chars().next().map(String::from).unwrap_or_default(),
            path: s.to_string(),
        })?;

        let mut path = Treepath::from_steps(vec![0; moves]);
        match rest.chars().next() {
            None => {}
            Some('.') => {
                let fragment = Treepath::parse_fragment(&rest[1..])?;
                path.steps.extend(fragment.steps);
                path.to_end = fragment.to_end;
            }
            Some('+') if rest.len() == 1 => path.to_end = true,
            Some(c) => {
                return Err(Error::TreepathToken {
                    token: c.to_string(),
                    path: s.to_string(),
                });
            }
        }
        Ok(path)
    }

    /// Fragment form with runs compressed, e.g. `[0, 0, 0, 1]` is `"0:3.1"`.
    pub fn to_fragment_string(&self) -> String {
        let mut out = fragment_string(&self.steps);
        if self.to_end {
            out.push('+');
        }
        out
    }

    /// Initial-path form: leading mainline steps become a move number.
    pub fn to_initial_path_string(&self) -> String {
        let moves = self.steps.iter().take_while(|&&s| s == 0).count();
        let mut out = moves.to_string();
        let rest = &self.steps[moves..];
        if !rest.is_empty() {
            out.push('.');
            out.push_str(&fragment_string(rest));
        }
        if self.to_end {
            out.push('+');
        }
        out
    }

    /// Concrete indices this path walks from `movetree`'s position, with the
    /// `+` expanded. Stops early if a step names a missing child.
    pub fn resolve(&self, movetree: &MoveTree) -> Vec<usize> {
        let mut mt = movetree.new_tree_ref();
        let mut out = Vec::with_capacity(self.steps.len());
        for &step in &self.steps {
            if !mt.move_down(step) {
                return out;
            }
            out.push(step);
        }
        if self.to_end {
            while mt.move_down(0) {
                out.push(0);
            }
        }
        out
    }
}

fn fragment_string(steps: &[usize]) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut i = 0;
    while i < steps.len() {
        let var = steps[i];
        let run = steps[i..].iter().take_while(|&&s| s == var).count();
        if run < 2 {
            parts.push(var.to_string());
        } else {
            parts.push(format!("{var}:{run}"));
        }
        i += run;
    }
    parts.join(".")
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => f.write_str(n),
            Token::Dot => f.write_str("."),
            Token::Colon => f.write_str(":"),
            Token::Plus => f.write_str("+"),
        }
    }
}

impl FromStr for Treepath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Treepath> {
        Treepath::parse_fragment(s)
    }
}

impl From<Vec<usize>> for Treepath {
    fn from(steps: Vec<usize>) -> Self {
        Treepath::from_steps(steps)
    }
}

impl fmt::Display for Treepath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_fragment_string())
    }
}

// =============================================================================
// Applying next moves
// =============================================================================

/// Why an applied move lands on an occupied point.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CollisionKind {
    /// The goban already has a stone there.
    Goban,
    /// An earlier move of the same pass was played there; holds its step index.
    Earlier(usize),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AppliedMove {
    /// Index of this move within the next-moves path.
    pub step: usize,
    pub color: Color,
    pub point: Point,
    pub collision: Option<CollisionKind>,
}

#[derive(Clone, Debug)]
pub struct AppliedMoves {
    /// Cursor at the end of the applied path.
    pub movetree: MoveTree,
    /// Non-pass moves, in order.
    pub moves: Vec<AppliedMove>,
}

/// Walk `path` from `movetree`'s position and report the moves met along the
/// way, flagging collisions against `goban` and against each other. Nothing
/// is placed on the goban.
pub fn apply_next_moves(
    movetree: &MoveTree,
    goban: &Goban,
    path: &Treepath,
) -> Result<AppliedMoves> {
    let mut mt = movetree.new_tree_ref();
    let mut placed: HashMap<Point, usize> = HashMap::new();
    let mut moves = Vec::new();

    for (step, idx) in path.resolve(movetree).into_iter().enumerate() {
        mt.move_down(idx);
        let Some(Move {
            color,
            point: Some(point),
        }) = mt.properties().get_move()?
        else {
            continue;
        };
        let collision = if goban.stone_at(point).is_some() {
            Some(CollisionKind::Goban)
        } else {
            placed.get(&point).map(|&earlier| CollisionKind::Earlier(earlier))
        };
        moves.push(AppliedMove {
            step,
            color,
            point,
            collision,
        });
        placed.insert(point, step);
    }

    Ok(AppliedMoves { movetree: mt, moves })
}

// =============================================================================
// Finding next-moves paths
// =============================================================================

#[derive(Copy, Clone, Debug)]
pub struct NextMovesOptions {
    /// Most steps to walk back up the tree.
    pub max_steps: usize,
    /// Stop at the first ancestor carrying a comment.
    pub break_on_comment: bool,
}

impl Default for NextMovesOptions {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_NEXT_MOVES_LIMIT,
            break_on_comment: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct NextMovesPath {
    /// Cursor at the start of the next-moves sequence.
    pub movetree: MoveTree,
    /// Path from the root to that start.
    pub treepath: Treepath,
    /// Path from the start back down to the target.
    pub next_moves: Treepath,
}

/// Work out where the interesting sequence ending at a target node begins.
///
/// Walks up from the target (the node at `target`, or the cursor's position
/// if `None`) until a comment is met, a variation rejoins the mainline, the
/// root is reached, or `max_steps` steps have been taken.
pub fn find_next_moves_path(
    movetree: &MoveTree,
    target: Option<&Treepath>,
    options: &NextMovesOptions,
) -> NextMovesPath {
    let mut mt = match target {
        Some(path) => movetree.get_tree_from_root(path),
        None => movetree.new_tree_ref(),
    };
    let start_mainline = mt.on_mainline();
    let mut next_moves = Vec::new();

    for _ in 0..options.max_steps {
        if mt.is_root() {
            break;
        }
        next_moves.push(mt.var_num());
        mt.move_up();
        if options.break_on_comment && mt.properties().get_comment().is_some() {
            break;
        }
        if !start_mainline && mt.on_mainline() {
            break;
        }
    }
    next_moves.reverse();

    NextMovesPath {
        treepath: Treepath::from_steps(mt.tree_path_to_here()),
        next_moves: Treepath::from_steps(next_moves),
        movetree: mt,
    }
}

/// Every path from the cursor's position down to a leaf, in child order.
pub fn flatten_move_tree(movetree: &MoveTree) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    let arena = movetree.arena();
    let mut stack: Vec<(crate::movetree::NodeId, Vec<usize>)> =
        vec![(movetree.node_id(), Vec::new())];
    while let Some((id, path)) = stack.pop() {
        let children = arena.get(id).children();
        if children.is_empty() {
            if !path.is_empty() {
                out.push(path);
            }
            continue;
        }
        for (i, &child) in children.iter().enumerate().rev() {
            let mut next = path.clone();
            next.push(i);
            stack.push((child, next));
        }
    }
    out
}
