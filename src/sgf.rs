//! SGF reader and writer.
//!
//! Reading is driven by the pest grammar in `sgf.pest`. Only the first game
//! tree of a collection is read. Property ids may carry lowercase letters
//! (old FF[3] style, e.g. `AddBlack`); only the uppercase letters are kept.
//! Ids outside [`Prop`] are logged and dropped.

use std::str::FromStr;

use pest::Parser;
use pest::error::InputLocation;
use pest::iterators::Pair;
use pest_derive::Parser;
use tracing::{trace, warn};

use crate::error::{Error, Result};
use crate::movetree::{MoveTree, NodeArena, NodeId};
use crate::properties::{Prop, Properties};

#[derive(Parser)]
#[grammar = "sgf.pest"]
struct SgfParser;

fn sgf_error(err: pest::error::Error<Rule>) -> Error {
    let offset = match err.location {
        InputLocation::Pos(pos) => pos,
        InputLocation::Span((start, _)) => start,
    };
    Error::Sgf {
        offset,
        message: err.variant.message().into_owned(),
    }
}

fn structure_error(pair: &Pair<Rule>, message: &str) -> Error {
    Error::Sgf {
        offset: pair.as_span().start(),
        message: message.to_string(),
    }
}

/// Parse the first game tree in `sgf`. The cursor of the result is at the root.
pub fn parse(sgf: &str) -> Result<MoveTree> {
    let collection = SgfParser::parse(Rule::collection, sgf)
        .map_err(sgf_error)?
        .next()
        .ok_or_else(|| Error::Sgf {
            offset: 0,
            message: "empty input".to_string(),
        })?;
    let game_tree = collection
        .clone()
        .into_inner()
        .find(|pair| pair.as_rule() == Rule::game_tree)
        .ok_or_else(|| structure_error(&collection, "missing game tree"))?;

    let mut inner = game_tree.clone().into_inner();
    let sequence = inner
        .next()
        .ok_or_else(|| structure_error(&game_tree, "missing node sequence"))?;
    let mut nodes = sequence.clone().into_inner();
    let root = nodes
        .next()
        .ok_or_else(|| structure_error(&sequence, "missing root node"))?;

    let mut arena = NodeArena::new(parse_node(root)?);
    let mut current = NodeArena::ROOT;
    for node in nodes {
        current = arena.add_child(current, parse_node(node)?);
    }
    for variation in inner {
        parse_game_tree(variation, &mut arena, current)?;
    }
    trace!(nodes = arena.len(), "parsed SGF");
    Ok(MoveTree::from_arena(arena))
}

/// A variation hanging off `parent`.
fn parse_game_tree(pair: Pair<Rule>, arena: &mut NodeArena, parent: NodeId) -> Result<()> {
    let mut current = parent;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::sequence => {
                for node in inner.into_inner() {
                    current = arena.add_child(current, parse_node(node)?);
                }
            }
            Rule::game_tree => parse_game_tree(inner, arena, current)?,
            _ => return Err(structure_error(&inner, "unexpected rule in game tree")),
        }
    }
    Ok(())
}

fn parse_node(pair: Pair<Rule>) -> Result<Properties> {
    let mut props = Properties::new();
    for property in pair.into_inner() {
        let start = property.as_span().start();
        let mut inner = property.into_inner();
        let Some(ident) = inner.next() else {
            continue;
        };
        let id: String = ident.as_str().chars().filter(char::is_ascii_uppercase).collect();
        if id.is_empty() {
            return Err(Error::Sgf {
                offset: start,
                message: format!("property id {:?} has no uppercase letters", ident.as_str()),
            });
        }

        let Ok(prop) = Prop::from_str(&id) else {
            warn!(property = %id, offset = start, "dropping unknown SGF property");
            continue;
        };
        for value in inner {
            let text = value.into_inner().next().map_or("", |text| text.as_str());
            props.add(prop, unescape(text));
        }
    }
    Ok(props)
}

/// Resolve `\` escapes and drop escaped (soft) line breaks.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\n') | None => {}
            Some('\r') => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            Some(escaped) => out.push(escaped),
        }
    }
    out
}

/// Serialize the whole tree `movetree` belongs to, whatever its position.
pub fn write(movetree: &MoveTree) -> String {
    let mut out = String::from("(");
    write_sequence(movetree.arena(), NodeArena::ROOT, &mut out);
    out.push(')');
    out
}

fn write_sequence(arena: &NodeArena, mut id: NodeId, out: &mut String) {
    loop {
        write_node(arena, id, out);
        match arena.get(id).children() {
            [] => return,
            [only] => id = *only,
            children => {
                for &child in children {
                    out.push('(');
                    write_sequence(arena, child, out);
                    out.push(')');
                }
                return;
            }
        }
    }
}

fn write_node(arena: &NodeArena, id: NodeId, out: &mut String) {
    out.push(';');
    for (prop, values) in arena.get(id).properties().iter() {
        out.push_str(prop.as_str());
        for value in values {
            out.push('[');
            for c in value.chars() {
                if c == ']' || c == '\\' {
                    out.push('\\');
                }
                out.push(c);
            }
            out.push(']');
        }
    }
}
