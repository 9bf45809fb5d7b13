//! Scoring problem positions against correctness conditions.

use serde::Serialize;

use crate::error::Result;
use crate::goban::Move;
use crate::movetree::MoveTree;
use crate::properties::{Conditions, Prop};
use crate::treepath::flatten_move_tree;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProblemResult {
    Correct,
    Incorrect,
    /// Some continuations reach a correct node and some do not.
    Indeterminate,
}

/// `GB` anywhere, or a comment saying "Correct".
pub fn default_conditions() -> Conditions {
    Conditions::from([
        (Prop::GB, Vec::new()),
        (Prop::C, vec!["Correct".to_string(), "is correct".to_string()]),
    ])
}

/// Whether the current position of `movetree` is correct.
///
/// A position matching `conditions` is correct. Otherwise every line from
/// here to a leaf is checked for a matching node: if none of them has one the
/// position is incorrect, and if any of them does the outcome still depends
/// on how the line is played.
pub fn position_correctness(movetree: &MoveTree, conditions: &Conditions) -> ProblemResult {
    if movetree.properties().matches(conditions) {
        return ProblemResult::Correct;
    }

    let any_correct = flatten_move_tree(movetree).iter().any(|path| {
        let mut mt = movetree.new_tree_ref();
        path.iter().any(|&idx| {
            mt.move_down(idx);
            mt.properties().matches(conditions)
        })
    });
    if any_correct {
        ProblemResult::Indeterminate
    } else {
        ProblemResult::Incorrect
    }
}

/// Child moves that do not lead to an incorrect position.
pub fn correct_next_moves(movetree: &MoveTree, conditions: &Conditions) -> Result<Vec<Move>> {
    let mut out = Vec::new();
    for i in 0..movetree.num_children() {
        let mut child = movetree.new_tree_ref();
        child.move_down(i);
        if position_correctness(&child, conditions) == ProblemResult::Incorrect {
            continue;
        }
        if let Some(mv) = child.properties().get_move()? {
            out.push(mv);
        }
    }
    Ok(out)
}
