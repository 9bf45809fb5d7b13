//! Game-record trees and cursors over them.
//!
//! Nodes live in a [`NodeArena`] and refer to each other by [`NodeId`]. A
//! [`MoveTree`] is a cursor: a shared handle on the arena plus the current
//! node. Navigation only moves the cursor. Structural edits go through
//! copy-on-write, so other cursors over the same arena never see them.

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use crate::constants::DEFAULT_BOARD_SIZE;
use crate::error::Result;
use crate::goban::{Color, Goban, Move};
use crate::point::Point;
use crate::properties::{Prop, Properties};
use crate::treepath::Treepath;

/// Handle of a node inside its arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// One ply, or the root / setup position.
#[derive(Clone, Debug)]
pub struct MoveNode {
    properties: Properties,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Distance from the root.
    node_num: usize,
    /// Index among the parent's children.
    var_num: usize,
}

impl MoveNode {
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    pub fn node_num(&self) -> usize {
        self.node_num
    }

    pub fn var_num(&self) -> usize {
        self.var_num
    }
}

/// Storage for every node of one game tree. The root is always `NodeId(0)`.
#[derive(Clone, Debug)]
pub struct NodeArena {
    nodes: Vec<MoveNode>,
}

impl NodeArena {
    pub const ROOT: NodeId = NodeId(0);

    pub fn new(root: Properties) -> Self {
        Self {
            nodes: vec![MoveNode {
                properties: root,
                parent: None,
                children: Vec::new(),
                node_num: 0,
                var_num: 0,
            }],
        }
    }

    pub fn get(&self, id: NodeId) -> &MoveNode {
        &self.nodes[id.0]
    }

    fn get_mut(&mut self, id: NodeId) -> &mut MoveNode {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a new last child under `parent`.
    pub fn add_child(&mut self, parent: NodeId, properties: Properties) -> NodeId {
        let id = NodeId(self.nodes.len());
        let parent_node = self.get(parent);
        let node = MoveNode {
            properties,
            parent: Some(parent),
            children: Vec::new(),
            node_num: parent_node.node_num + 1,
            var_num: parent_node.children.len(),
        };
        self.nodes.push(node);
        self.get_mut(parent).children.push(id);
        id
    }
}

/// A cursor over a shared game tree.
#[derive(Clone, Debug)]
pub struct MoveTree {
    arena: Arc<NodeArena>,
    current: NodeId,
    mainline: OnceLock<HashSet<NodeId>>,
}

impl MoveTree {
    /// An empty game of the given board size.
    pub fn new(size: usize) -> Self {
        let mut root = Properties::new();
        root.add(Prop::GM, "1")
            .add(Prop::FF, "4")
            .add(Prop::SZ, size.to_string());
        Self::from_arena(NodeArena::new(root))
    }

    pub fn from_arena(arena: NodeArena) -> Self {
        Self {
            arena: Arc::new(arena),
            current: NodeArena::ROOT,
            mainline: OnceLock::new(),
        }
    }

    /// Parse an SGF game record; the cursor starts at the root.
    pub fn from_sgf(sgf: &str) -> Result<Self> {
        crate::sgf::parse(sgf)
    }

    pub fn to_sgf(&self) -> String {
        crate::sgf::write(self)
    }

    /// Another cursor over the same nodes, at the same position.
    pub fn new_tree_ref(&self) -> MoveTree {
        self.clone()
    }

    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    pub fn node_id(&self) -> NodeId {
        self.current
    }

    pub fn node(&self) -> &MoveNode {
        self.arena.get(self.current)
    }

    pub fn properties(&self) -> &Properties {
        &self.node().properties
    }

    pub fn properties_mut(&mut self) -> &mut Properties {
        let current = self.current;
        &mut Arc::make_mut(&mut self.arena).get_mut(current).properties
    }

    /// Properties of child `variation`, if there is one.
    pub fn child_properties(&self, variation: usize) -> Option<&Properties> {
        let id = *self.node().children.get(variation)?;
        Some(&self.arena.get(id).properties)
    }

    pub fn num_children(&self) -> usize {
        self.node().num_children()
    }

    pub fn node_num(&self) -> usize {
        self.node().node_num
    }

    pub fn var_num(&self) -> usize {
        self.node().var_num
    }

    /// Board size from the root `SZ`, 19 if missing or unreadable.
    pub fn intersections(&self) -> usize {
        self.arena
            .get(NodeArena::ROOT)
            .properties
            .get_one_value(Prop::SZ)
            .and_then(|v| v.split(':').next()?.trim().parse().ok())
            .unwrap_or(DEFAULT_BOARD_SIZE)
    }

    /// Add a child under the current node and move to it.
    pub fn add_node(&mut self) -> &mut Self {
        let current = self.current;
        self.current = Arc::make_mut(&mut self.arena).add_child(current, Properties::new());
        self.mainline = OnceLock::new();
        self
    }

    /// Step to child `variation`; stays put if it does not exist.
    pub fn move_down(&mut self, variation: usize) -> bool {
        match self.node().children.get(variation) {
            Some(&child) => {
                self.current = child;
                true
            }
            None => false,
        }
    }

    /// Step to the parent; stays put at the root.
    pub fn move_up(&mut self) -> bool {
        match self.node().parent {
            Some(parent) => {
                self.current = parent;
                true
            }
            None => false,
        }
    }

    pub fn to_root(&mut self) -> &mut Self {
        self.current = NodeArena::ROOT;
        self
    }

    pub fn is_root(&self) -> bool {
        self.current == NodeArena::ROOT
    }

    fn mainline_set(&self) -> &HashSet<NodeId> {
        self.mainline.get_or_init(|| {
            let mut set = HashSet::new();
            let mut id = NodeArena::ROOT;
            set.insert(id);
            while let Some(&child) = self.arena.get(id).children.first() {
                set.insert(child);
                id = child;
            }
            set
        })
    }

    /// Whether the current node is reached from the root by first children only.
    pub fn on_mainline(&self) -> bool {
        self.mainline_set().contains(&self.current)
    }

    /// A cursor at the nearest mainline node at or above the current one.
    pub fn mainline_tree(&self) -> MoveTree {
        let mut mt = self.new_tree_ref();
        while !mt.on_mainline() && mt.move_up() {}
        mt
    }

    /// The move on the mainline node following [`MoveTree::mainline_tree`].
    pub fn next_mainline_move(&self) -> Result<Option<Move>> {
        let mut mt = self.mainline_tree();
        if !mt.move_down(0) {
            return Ok(None);
        }
        mt.properties().get_move()
    }

    /// Child indices leading from the root to here.
    pub fn tree_path_to_here(&self) -> Vec<usize> {
        let mut path = Vec::with_capacity(self.node_num());
        let mut id = self.current;
        while let Some(parent) = self.arena.get(id).parent {
            path.push(self.arena.get(id).var_num);
            id = parent;
        }
        path.reverse();
        path
    }

    /// A cursor at the end of `path`, applied from the root.
    pub fn get_tree_from_root(&self, path: &Treepath) -> MoveTree {
        let mut mt = self.new_tree_ref();
        mt.to_root();
        for &step in path.steps() {
            mt.move_down(step);
        }
        if path.to_end() {
            while mt.move_down(0) {}
        }
        mt
    }

    /// Color to play next. `PL` on the current node wins; otherwise the
    /// opposite of the nearest move at or above here, Black if there is none.
    pub fn current_player(&self) -> Result<Color> {
        if let Some(color) = self.properties().player_to_move() {
            return Ok(color);
        }
        let mut id = Some(self.current);
        while let Some(node_id) = id {
            let node = self.arena.get(node_id);
            if let Some(mv) = node.properties.get_move()? {
                return Ok(mv.color.opposite());
            }
            id = node.parent;
        }
        Ok(Color::Black)
    }

    /// Child index whose move is `color` at `pt`.
    pub fn find_next_move(&self, pt: Point, color: Color) -> Result<Option<usize>> {
        let wanted = Some(Move::new(color, pt));
        for (i, &child) in self.node().children.iter().enumerate() {
            if self.arena.get(child).properties.get_move()? == wanted {
                return Ok(Some(i));
            }
        }
        Ok(None)
    }

    /// Visit every node below and including the current one, depth first.
    pub fn recurse<F: FnMut(&MoveTree)>(&self, mut f: F) {
        let mut mt = self.new_tree_ref();
        let mut stack = vec![self.current];
        while let Some(id) = stack.pop() {
            mt.current = id;
            f(&mt);
            stack.extend(self.arena.get(id).children.iter().rev());
        }
    }

    pub fn recurse_from_root<F: FnMut(&MoveTree)>(&self, f: F) {
        let mut mt = self.new_tree_ref();
        mt.to_root();
        mt.recurse(f);
    }

    /// A fresh game whose root holds the current position as setup stones.
    ///
    /// Game info from the old root and the current node's comment and markup
    /// carry over, as do the current node's variations. History is dropped. A
    /// `PL` is added when the side to move would otherwise change.
    pub fn rebase(&self) -> Result<MoveTree> {
        let (goban, _) = Goban::from_movetree(self)?;

        let mut root = Properties::new();
        let old_root = &self.arena.get(NodeArena::ROOT).properties;
        for (prop, values) in old_root.iter() {
            if is_position_prop(prop) || is_markup_prop(prop) || prop == Prop::C {
                continue;
            }
            root.set(prop, values.to_vec());
        }
        for (prop, values) in self.properties().iter() {
            if is_markup_prop(prop) || prop == Prop::C {
                root.set(prop, values.to_vec());
            }
        }
        for stone in goban.placed_stones() {
            if let Some(pt) = stone.point {
                let prop = match stone.color {
                    Color::Black => Prop::AB,
                    Color::White => Prop::AW,
                };
                root.add(prop, pt.to_sgf_coord());
            }
        }

        let mut arena = NodeArena::new(root);
        let mut stack: Vec<(NodeId, NodeId)> = self
            .node()
            .children
            .iter()
            .map(|&child| (child, NodeArena::ROOT))
            .collect();
        stack.reverse();
        while let Some((old, new_parent)) = stack.pop() {
            let old_node = self.arena.get(old);
            let new_id = arena.add_child(new_parent, old_node.properties.clone());
            stack.extend(old_node.children.iter().rev().map(|&c| (c, new_id)));
        }

        let mut rebased = MoveTree::from_arena(arena);
        let player = self.current_player()?;
        if rebased.current_player()? != player {
            rebased
                .properties_mut()
                .add(Prop::PL, player.as_sgf_token());
        }
        Ok(rebased)
    }
}

fn is_position_prop(prop: Prop) -> bool {
    matches!(
        prop,
        Prop::B | Prop::W | Prop::AB | Prop::AW | Prop::AE | Prop::PL | Prop::KO | Prop::MN
    )
}

fn is_markup_prop(prop: Prop) -> bool {
    matches!(
        prop,
        Prop::AR
            | Prop::CR
            | Prop::DD
            | Prop::LB
            | Prop::LN
            | Prop::MA
            | Prop::SL
            | Prop::SQ
            | Prop::TR
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Root, then B[aa] with two variations W[bb] / W[cc], mainline continues
    /// with B[dd] under W[bb].
    fn sample() -> MoveTree {
        let mut mt = MoveTree::new(9);
        mt.add_node().properties_mut().add(Prop::B, "aa");
        mt.add_node().properties_mut().add(Prop::W, "bb");
        mt.add_node().properties_mut().add(Prop::B, "dd");
        mt.to_root();
        mt.move_down(0);
        mt.add_node().properties_mut().add(Prop::W, "cc");
        mt.to_root();
        mt
    }

    #[test]
    fn test_navigation() {
        let mut mt = sample();
        assert!(mt.is_root());
        assert!(!mt.move_up());
        assert!(mt.move_down(0));
        assert_eq!(mt.num_children(), 2);
        assert!(!mt.move_down(5));
        assert_eq!(mt.node_num(), 1);
        assert!(mt.move_down(1));
        assert_eq!(mt.var_num(), 1);
        assert_eq!(mt.tree_path_to_here(), vec![0, 1]);
        assert!(mt.move_up());
        assert_eq!(mt.node_num(), 1);
    }

    #[test]
    fn test_cursor_refs_are_independent() {
        let mut mt = sample();
        let mut other = mt.new_tree_ref();
        other.move_down(0);
        assert!(mt.is_root());
        assert_eq!(other.node_num(), 1);

        // Adding to one cursor leaves the other's graph alone.
        mt.add_node();
        let mut check = other.new_tree_ref();
        check.to_root();
        assert_eq!(check.num_children(), 1);
    }

    #[test]
    fn test_mainline() {
        let mut mt = sample();
        assert!(mt.on_mainline());
        mt.move_down(0);
        mt.move_down(1);
        assert!(!mt.on_mainline());
        assert_eq!(mt.mainline_tree().node_num(), 1);
        assert_eq!(
            mt.next_mainline_move().unwrap(),
            Some(Move::new(Color::White, Point::new(1, 1)))
        );
    }

    #[test]
    fn test_current_player() {
        let mut mt = sample();
        assert_eq!(mt.current_player().unwrap(), Color::Black);
        mt.move_down(0);
        assert_eq!(mt.current_player().unwrap(), Color::White);
        mt.move_down(0);
        assert_eq!(mt.current_player().unwrap(), Color::Black);

        let mut setup = MoveTree::new(9);
        setup.add_node().properties_mut().add(Prop::AB, "ee");
        assert_eq!(setup.current_player().unwrap(), Color::Black);
        setup.properties_mut().add(Prop::PL, "W");
        assert_eq!(setup.current_player().unwrap(), Color::White);
    }

    #[test]
    fn test_find_next_move() {
        let mut mt = sample();
        mt.move_down(0);
        assert_eq!(mt.find_next_move(Point::new(2, 2), Color::White).unwrap(), Some(1));
        assert_eq!(mt.find_next_move(Point::new(2, 2), Color::Black).unwrap(), None);
    }

    #[test]
    fn test_malformed_moves_are_errors() {
        let mut mt = MoveTree::new(9);
        mt.add_node().properties_mut().add(Prop::B, "c");
        assert!(matches!(
            mt.current_player(),
            Err(crate::error::Error::InvalidSgfCoord(_))
        ));
        mt.move_up();
        assert!(mt.find_next_move(Point::new(2, 2), Color::Black).is_err());
    }

    #[test]
    fn test_get_tree_from_root() {
        let mt = sample();
        let end = mt.get_tree_from_root(&Treepath::to_end_path());
        assert_eq!(end.tree_path_to_here(), vec![0, 0, 0]);
        let var = mt.get_tree_from_root(&Treepath::from_steps(vec![0, 1, 7]));
        assert_eq!(var.tree_path_to_here(), vec![0, 1]);
    }

    #[test]
    fn test_recurse_visits_all_nodes() {
        let mt = sample();
        let mut seen = Vec::new();
        mt.recurse_from_root(|node| seen.push(node.tree_path_to_here()));
        assert_eq!(
            seen,
            vec![vec![], vec![0], vec![0, 0], vec![0, 0, 0], vec![0, 1]]
        );
    }

    #[test]
    fn test_intersections() {
        assert_eq!(MoveTree::new(13).intersections(), 13);
        let mut mt = MoveTree::new(13);
        mt.properties_mut().remove(Prop::SZ);
        assert_eq!(mt.intersections(), 19);
    }

    #[test]
    fn test_rebase() {
        let mut mt = sample();
        mt.move_down(0);
        mt.properties_mut().add(Prop::C, "rebased here");
        let rebased = mt.rebase().unwrap();

        assert!(rebased.is_root());
        assert_eq!(rebased.intersections(), 9);
        assert_eq!(rebased.properties().get_all_values(Prop::AB), ["aa"]);
        assert_eq!(rebased.properties().get_comment(), Some("rebased here"));
        assert_eq!(rebased.properties().get_move().unwrap(), None);
        assert_eq!(rebased.num_children(), 2);
        // White was to move; the fresh root needs a PL to keep that.
        assert_eq!(rebased.current_player().unwrap(), Color::White);

        let mut deeper = rebased.new_tree_ref();
        deeper.move_down(0);
        deeper.move_down(0);
        assert_eq!(
            deeper.properties().get_move().unwrap(),
            Some(Move::new(Color::Black, Point::new(3, 3)))
        );
    }
}
