//! Turns a move-tree position into a [`Flattened`] snapshot.
//!
//! The pipeline, in order:
//! 1. move to the initial position and build its goban
//! 2. resolve the next-moves path and the starting move number
//! 3. pick the crop region (and rotation)
//! 4. walk the next moves, recording collisions
//! 5. build the stone and mark maps, label moves and variations
//! 6. cut the result down to the crop box

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::debug;

use crate::bbox::BoundingBox;
use crate::constants::{COLLISION_LABELS, CROP_REGION_MIN_SIZE, MINIMAL_CROP_MARGIN};
use crate::error::Result;
use crate::flattened::{BaseSymbol, Board, Collision, Flattened, Intersection, Mark, MarkMap};
use crate::goban::{Color, Goban, Move};
use crate::movetree::MoveTree;
use crate::orientation::{
    BoardRegion, CropRegions, RegionOrdering, crop_box, find_canonical_rotation,
    minimal_bounding_box, rotate_bounding_box,
};
use crate::point::{Point, Rotation};
use crate::problems::position_correctness;
use crate::properties::Conditions;
use crate::treepath::{CollisionKind, Treepath, apply_next_moves};

/// When to label the children of the shown position.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ShowVariations {
    #[default]
    Never,
    Always,
    MoreThanOne,
}

#[derive(Clone, Debug, Default)]
pub struct FlattenOptions {
    /// Path from the root to the position to show; the tree's own cursor if unset.
    pub initial_position: Option<Treepath>,
    /// Moves to play out on top of the position, numbered on the diagram.
    pub next_moves_path: Treepath,
    /// Number for the first next move; worked out from the tree if unset.
    pub starting_move_num: Option<usize>,
    pub board_region: BoardRegion,
    /// Allowed regions; anything else falls back to the whole board. Empty
    /// allows all.
    pub region_restrictions: Vec<BoardRegion>,
    pub show_next_variations: ShowVariations,
    /// Child move whose variation label is set apart.
    pub selected_next_move: Option<Move>,
    pub mark_last_move: bool,
    pub mark_ko: bool,
    pub problem_conditions: Option<Conditions>,
    pub rotation: Rotation,
    /// Pick the rotation that moves the problem into these regions, ignoring
    /// `rotation`.
    pub auto_rotate_crop_prefs: Option<RegionOrdering>,
    /// Goban for the initial position, if the caller already has one.
    pub goban: Option<Goban>,
}

/// Long-lived flattening context holding lookup tables and cached boards.
#[derive(Debug, Default)]
pub struct Flattener {
    crop_regions: OnceLock<CropRegions>,
    empty: Mutex<HashMap<usize, Arc<Flattened>>>,
}

impl Flattener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Region table for full-size boards.
    pub fn crop_regions(&self) -> &CropRegions {
        self.crop_regions
            .get_or_init(|| CropRegions::new(CROP_REGION_MIN_SIZE))
    }

    /// An empty `size` board, built once per size.
    pub fn empty(&self, size: usize) -> Result<Arc<Flattened>> {
        let mut cache = self.empty.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(flat) = cache.get(&size) {
            return Ok(Arc::clone(flat));
        }
        let flat = Arc::new(self.flatten(&MoveTree::new(size), &FlattenOptions::default())?);
        cache.insert(size, Arc::clone(&flat));
        Ok(flat)
    }

    pub fn flatten(&self, movetree: &MoveTree, options: &FlattenOptions) -> Result<Flattened> {
        let mt = match &options.initial_position {
            Some(path) => movetree.get_tree_from_root(path),
            None => movetree.new_tree_ref(),
        };
        let size = mt.intersections();
        let goban = match &options.goban {
            Some(goban) => goban.clone(),
            None => Goban::from_movetree(&mt)?.0,
        };

        let next_moves = options.next_moves_path.resolve(&mt);
        let starting_move_num = options
            .starting_move_num
            .unwrap_or_else(|| find_starting_move_num(&mt, &next_moves));
        let ending_move_num = (starting_move_num + next_moves.len())
            .saturating_sub(1)
            .max(starting_move_num);

        let rotation = match &options.auto_rotate_crop_prefs {
            Some(prefs) => find_canonical_rotation(self.crop_regions(), &mt, prefs)?,
            None => options.rotation,
        };
        let (region, crop) = self.resolve_region(&mt, &next_moves, rotation, options)?;

        let mainline = mt.mainline_tree();
        let mainline_move_num = mainline.node_num();
        let mainline_move = mainline.properties().get_move()?;
        let next_mainline_move = mt.next_mainline_move()?;

        let applied = apply_next_moves(&mt, &goban, &Treepath::from_steps(next_moves.clone()))?;
        let final_mt = applied.movetree;

        let mut stone_map: BTreeMap<Point, Color> = goban
            .placed_stones()
            .into_iter()
            .filter_map(|mv| Some((mv.point?, mv.color)))
            .collect();
        for mv in &applied.moves {
            stone_map.entry(mv.point).or_insert(mv.color);
        }

        // Numeric labels are regenerated below.
        let mut mark_map = MarkMap::from_properties(final_mt.properties())?;
        mark_map.strip_numeric_labels();

        let show_variations = match options.show_next_variations {
            ShowVariations::Never => false,
            ShowVariations::Always => true,
            ShowVariations::MoreThanOne => final_mt.num_children() > 1,
        };
        if show_variations {
            label_variations(&final_mt, options.selected_next_move, &mut mark_map)?;
        }

        let mut collisions = Vec::new();
        let mut letters = COLLISION_LABELS.chars();
        for mv in &applied.moves {
            let move_num = starting_move_num + mv.step;
            let Some(kind) = mv.collision else {
                mark_map.set_label(mv.point, move_num.to_string());
                continue;
            };
            let existing = mark_map.label(mv.point).map(str::to_string);
            let label = match (existing, kind) {
                (Some(existing), _) => Some(existing),
                (None, CollisionKind::Earlier(step)) => {
                    Some((starting_move_num + step).to_string())
                }
                (None, CollisionKind::Goban) => letters.next().map(|c| {
                    mark_map.set_label(mv.point, c.to_string());
                    c.to_string()
                }),
            };
            collisions.push(Collision {
                color: mv.color,
                move_num,
                label,
                collision_stone_color: stone_map.get(&mv.point).copied(),
            });
        }

        if options.mark_last_move {
            if let Some(Move { point: Some(pt), .. }) = final_mt.properties().get_move()? {
                if mark_map.mark(pt).is_none() {
                    mark_map.set_mark(pt, Mark::LastMove);
                }
            }
        }
        // Captured stones may be back on the board after next moves.
        let mut ko = None;
        if next_moves.is_empty() {
            ko = goban.ko();
            if let Some(pt) = ko.filter(|_| options.mark_ko) {
                if mark_map.mark(pt).is_none() {
                    mark_map.set_mark(pt, Mark::KoLocation);
                }
            }
        }

        let problem_result = options
            .problem_conditions
            .as_ref()
            .map(|conditions| position_correctness(&final_mt, conditions));

        if rotation != Rotation::NoRotation {
            stone_map = stone_map
                .into_iter()
                .map(|(pt, color)| -> Result<(Point, Color)> {
                    Ok((pt.rotate(size, rotation)?, color))
                })
                .collect::<Result<_>>()?;
            mark_map = mark_map.rotate(size, rotation)?;
            ko = ko.map(|pt| pt.rotate(size, rotation)).transpose()?;
        }

        let board = Board::from_fn(crop, size, |pt| Intersection {
            base: BaseSymbol::at(pt, size),
            stone: stone_map.get(&pt).copied(),
            mark: mark_map.mark(pt),
            text_label: mark_map.label(pt).map(str::to_string),
        });

        debug!(
            ?region,
            ?rotation,
            starting_move_num,
            ending_move_num,
            collisions = collisions.len(),
            "flattened position"
        );

        Ok(Flattened {
            board,
            collisions,
            comment: final_mt.properties().get_comment().unwrap_or_default().to_string(),
            is_on_main_path: final_mt.on_mainline(),
            starting_move_num,
            ending_move_num,
            mainline_move_num,
            mainline_move,
            next_mainline_move,
            stone_map,
            mark_map,
            problem_result,
            ko,
            rotation,
            region,
        })
    }

    /// The displayed region and its crop box, both in rotated coordinates.
    fn resolve_region(
        &self,
        mt: &MoveTree,
        next_moves: &[usize],
        rotation: Rotation,
        options: &FlattenOptions,
    ) -> Result<(BoardRegion, BoundingBox)> {
        let size = mt.intersections();
        let minimal = || -> Result<BoundingBox> {
            let bbox = minimal_bounding_box(mt, Some(next_moves))?;
            rotate_bounding_box(&bbox, size, rotation)
        };

        let mut region = match options.board_region {
            BoardRegion::Auto if size < CROP_REGION_MIN_SIZE => BoardRegion::All,
            BoardRegion::Auto if size == CROP_REGION_MIN_SIZE => {
                self.crop_regions().classify(&minimal()?)?
            }
            BoardRegion::Auto => CropRegions::new(size).classify(&minimal()?)?,
            other => other.rotate(rotation),
        };
        if !options.region_restrictions.is_empty()
            && !options.region_restrictions.contains(&region)
        {
            debug!(?region, "region not allowed, showing the whole board");
            region = BoardRegion::All;
        }

        let crop = match region {
            BoardRegion::Minimal => minimal()?.grow(MINIMAL_CROP_MARGIN, size),
            other => crop_box(other, size)?,
        };
        Ok((region, crop))
    }
}

/// Number of the first move in `next_moves` played from `mt`.
///
/// On the mainline this is the next move number, unless the path leaves the
/// mainline straight away, which starts a fresh count. Inside a variation the
/// count restarts at the branch point.
fn find_starting_move_num(mt: &MoveTree, next_moves: &[usize]) -> usize {
    if mt.on_mainline() {
        return match next_moves.first() {
            Some(&first) if first > 0 => 1,
            _ => mt.node_num() + 1,
        };
    }
    let mut up = mt.new_tree_ref();
    let mut steps = 0;
    while !up.on_mainline() && up.move_up() {
        steps += 1;
    }
    steps + 1
}

/// Number each child move of `mt` on the board.
fn label_variations(mt: &MoveTree, selected: Option<Move>, mark_map: &mut MarkMap) -> Result<()> {
    for i in 0..mt.num_children() {
        let Some(props) = mt.child_properties(i) else {
            continue;
        };
        let Some(mv @ Move { point: Some(pt), .. }) = props.get_move()? else {
            continue;
        };
        let mut label = mark_map
            .label(pt)
            .map_or_else(|| (i + 1).to_string(), str::to_string);
        if selected == Some(mv) {
            label.push('.');
        }
        mark_map.set_labeled_mark(pt, Mark::NextVariation, label);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problems::{ProblemResult, default_conditions};
    use crate::properties::Prop;

    fn flatten(mt: &MoveTree, options: &FlattenOptions) -> Flattened {
        Flattener::new().flatten(mt, options).unwrap()
    }

    /// 9x9 game: B[cc] W[gg] B[cg], with a variation W[gc] after B[cc].
    fn game() -> MoveTree {
        let mut mt = MoveTree::new(9);
        mt.add_node().properties_mut().add(Prop::B, "cc");
        mt.add_node().properties_mut().add(Prop::W, "gg");
        mt.add_node().properties_mut().add(Prop::B, "cg");
        mt.to_root();
        mt.move_down(0);
        mt.add_node().properties_mut().add(Prop::W, "gc");
        mt.to_root();
        mt
    }

    #[test]
    fn test_empty_board() {
        let flattener = Flattener::new();
        let flat = flattener.empty(9).unwrap();
        assert_eq!(flat.board().width(), 9);
        assert!(flat.stone_map().is_empty());
        assert_eq!(flat.starting_move_num(), 1);
        assert_eq!(flat.ending_move_num(), 1);
        assert_eq!(flat.board().get(Point::new(4, 4)).unwrap().base, BaseSymbol::CenterStarpoint);
        // Cached.
        assert!(Arc::ptr_eq(&flat, &flattener.empty(9).unwrap()));
    }

    #[test]
    fn test_position_and_move_numbers() {
        let mt = game();
        let options = FlattenOptions {
            initial_position: Some(Treepath::from_steps(vec![0, 0])),
            mark_last_move: true,
            ..Default::default()
        };
        let flat = flatten(&mt, &options);
        assert_eq!(flat.stone_map().len(), 2);
        assert_eq!(flat.starting_move_num(), 3);
        assert_eq!(flat.mainline_move_num(), 2);
        assert_eq!(flat.mainline_move(), Some(Move::new(Color::White, Point::new(6, 6))));
        assert_eq!(flat.next_mainline_move(), Some(Move::new(Color::Black, Point::new(2, 6))));
        assert!(flat.is_on_main_path());
        assert_eq!(flat.mark_map().mark(Point::new(6, 6)), Some(Mark::LastMove));
    }

    #[test]
    fn test_next_moves_are_numbered() {
        let mt = game();
        let options = FlattenOptions {
            next_moves_path: Treepath::to_end_path(),
            ..Default::default()
        };
        let flat = flatten(&mt, &options);
        assert_eq!(flat.starting_move_num(), 1);
        assert_eq!(flat.ending_move_num(), 3);
        let cell = flat.board().get(Point::new(2, 6)).unwrap();
        assert_eq!(cell.stone, Some(Color::Black));
        assert_eq!(cell.mark, Some(Mark::TextLabel));
        assert_eq!(cell.text_label.as_deref(), Some("3"));
        assert!(flat.collisions().is_empty());
    }

    #[test]
    fn test_variation_starts_new_count() {
        let mt = game();
        let options = FlattenOptions {
            initial_position: Some(Treepath::from_steps(vec![0])),
            next_moves_path: Treepath::from_steps(vec![1]),
            ..Default::default()
        };
        let flat = flatten(&mt, &options);
        assert_eq!(flat.starting_move_num(), 1);
        assert!(!flat.is_on_main_path());
        assert_eq!(flat.mark_map().label(Point::new(6, 2)), Some("1"));

        let inside = FlattenOptions {
            initial_position: Some(Treepath::from_steps(vec![0, 1])),
            ..Default::default()
        };
        assert_eq!(flatten(&mt, &inside).starting_move_num(), 2);
    }

    #[test]
    fn test_variation_labels() {
        let mt = game();
        let mut options = FlattenOptions {
            initial_position: Some(Treepath::from_steps(vec![0])),
            show_next_variations: ShowVariations::MoreThanOne,
            selected_next_move: Some(Move::new(Color::White, Point::new(6, 2))),
            ..Default::default()
        };
        let flat = flatten(&mt, &options);
        assert_eq!(flat.mark_map().mark(Point::new(6, 6)), Some(Mark::NextVariation));
        assert_eq!(flat.mark_map().label(Point::new(6, 6)), Some("1"));
        assert_eq!(flat.mark_map().label(Point::new(6, 2)), Some("2."));

        options.initial_position = Some(Treepath::from_steps(vec![0, 0]));
        let flat = flatten(&mt, &options);
        assert!(flat.mark_map().marks().is_empty());
        options.show_next_variations = ShowVariations::Always;
        let flat = flatten(&mt, &options);
        assert_eq!(flat.mark_map().label(Point::new(2, 6)), Some("1"));
    }

    #[test]
    fn test_goban_collision_gets_letter() {
        let mut mt = MoveTree::new(9);
        mt.properties_mut().add(Prop::AB, "cc").add(Prop::AW, "dd");
        mt.add_node().properties_mut().add(Prop::W, "ee");
        mt.add_node().properties_mut().add(Prop::B, "dd");
        mt.add_node().properties_mut().add(Prop::W, "cc");
        mt.to_root();
        let options = FlattenOptions {
            next_moves_path: Treepath::to_end_path(),
            ..Default::default()
        };
        let flat = flatten(&mt, &options);
        assert_eq!(
            flat.collisions(),
            [
                Collision {
                    color: Color::Black,
                    move_num: 2,
                    label: Some("a".to_string()),
                    collision_stone_color: Some(Color::White),
                },
                Collision {
                    color: Color::White,
                    move_num: 3,
                    label: Some("b".to_string()),
                    collision_stone_color: Some(Color::Black),
                },
            ]
        );
        assert_eq!(flat.mark_map().label(Point::new(3, 3)), Some("a"));
        assert_eq!(flat.board().get(Point::new(3, 3)).unwrap().stone, Some(Color::White));
    }

    #[test]
    fn test_ko_marked_only_without_next_moves() {
        // Black captures at (1,0), leaving a ko at (0,0).
        let mut mt = MoveTree::new(9);
        mt.properties_mut()
            .add(Prop::AB, "ab")
            .add(Prop::AW, "aa")
            .add(Prop::AW, "ca")
            .add(Prop::AW, "bb");
        mt.add_node().properties_mut().add(Prop::B, "ba");
        mt.add_node().properties_mut().add(Prop::W, "ee");
        mt.to_root();

        let at_capture = FlattenOptions {
            initial_position: Some(Treepath::from_steps(vec![0])),
            mark_ko: true,
            ..Default::default()
        };
        let flat = flatten(&mt, &at_capture);
        assert_eq!(flat.ko(), Some(Point::new(0, 0)));
        assert_eq!(flat.mark_map().mark(Point::new(0, 0)), Some(Mark::KoLocation));

        let with_next = FlattenOptions {
            next_moves_path: Treepath::from_steps(vec![0]),
            ..at_capture
        };
        let flat = flatten(&mt, &with_next);
        assert_eq!(flat.ko(), None);
        assert_eq!(flat.mark_map().mark(Point::new(0, 0)), None);
    }

    #[test]
    fn test_auto_region_crops_corner() {
        let mut mt = MoveTree::new(19);
        mt.properties_mut().add(Prop::AB, "pc").add(Prop::AW, "qd");
        let options = FlattenOptions {
            board_region: BoardRegion::Auto,
            ..Default::default()
        };
        let flat = flatten(&mt, &options);
        assert_eq!(flat.region(), BoardRegion::TopRight);
        assert_eq!(flat.board().width(), 12);
        assert_eq!(flat.board().height(), 11);
        assert_eq!(flat.board().get_int(8, 2).unwrap().stone, Some(Color::Black));

        let restricted = FlattenOptions {
            region_restrictions: vec![BoardRegion::TopLeft],
            ..options
        };
        assert_eq!(flatten(&mt, &restricted).region(), BoardRegion::All);
    }

    #[test]
    fn test_minimal_region() {
        let mut mt = MoveTree::new(9);
        mt.properties_mut().add(Prop::AB, "cc").add(Prop::AW, "ed");
        let options = FlattenOptions {
            board_region: BoardRegion::Minimal,
            ..Default::default()
        };
        let flat = flatten(&mt, &options);
        assert_eq!(
            flat.board().bounding_box(),
            BoundingBox::new(Point::new(1, 1), Point::new(5, 4)).unwrap()
        );
    }

    #[test]
    fn test_auto_rotation() {
        let mut mt = MoveTree::new(19);
        mt.properties_mut().add(Prop::AB, "cc").add(Prop::TR, "dc");
        let options = FlattenOptions {
            board_region: BoardRegion::Auto,
            auto_rotate_crop_prefs: Some(RegionOrdering::default()),
            ..Default::default()
        };
        let flat = flatten(&mt, &options);
        assert_eq!(flat.rotation(), Rotation::Clockwise90);
        assert_eq!(flat.region(), BoardRegion::TopRight);
        assert_eq!(flat.stone_map().get(&Point::new(16, 2)), Some(&Color::Black));
        assert_eq!(flat.mark_map().mark(Point::new(16, 3)), Some(Mark::Triangle));
    }

    #[test]
    fn test_problem_result() {
        let mut mt = MoveTree::new(9);
        mt.add_node()
            .properties_mut()
            .add(Prop::B, "cc")
            .add(Prop::C, "Correct");
        mt.to_root();
        mt.add_node().properties_mut().add(Prop::B, "dd");
        mt.to_root();
        let mut options = FlattenOptions {
            problem_conditions: Some(default_conditions()),
            ..Default::default()
        };
        let mut flat = flatten(&mt, &options);
        assert_eq!(flat.problem_result(), Some(ProblemResult::Indeterminate));
        flat.set_problem_result(ProblemResult::Correct);
        assert_eq!(flat.problem_result(), Some(ProblemResult::Correct));

        options.next_moves_path = Treepath::from_steps(vec![0]);
        let flat = flatten(&mt, &options);
        assert_eq!(flat.problem_result(), Some(ProblemResult::Correct));
        assert_eq!(flat.comment(), "Correct");
    }

    #[test]
    fn test_deterministic() {
        let mt = game();
        let options = FlattenOptions {
            next_moves_path: Treepath::to_end_path(),
            board_region: BoardRegion::Auto,
            ..Default::default()
        };
        assert_eq!(flatten(&mt, &options), flatten(&mt, &options));
    }
}
