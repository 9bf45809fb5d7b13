//! Integration tests for goflat
//!
//! End-to-end checks through the public API: replaying positions on a goban,
//! treepath strings, cropping, and flattening game records into diagrams.

use goflat::bbox::BoundingBox;
use goflat::flattened::{Collision, Mark};
use goflat::flattener::{FlattenOptions, Flattener, ShowVariations};
use goflat::goban::{Color, Goban, Move};
use goflat::movetree::MoveTree;
use goflat::orientation::{BoardRegion, CropRegions, minimal_bounding_box, quad_crop_from_movetree};
use goflat::point::{Point, Rotation};
use goflat::problems::{ProblemResult, default_conditions};
use goflat::treepath::{NextMovesOptions, Treepath, find_next_moves_path};

// =============================================================================
// Helper functions for setting up test positions
// =============================================================================

fn pt(sgf: &str) -> Point {
    Point::from_sgf_coord(sgf).unwrap()
}

/// Place stones directly, black first, on an empty `size` goban.
/// Coordinates are SGF letters, e.g. `setpos(9, &["cc"], &["dc", "cd"])`.
fn setpos(size: usize, black: &[&str], white: &[&str]) -> Goban {
    let mut goban = Goban::new(size);
    for (stones, color) in [(black, Color::Black), (white, Color::White)] {
        for s in stones {
            let result = goban.add_stone(pt(s), color);
            assert!(result.successful, "setup stone {s} refused");
        }
    }
    goban
}

fn tree(sgf: &str) -> MoveTree {
    MoveTree::from_sgf(sgf).unwrap()
}

fn flatten(mt: &MoveTree, options: &FlattenOptions) -> goflat::flattened::Flattened {
    Flattener::new().flatten(mt, options).unwrap()
}

fn to_end() -> FlattenOptions {
    FlattenOptions {
        next_moves_path: Treepath::to_end_path(),
        ..Default::default()
    }
}

// =============================================================================
// Goban rules
// =============================================================================

#[test]
fn test_occupied_point_rejected() {
    let mut goban = Goban::new(19);
    assert!(goban.add_stone(Point::new(3, 3), Color::Black).successful);
    let before = goban.clone();
    let result = goban.add_stone(Point::new(3, 3), Color::White);
    assert!(!result.successful);
    assert_eq!(goban, before);
}

#[test]
fn test_surrounded_stone_captured() {
    let mut goban = setpos(9, &["ee"], &["de", "fe", "ed"]);
    let result = goban.add_stone(pt("ef"), Color::White);
    assert!(result.successful);
    assert_eq!(result.captures, vec![Point::new(4, 4)]);
    assert_eq!(goban.stone_at(Point::new(4, 4)), None);
}

#[test]
fn test_capture_group() {
    // White corner group down to its last liberty at (1,2).
    let mut goban = setpos(9, &["ca", "cb", "ac"], &["aa", "ba", "ab", "bb"]);
    let result = goban.add_stone(pt("bc"), Color::Black);
    assert!(result.successful);
    assert_eq!(result.captures.len(), 4);
    for s in ["aa", "ba", "ab", "bb"] {
        assert_eq!(goban.stone_at(pt(s)), None);
    }
    let group = goban.find_connected(pt("bc"), Color::Black);
    assert!(group.liberties > 0);
}

#[test]
fn test_ko_round_trip() {
    let mut goban = setpos(9, &["dc", "cd", "de"], &["ec", "fd", "ee", "dd"]);
    let result = goban.add_stone(pt("ed"), Color::Black);
    assert!(result.successful);
    assert_eq!(result.ko, Some(pt("dd")));
    assert!(!goban.placeable(pt("dd")));
    assert!(!goban.add_stone(pt("dd"), Color::White).successful);

    // Ko threat elsewhere, answered.
    assert!(goban.add_stone(pt("hh"), Color::White).successful);
    assert!(goban.placeable(pt("dd")));
    assert!(goban.add_stone(pt("hg"), Color::Black).successful);
    assert!(goban.add_stone(pt("dd"), Color::White).successful);
    assert_eq!(goban.stone_at(pt("ed")), None);
}

#[test]
fn test_goban_from_sgf_replay() {
    let mt = tree("(;SZ[9]AB[ee];W[de];B[aa];W[fe];B[bb];W[ed];B[cc];W[ef])");
    let end = mt.get_tree_from_root(&Treepath::to_end_path());
    let (goban, captures) = Goban::from_movetree(&end).unwrap();
    assert_eq!(goban.stone_at(Point::new(4, 4)), None);
    assert_eq!(captures.last().unwrap().black, vec![Point::new(4, 4)]);
}

// =============================================================================
// Rotation and treepath strings
// =============================================================================

#[test]
fn test_rotation_is_invertible_everywhere() {
    for size in [9, 13, 19] {
        for y in 0..size {
            for x in 0..size {
                let p = Point::new(x, y);
                for rotation in Rotation::ALL {
                    let rotated = p.rotate(size, rotation).unwrap();
                    assert_eq!(rotated.antirotate(size, rotation).unwrap(), p);
                }
            }
        }
    }
}

#[test]
fn test_fragment_parsing() {
    assert_eq!(Treepath::parse_fragment("1:3").unwrap().steps(), [1, 1, 1]);
    assert_eq!(Treepath::parse_fragment("0.0:2.3").unwrap().steps(), [0, 0, 0, 3]);
}

#[test]
fn test_initial_path_parsing() {
    assert_eq!(Treepath::parse_initial_path("3.1").unwrap().steps(), [0, 0, 0, 1]);
    assert_eq!(Treepath::parse_initial_path("2.3").unwrap().steps(), [0, 0, 3]);
}

#[test]
fn test_to_end_follows_mainline() {
    let mt = tree("(;SZ[9];B[aa](;W[bb];B[cc])(;W[dd]))");
    let path = Treepath::parse_initial_path("1+").unwrap();
    let end = mt.get_tree_from_root(&path);
    assert_eq!(end.node_num(), 3);
    assert_eq!(path.resolve(&mt), vec![0, 0, 0]);
}

// =============================================================================
// Cropping
// =============================================================================

#[test]
fn test_center_stone_not_cropped() {
    let mt = tree("(;SZ[19]AB[jj])");
    assert_eq!(
        minimal_bounding_box(&mt, None).unwrap(),
        BoundingBox::new(Point::new(9, 9), Point::new(9, 9)).unwrap()
    );
    let regions = CropRegions::new(19);
    assert_eq!(quad_crop_from_movetree(&regions, &mt, None).unwrap(), BoardRegion::All);
}

#[test]
fn test_corner_problem_cropped() {
    let mt = tree("(;SZ[19]AB[cp][dq][dr]AW[bq][cq][cr];B[br])");
    let regions = CropRegions::new(19);
    assert_eq!(quad_crop_from_movetree(&regions, &mt, None).unwrap(), BoardRegion::BottomLeft);
}

#[test]
fn test_next_moves_crop_to_their_corner() {
    // Earlier play in the bottom left does not widen the crop.
    let mt = tree("(;SZ[19];B[cq];W[dp];B[qc];W[rd])");
    let options = FlattenOptions {
        initial_position: Some(Treepath::from_steps(vec![0, 0])),
        next_moves_path: Treepath::from_steps(vec![0, 0]),
        board_region: BoardRegion::Auto,
        ..Default::default()
    };
    let flat = flatten(&mt, &options);
    assert_eq!(flat.region(), BoardRegion::TopRight);
    assert_eq!(flat.mark_map().label(pt("qc")), Some("3"));
    assert_eq!(flat.mark_map().label(pt("rd")), Some("4"));
}

// =============================================================================
// Flattening
// =============================================================================

#[test]
fn test_collision_with_goban_stone() {
    let mt = tree("(;SZ[9]AW[dd];B[cc];W[dd])");
    let mut options = to_end();
    options.next_moves_path = Treepath::parse_fragment("0:2").unwrap();
    let flat = flatten(&mt, &options);
    assert_eq!(flat.collisions().len(), 1);
    let collision = &flat.collisions()[0];
    assert_eq!(collision.move_num, 2);
    assert_eq!(collision.color, Color::White);
    assert_eq!(collision.collision_stone_color, Some(Color::White));
}

#[test]
fn test_collision_labels_are_stable() {
    // Move 3 replays move 1's point; move 5 lands on a setup stone.
    let mt = tree("(;SZ[9]AW[ee];B[cc];W[dc];B[cc];W[ff];B[ee];W[gg])");
    let flat = flatten(&mt, &to_end());
    assert_eq!(
        flat.collisions(),
        [
            Collision {
                color: Color::Black,
                move_num: 3,
                label: Some("1".to_string()),
                collision_stone_color: Some(Color::Black),
            },
            Collision {
                color: Color::Black,
                move_num: 5,
                label: Some("a".to_string()),
                collision_stone_color: Some(Color::White),
            },
        ]
    );
    let cell = flat.board().get(pt("ee")).unwrap();
    assert_eq!(cell.stone, Some(Color::White));
    assert_eq!(cell.text_label.as_deref(), Some("a"));
    assert_eq!(flat.mark_map().label(pt("gg")), Some("6"));
    assert_eq!(flat.ending_move_num(), 6);

    let again = flatten(&mt, &to_end());
    assert_eq!(again, flat);
}

#[test]
fn test_sgf_numeric_labels_are_replaced() {
    let mt = tree("(;SZ[9]LB[cc:7][dd:A];B[cc])");
    let flat = flatten(&mt, &to_end());
    assert_eq!(flat.mark_map().label(pt("cc")), Some("1"));
    assert_eq!(flat.mark_map().label(pt("dd")), None);

    let at_root = flatten(&mt, &FlattenOptions::default());
    assert_eq!(at_root.mark_map().label(pt("cc")), None);
    assert_eq!(at_root.mark_map().label(pt("dd")), Some("A"));
}

#[test]
fn test_problem_walkthrough() {
    let mt = tree(
        "(;SZ[19]AB[qc][rc][qd]AW[pc][pd][qe]C[Black to play]\
         (;B[rd];W[re]C[Right idea];B[sc]C[Correct])\
         (;B[re];W[rd]C[Wrong]))",
    );
    let target = Treepath::parse_initial_path("3").unwrap();
    let found = find_next_moves_path(&mt, Some(&target), &NextMovesOptions::default());
    assert_eq!(found.treepath.steps(), [0, 0]);
    assert_eq!(found.next_moves.steps(), [0]);

    let options = FlattenOptions {
        initial_position: Some(found.treepath),
        next_moves_path: found.next_moves,
        board_region: BoardRegion::Auto,
        problem_conditions: Some(default_conditions()),
        mark_last_move: true,
        ..Default::default()
    };
    let flat = flatten(&mt, &options);
    assert_eq!(flat.region(), BoardRegion::TopRight);
    assert_eq!(flat.starting_move_num(), 3);
    assert_eq!(flat.comment(), "Correct");
    assert_eq!(flat.problem_result(), Some(ProblemResult::Correct));
    assert_eq!(flat.mark_map().label(pt("sc")), Some("3"));

    let at_root = FlattenOptions {
        show_next_variations: ShowVariations::Always,
        problem_conditions: Some(default_conditions()),
        ..Default::default()
    };
    let flat = flatten(&mt, &at_root);
    assert_eq!(flat.problem_result(), Some(ProblemResult::Indeterminate));
    assert_eq!(flat.mark_map().mark(pt("rd")), Some(Mark::NextVariation));
    assert_eq!(flat.mark_map().label(pt("re")), Some("2"));
    assert_eq!(flat.next_mainline_move(), Some(Move::new(Color::Black, pt("rd"))));
}

#[test]
fn test_rebased_tree_flattens_the_same_stones() {
    let mt = tree("(;SZ[9];B[cc];W[gg];B[cg];W[gc])");
    let end = mt.get_tree_from_root(&Treepath::to_end_path());
    let rebased = end.rebase().unwrap();
    let a = flatten(&end, &FlattenOptions::default());
    let b = flatten(&rebased, &FlattenOptions::default());
    assert_eq!(a.stone_map(), b.stone_map());
    assert_eq!(rebased.current_player().unwrap(), Color::Black);
}
