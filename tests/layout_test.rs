//! Integration tests for block sizing and placement.

use std::collections::BTreeMap;

use rand::Rng;
use rstest::rstest;

use towers::domain::palette::EMPTY_COLOR;
use towers::domain::{Geometry, LayoutEngine, NodePath, Palette, PlacedNode, Tower};
use towers::util::testing::{scene, seeded_rng};

const EPS: f64 = 1e-9;

fn engine() -> LayoutEngine {
    LayoutEngine::new(Geometry::default())
}

fn by_path(placed: Vec<PlacedNode>) -> BTreeMap<NodePath, PlacedNode> {
    placed.into_iter().map(|p| (p.path.clone(), p)).collect()
}

fn at<'a>(placed: &'a BTreeMap<NodePath, PlacedNode>, path: &[usize]) -> &'a PlacedNode {
    &placed[path]
}

/// Random well-formed expression with at most `depth` levels.
fn random_expression<R: Rng>(rng: &mut R, depth: usize) -> String {
    let mut out = String::from("(");
    if depth > 0 {
        for _ in 0..rng.gen_range(0..4) {
            out.push_str(&random_expression(rng, depth - 1));
        }
    }
    out.push(')');
    out
}

#[test]
fn given_scene_when_placing_on_stage_then_root_is_centered_on_ground() {
    let tower = scene("(()())");

    let placed = by_path(engine().place_on_stage(&tower));

    let root = at(&placed, &[]);
    assert!((root.left + 3.5).abs() < EPS);
    assert!((root.bottom + 2.0).abs() < EPS);
    assert!((root.center_x()).abs() < EPS);
}

#[test]
fn given_nested_group_when_placing_then_children_rest_on_parent_top_and_are_centered() {
    let tower = scene("(()())");

    let placed = by_path(engine().place_on_stage(&tower));

    let group = at(&placed, &[0]);
    assert!((group.left + 3.44).abs() < EPS);
    assert!((group.bottom + 1.0).abs() < EPS);

    let first = at(&placed, &[0, 0]);
    let second = at(&placed, &[0, 1]);
    assert!((first.left + 3.38).abs() < EPS);
    assert!((first.bottom - group.top()).abs() < EPS);
    assert!((second.left - (first.right() + 0.06)).abs() < EPS);
    assert!((first.left - group.left - (group.right() - second.right())).abs() < EPS);
}

#[test]
fn given_levels_when_placing_then_corner_radius_shrinks_per_level() {
    let tower = scene("((()))");
    let geometry = Geometry::default();

    for node in engine().place_on_stage(&tower) {
        assert!((node.corner_radius - geometry.corner_radius_at(node.level)).abs() < EPS);
        assert_eq!(node.level, node.path.len());
    }
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(3)]
#[case(4)]
fn given_random_expressions_when_laying_out_then_children_fit_inside_parent(#[case] seed: u64) {
    let mut rng = seeded_rng(seed);
    let layout = engine();

    for _ in 0..20 {
        let text = random_expression(&mut rng, 4);
        let tower = scene(&text);
        let placed = by_path(layout.place_on_stage(&tower));

        for (path, node) in tower.iter() {
            assert!(layout.contains_children(node), "{text} at {path:?}");
            assert!(node.width > 0.0, "{text} at {path:?}");
            let parent = at(&placed, &path);
            for index in 0..node.fanout() {
                let mut child_path = path.clone();
                child_path.push(index);
                let child = at(&placed, &child_path);
                assert!(child.left >= parent.left - EPS, "{text} at {child_path:?}");
                assert!(child.right() <= parent.right() + EPS, "{text} at {child_path:?}");
                assert!((child.bottom - parent.top()).abs() < EPS);
            }
        }
    }
}

#[test]
fn given_leaves_and_inner_nodes_when_laying_out_then_colors_follow_palette() {
    let mut tower = Tower::new(1.0, 1.0).with_children(vec![
        Tower::new(1.0, 1.0),
        Tower::new(1.0, 1.0).with_children(vec![Tower::new(1.0, 1.0)]),
    ]);

    engine().layout(&mut tower, 5.0, 0, Palette::Dawn);

    assert_eq!(tower.color, Palette::Dawn.color_for_level(0));
    assert_eq!(tower.children[0].color, EMPTY_COLOR);
    assert_eq!(tower.children[1].color, Palette::Dawn.color_for_level(1));
    assert_eq!(tower.children[1].children[0].color, EMPTY_COLOR);
    assert!((tower.width - 5.0).abs() < EPS);
}

#[test]
fn given_narrow_parent_when_laying_out_many_children_then_spacing_shrinks() {
    let geometry = Geometry::default();
    let mut tower = Tower::new(0.3, 1.0).with_children(vec![Tower::new(1.0, 1.0); 5]);

    engine().layout(&mut tower, 0.3, 0, Palette::Ocean);

    assert!(geometry.spacing_for(0.3, 5) < geometry.spacing);
    assert!(tower.children.iter().all(|c| c.width > 0.0));
    assert!(engine().contains_children(&tower));
}

#[test]
fn given_middle_child_removed_when_recentering_then_shift_centers_remaining() {
    let tower = scene("()()()");
    let layout = engine();

    let shift_last_kept = layout.recenter_shift(&tower, &[true, true, false]);
    let shift_symmetric = layout.recenter_shift(&tower, &[true, false, true]);
    let shift_none = layout.recenter_shift(&tower, &[false, false, false]);

    assert!(shift_last_kept > 0.0);
    assert!(shift_symmetric.abs() < EPS);
    assert_eq!(shift_none, 0.0);
}

#[test]
fn given_grandchildren_when_computing_lifted_shift_then_symmetric_scene_needs_none() {
    let tower = scene("(())(())");

    assert!(engine().lifted_shift(&tower).abs() < EPS);
}
