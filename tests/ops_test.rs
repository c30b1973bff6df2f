//! Integration tests for structural tree operations and their plans.

use rstest::rstest;

use towers::domain::palette::{BASE_COLOR, EMPTY_COLOR};
use towers::domain::{Addressing, MergeOrder, OpKind, Step, Tower, TreeOps};
use towers::util::testing::{scene, seeded_rng, TEST_SEED};

const EPS: f64 = 1e-9;

fn ops() -> TreeOps {
    TreeOps::default()
}

/// The first top-level group of `expression`.
fn group(expression: &str) -> Tower {
    scene(expression).children.remove(0)
}

fn merge_children(plan_steps: &[&Step]) -> Vec<Vec<usize>> {
    plan_steps
        .iter()
        .filter_map(|step| match step {
            Step::Merge { child, .. } => Some(child.clone()),
            _ => None,
        })
        .collect()
}

// ============================================================
// raise_tower
// ============================================================

#[test]
fn given_nested_tower_when_raising_then_subtrees_are_built_before_parents() {
    let tower = group("(()(()))");

    let plan = ops().raise_tower(&tower);

    assert_eq!(plan.op, OpKind::Raise);
    assert_eq!(plan.addressing, Addressing::Result);
    let nodes: Vec<Vec<usize>> = plan.segments.iter().map(|s| s.node.clone()).collect();
    assert_eq!(nodes, vec![vec![0], vec![1, 0], vec![1], vec![]]);
}

#[test]
fn given_node_with_children_when_raising_then_merges_rightmost_child_first() {
    let tower = group("(()()())");

    let plan = ops().raise_tower(&tower);
    let steps: Vec<&Step> = plan.steps().collect();

    assert_eq!(merge_children(&steps), vec![vec![2], vec![1], vec![0]]);
    assert!(matches!(steps.last(), Some(Step::CenterBase { base }) if base.is_empty()));
}

#[test]
fn given_merge_step_when_raising_then_carries_depth_and_fanout_of_child() {
    let tower = group("((()()))");

    let plan = ops().raise_tower(&tower);

    let merge = plan
        .steps()
        .find(|step| matches!(step, Step::Merge { base, .. } if base.is_empty()))
        .expect("root merge");
    assert!(matches!(merge, Step::Merge { depth: 1, fanout: 2, .. }));
}

#[test]
fn given_tower_when_raising_then_structure_is_unchanged() {
    let tower = group("(()(()))");
    let before = tower.clone();

    let _ = ops().raise_tower(&tower);

    assert_eq!(tower, before);
}

// ============================================================
// merge_under_base and raise_towers
// ============================================================

#[rstest]
#[case(MergeOrder::Reverse, vec![vec![1], vec![0]])]
#[case(MergeOrder::Forward, vec![vec![0], vec![1]])]
fn given_order_when_merging_under_base_then_children_merge_in_that_order(
    #[case] order: MergeOrder,
    #[case] expected: Vec<Vec<usize>>,
) {
    let children = vec![group("(())"), group("()")];

    let (tower, plan) = ops().merge_under_base(children, Tower::new(2.0, 0.5), order);
    let steps: Vec<&Step> = plan.steps().collect();

    assert_eq!(tower.expression(), "((())())");
    assert_eq!(merge_children(&steps), expected);
}

#[test]
fn given_no_children_when_merging_under_base_then_empty_plan() {
    let (tower, plan) = ops().merge_under_base(Vec::new(), Tower::new(2.0, 0.5), MergeOrder::Reverse);

    assert!(plan.is_empty());
    assert!(tower.is_leaf());
}

#[test]
fn given_towers_when_raising_onto_container_then_container_spans_them() {
    let towers = vec![group("(())"), group("((()))")];
    let spacing = 0.06;
    let expected_width = towers[0].width + towers[1].width + 3.0 * spacing;

    let (container, plan) = ops().raise_towers(towers, None);

    assert_eq!(plan.op, OpKind::RaiseTowers);
    assert!((container.width - expected_width).abs() < EPS);
    assert!((container.height - 0.9f64.powi(2)).abs() < EPS);
    assert_eq!(container.fanout(), 2);
}

#[test]
fn given_towers_of_different_depth_when_raising_onto_container_then_all_sound_container_level() {
    let towers = vec![group("(())"), group("((()))")];

    let (_, plan) = ops().raise_towers(towers, None);

    let merges: Vec<(usize, usize)> = plan
        .steps()
        .filter_map(|step| match step {
            Step::Merge {
                depth, sound_level, ..
            } => Some((*depth, *sound_level)),
            _ => None,
        })
        .collect();
    // Rightmost tower first; each keeps its own depth for the level display
    assert_eq!(merges, vec![(2, 2), (1, 2)]);
}

#[test]
fn given_raise_when_planning_merges_then_child_depth_is_sounded() {
    let plan = ops().raise_tower(&group("((())())"));

    assert!(plan.steps().all(|step| match step {
        Step::Merge {
            depth, sound_level, ..
        } => depth == sound_level,
        _ => true,
    }));
}

#[rstest]
#[case(MergeOrder::Reverse)]
#[case(MergeOrder::Forward)]
fn given_order_when_merging_under_base_then_every_step_carries_it(#[case] order: MergeOrder) {
    let children = vec![group("(())"), group("()")];

    let (_, plan) = ops().merge_under_base(children, Tower::new(2.0, 0.5), order);

    let orders: Vec<MergeOrder> = plan
        .steps()
        .filter_map(|step| match step {
            Step::BaseEnter { order, .. } | Step::Merge { order, .. } => Some(*order),
            _ => None,
        })
        .collect();
    assert_eq!(orders, vec![order; 3]);
}

#[test]
fn given_explicit_height_when_raising_towers_then_container_uses_it() {
    let (container, _) = ops().raise_towers(vec![group("()")], Some(0.25));

    assert!((container.height - 0.25).abs() < EPS);
}

// ============================================================
// union
// ============================================================

#[test]
fn given_children_with_grandchildren_when_union_then_grandchildren_are_lifted_in_order() {
    let mut tower = group("((())(()()))");

    let plan = ops().union(&mut tower);

    assert_eq!(tower.expression(), "(()()())");
    assert_eq!(plan.addressing, Addressing::Source);
    let dissolved = plan
        .steps()
        .filter(|s| matches!(s, Step::Dissolve { .. }))
        .count();
    let dropped = plan.steps().filter(|s| matches!(s, Step::Drop { .. })).count();
    assert_eq!(dissolved, 2);
    assert_eq!(dropped, 3);
}

#[test]
fn given_union_when_planning_then_highlights_precede_dissolving() {
    let mut tower = group("((())())");

    let plan = ops().union(&mut tower);
    let steps: Vec<&Step> = plan.steps().collect();

    assert!(matches!(steps[0], Step::Highlight { path } if path == &vec![0]));
    assert!(matches!(steps[1], Step::Highlight { path } if path == &vec![1]));
    assert!(matches!(steps[2], Step::Pause));
    assert!(matches!(steps[3], Step::Dissolve { .. }));
}

#[test]
fn given_only_leaf_children_when_union_then_node_becomes_empty() {
    let mut tower = group("(()())");

    let plan = ops().union(&mut tower);

    assert!(tower.is_leaf());
    assert_eq!(tower.color, EMPTY_COLOR);
    assert!(!plan.steps().any(|s| matches!(s, Step::Recenter { .. })));
}

#[test]
fn given_leaf_when_union_then_noop() {
    let mut tower = group("()");

    let plan = ops().union(&mut tower);

    assert!(plan.is_empty());
    assert!(tower.is_leaf());
}

// ============================================================
// remove duplicates
// ============================================================

#[test]
fn given_duplicate_children_when_removing_duplicates_then_first_occurrence_survives() {
    let mut tower = group("((())()(())())");

    let plan = ops().remove_duplicate_subtowers(&mut tower);

    assert_eq!(tower.expression(), "((())())");
    let matches: Vec<(Vec<usize>, Vec<usize>)> = plan
        .steps()
        .filter_map(|s| match s {
            Step::Match { keep, remove } => Some((keep.clone(), remove.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(matches, vec![(vec![0], vec![2]), (vec![1], vec![3])]);
}

#[test]
fn given_three_equal_children_when_removing_duplicates_then_each_removed_once() {
    let mut tower = group("(()()())");

    let plan = ops().remove_duplicate_subtowers(&mut tower);

    assert_eq!(tower.expression(), "(())");
    assert_eq!(
        plan.steps()
            .filter(|s| matches!(s, Step::Match { .. }))
            .count(),
        2
    );
}

#[test]
fn given_distinct_children_when_removing_duplicates_then_unchanged() {
    let mut tower = group("(()(()))");
    let before = tower.clone();

    let plan = ops().remove_duplicate_subtowers(&mut tower);

    assert_eq!(tower, before);
    assert!(plan.is_empty());
}

#[test]
fn given_nested_duplicates_when_removing_recursively_then_deepest_first() {
    let mut tower = group("((()())(()()))");

    let plan = ops().remove_duplicate_subtowers_recursively(&mut tower);

    assert_eq!(tower.expression(), "((()))");
    let nodes: Vec<Vec<usize>> = plan.segments.iter().map(|s| s.node.clone()).collect();
    assert_eq!(nodes, vec![vec![0], vec![1], vec![]]);
}

// ============================================================
// swap
// ============================================================

#[test]
fn given_two_indices_when_swapping_then_children_exchange_places() {
    let mut tower = group("((())())");

    let plan = ops().swap_subtowers(&mut tower, 0, 1);

    assert_eq!(tower.expression(), "(()(()))");
    let steps: Vec<&Step> = plan.steps().collect();
    assert!(matches!(steps[0], Step::Swap { .. }));
    assert_eq!(
        steps
            .iter()
            .filter(|s| matches!(s, Step::AlignTop { .. }))
            .count(),
        2
    );
}

#[rstest]
#[case(0, 5)]
#[case(7, 0)]
#[case(1, 1)]
fn given_irregular_indices_when_swapping_then_noop(#[case] i: usize, #[case] j: usize) {
    let mut tower = group("((())())");
    let before = tower.clone();

    let plan = ops().swap_subtowers(&mut tower, i, j);

    assert!(plan.is_empty());
    assert_eq!(tower, before);
}

// ============================================================
// select
// ============================================================

#[test]
fn given_predicate_when_selecting_then_failing_children_are_removed() {
    let mut tower = group("((())()(()()))");

    let plan = ops().select_subtowers(&mut tower, |_, child| !child.is_leaf());

    assert_eq!(tower.expression(), "((())(()()))");
    let inspected = plan.steps().filter(|s| matches!(s, Step::Inspect { .. })).count();
    let removed: Vec<&Step> = plan
        .steps()
        .filter(|s| matches!(s, Step::Remove { .. }))
        .collect();
    assert_eq!(inspected, 3);
    assert!(matches!(removed.as_slice(), [Step::Remove { path }] if path == &vec![1]));
}

#[test]
fn given_predicate_using_parent_when_selecting_then_parent_is_passed() {
    let mut tower = group("(()(())((())))");

    let _ = ops().select_subtowers(&mut tower, |parent, child| child.depth() + 1 < parent.depth());

    assert_eq!(tower.expression(), "(()(()))");
}

#[test]
fn given_all_children_kept_when_selecting_then_no_recenter() {
    let mut tower = group("((())(()))");

    let plan = ops().select_subtowers(&mut tower, |_, _| true);

    assert_eq!(tower.fanout(), 2);
    assert!(!plan.steps().any(|s| matches!(s, Step::Recenter { .. })));
}

// ============================================================
// resize
// ============================================================

#[test]
fn given_same_seed_when_resizing_then_results_are_identical() {
    let mut first = group("((())(()()))");
    let mut second = first.clone();

    let plan_a = ops().resize(&mut first, &mut seeded_rng(TEST_SEED));
    let plan_b = ops().resize(&mut second, &mut seeded_rng(TEST_SEED));

    assert_eq!(plan_a, plan_b);
    for ((_, a), (_, b)) in first.iter().zip(second.iter()) {
        assert_eq!(a.width, b.width);
        assert_eq!(a.height, b.height);
    }
}

#[test]
fn given_tower_when_resizing_then_structure_kept_and_root_width_in_range() {
    let mut tower = group("((())(()()))");
    let before = tower.clone();

    let plan = ops().resize(&mut tower, &mut seeded_rng(7));

    assert_eq!(tower, before);
    let ratio = tower.width / before.width;
    assert!((0.8..1.3).contains(&ratio), "ratio {ratio}");
    assert!(matches!(plan.steps().next(), Some(Step::ScaleWidth { path, .. }) if path.is_empty()));
}

#[test]
fn given_height_change_when_resizing_then_child_is_realigned() {
    let mut tower = group("(()()()()()())");

    let plan = ops().resize(&mut tower, &mut seeded_rng(3));
    let steps: Vec<&Step> = plan.steps().collect();

    for (index, step) in steps.iter().enumerate() {
        if let Step::ScaleHeight { path, .. } = step {
            assert!(
                matches!(steps.get(index + 1), Some(Step::AlignTop { path: next }) if next == path)
            );
        }
    }
}

// ============================================================
// successive
// ============================================================

#[test]
fn given_tower_when_chaining_successively_then_builds_base_with_copy_and_inner_base() {
    let tower = group("(()())");

    let (chained, plan) = ops().successive(&tower, 1.0);

    assert_eq!(plan.op, OpKind::Successive);
    assert_eq!(plan.addressing, Addressing::Result);
    assert_eq!(chained.color, BASE_COLOR);
    assert!((chained.width - tower.width).abs() < EPS);
    assert_eq!(chained.children[0], tower);
    assert!((chained.children[0].width - tower.width * 0.45).abs() < EPS);
    let inner_base = &chained.children[1];
    assert!((inner_base.height - 0.7).abs() < EPS);
    assert_eq!(inner_base.children[0], tower);
}

#[test]
fn given_non_positive_height_when_chaining_then_noop() {
    let tower = group("(())");

    let (chained, plan) = ops().successive(&tower, 0.0);

    assert!(plan.is_empty());
    assert_eq!(chained, tower);
}

// ============================================================
// algebraic properties
// ============================================================

#[test]
fn given_swap_applied_twice_when_comparing_then_order_is_restored() {
    let mut tower = group("((())()(()()))");
    let before = tower.clone();

    let _ = ops().swap_subtowers(&mut tower, 0, 2);
    assert_ne!(tower, before);
    let _ = ops().swap_subtowers(&mut tower, 0, 2);

    assert_eq!(tower, before);
}

#[rstest]
#[case("((())()(())())")]
#[case("(()()())")]
#[case("(((()())(()()))(()))")]
fn given_deduplicated_tower_when_deduplicating_again_then_nothing_changes(#[case] text: &str) {
    let mut tower = group(text);
    let _ = ops().remove_duplicate_subtowers_recursively(&mut tower);
    let once = tower.clone();

    let plan = ops().remove_duplicate_subtowers_recursively(&mut tower);

    assert!(plan.is_empty());
    assert_eq!(tower, once);
}

#[test]
fn given_group_with_two_leaves_when_deduplicating_then_one_leaf_remains() {
    let mut tower = group("(()())");

    let _ = ops().remove_duplicate_subtowers(&mut tower);

    assert_eq!(tower.fanout(), 1);
    assert!(tower.children[0].is_leaf());
}
