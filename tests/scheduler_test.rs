//! Integration tests for turning plans into timelines and playing them.

use std::f64::consts::PI;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rstest::rstest;

use towers::application::{
    dispatch, ApplicationError, EventKind, EventScheduler, Indicator, InstrumentPlayer, Motion,
    NoteSource, NullPanel, Payload, PlaybackMode, ShapeRef, SilentPlayer, SonificationMapper,
    Timeline, Timing, TowerPanel,
};
use towers::domain::instrument::by_name;
use towers::domain::{LayoutEngine, MergeOrder, Tower, TreeOps};
use towers::infrastructure::traits::{AudioDevice, LabelSink, Renderer};
use towers::util::testing::{scene, seeded_rng, TEST_SEED};

fn scheduler(player: Arc<dyn InstrumentPlayer>) -> EventScheduler {
    EventScheduler::new(
        LayoutEngine::default(),
        Timing::default(),
        player,
        Arc::new(TowerPanel::default()),
    )
}

fn guitar_player() -> Arc<dyn InstrumentPlayer> {
    Arc::new(
        SonificationMapper::new(
            vec![by_name("guitar").unwrap()],
            vec![1.0],
            vec![0.0],
            PlaybackMode::Simultaneous,
            NoteSource::Nesting,
            PathBuf::from("samples"),
        )
        .unwrap(),
    )
}

fn raise_timeline(scheduler: &EventScheduler, expression: &str) -> Timeline {
    let tower = scene(expression);
    let plan = TreeOps::default().raise_tower(&tower);
    scheduler.schedule(&tower, &tower, &plan, &mut seeded_rng(TEST_SEED))
}

fn samples(timeline: &Timeline) -> Vec<String> {
    timeline
        .iter()
        .flat_map(|e| e.payloads.iter())
        .filter_map(|p| match p {
            Payload::Sound { sample, .. } => Some(sample.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn given_raise_when_scheduling_then_each_leaf_is_grounded_with_expression_label() {
    let timeline = raise_timeline(&scheduler(Arc::new(SilentPlayer)), "()()");

    let grounded: Vec<_> = timeline
        .iter()
        .filter(|e| {
            e.payloads
                .iter()
                .any(|p| matches!(p, Payload::Shape { motion: Motion::Create, .. }))
        })
        .take(2)
        .collect();
    for event in grounded {
        assert_eq!(event.kind, EventKind::Transition);
        assert!(event.payloads.iter().any(|p| matches!(
            p,
            Payload::Label { indicator: Indicator::Expression, value, .. } if value == "()"
        )));
    }
}

#[test]
fn given_merges_when_scheduling_then_one_sound_event_per_merge_even_when_silent() {
    let timeline = raise_timeline(&scheduler(Arc::new(SilentPlayer)), "(()())");

    // Root merges one child, the group merges two
    assert_eq!(timeline.count(EventKind::Sound), 3);
    assert!(samples(&timeline).is_empty());
}

#[test]
fn given_merge_when_scheduling_then_indicator_labels_ride_on_tilt_transition() {
    let timeline = raise_timeline(&scheduler(guitar_player()), "(())");

    let tilt = timeline
        .iter()
        .find(|e| {
            e.payloads
                .iter()
                .any(|p| matches!(p, Payload::Shape { motion: Motion::Rotate { angle }, .. } if *angle > 0.0))
        })
        .expect("tilt event");
    assert_eq!(tilt.kind, EventKind::Transition);
    assert!(tilt.payloads.iter().any(|p| p.is_shape()));
    assert!(tilt.payloads.iter().any(|p| matches!(
        p,
        Payload::Label { indicator: Indicator::Level, .. }
    )));
    assert!(tilt.payloads.iter().any(|p| matches!(
        p,
        Payload::Label { indicator: Indicator::Children, .. }
    )));
    assert!(tilt.payloads.iter().any(|p| matches!(
        p,
        Payload::Shape { target: ShapeRef::Icon(0), motion: Motion::Wiggle }
    )));
}

#[test]
fn given_labels_when_scheduling_then_never_in_an_event_of_their_own() {
    let timeline = raise_timeline(&scheduler(guitar_player()), "((())())");

    for event in timeline.iter() {
        if event.payloads.iter().any(Payload::is_label) {
            assert!(event.payloads.iter().any(Payload::is_shape));
        }
    }
}

#[test]
fn given_guitar_player_when_scheduling_raise_then_notes_follow_merged_depth() {
    let timeline = raise_timeline(&scheduler(guitar_player()), "((()))");

    // Merges bottom-up: the innermost leaf (depth 0), its parent (depth 1), then
    // the group onto the root (depth 2)
    let expected: Vec<String> = ["C", "D", "E"]
        .iter()
        .map(|note| {
            Path::new("samples")
                .join("guitar")
                .join(note)
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    assert_eq!(samples(&timeline), expected);
}

#[test]
fn given_same_seed_when_scheduling_twice_then_timelines_are_equal() {
    let player = Arc::new(
        SonificationMapper::new(
            vec![by_name("bass").unwrap(), by_name("drums").unwrap()],
            vec![0.5, 0.5],
            Vec::new(),
            PlaybackMode::Simultaneous,
            NoteSource::Children,
            PathBuf::from("samples"),
        )
        .unwrap(),
    );
    let scheduler = scheduler(player);

    let first = raise_timeline(&scheduler, "(()(()()))(())");
    let second = raise_timeline(&scheduler, "(()(()()))(())");

    assert_eq!(first, second);
}

fn base_places(timeline: &Timeline) -> Vec<f64> {
    timeline
        .iter()
        .flat_map(|e| e.payloads.iter())
        .filter_map(|p| match p {
            Payload::Shape {
                target: ShapeRef::Node(path),
                motion: Motion::Place { left, .. },
            } if path.is_empty() => Some(*left),
            _ => None,
        })
        .collect()
}

#[rstest]
#[case(MergeOrder::Reverse)]
#[case(MergeOrder::Forward)]
fn given_merge_order_when_scheduling_then_base_enters_and_follows_from_matching_side(
    #[case] order: MergeOrder,
) {
    let mut base = scene("(())()");
    let children = std::mem::take(&mut base.children);
    let (merged, plan) = TreeOps::default().merge_under_base(children, base, order);
    let layout = LayoutEngine::default();
    let placed = layout.place_on_stage(&merged);
    let (b, first, second) = (&placed[0], &placed[1], &placed[3]);
    let edge = layout.geometry().stage_edge;

    let timeline =
        scheduler(Arc::new(SilentPlayer)).schedule(&merged, &merged, &plan, &mut seeded_rng(1));

    let lefts = base_places(&timeline);
    assert_eq!(lefts.len(), 5, "edge, entry, one per child, center");
    match order {
        MergeOrder::Reverse => {
            assert_eq!(lefts[0], edge);
            assert!(lefts[1] >= second.right() - 1e-9);
            assert!((lefts[2] - second.left).abs() < 1e-9);
            assert!((lefts[3] - first.left).abs() < 1e-9);
        }
        MergeOrder::Forward => {
            assert!((lefts[0] - (-edge - b.width)).abs() < 1e-9);
            assert!(lefts[1] + b.width <= first.left + 1e-9);
            assert!((lefts[2] - (first.right() - b.width)).abs() < 1e-9);
            assert!((lefts[3] - (second.right() - b.width)).abs() < 1e-9);
        }
    }
    assert!((lefts[4] - b.left).abs() < 1e-9);
}

#[rstest]
#[case(MergeOrder::Reverse, PI / 6.0, 2)]
#[case(MergeOrder::Forward, -PI / 6.0, 0)]
fn given_merge_order_when_scheduling_then_tilt_direction_and_ground_wiggle_follow_it(
    #[case] order: MergeOrder,
    #[case] tilt: f64,
    #[case] wiggles: usize,
) {
    let mut base = scene("()()");
    let children = std::mem::take(&mut base.children);
    let (merged, plan) = TreeOps::default().merge_under_base(children, base, order);

    let timeline =
        scheduler(Arc::new(SilentPlayer)).schedule(&merged, &merged, &plan, &mut seeded_rng(1));

    let payloads: Vec<&Payload> = timeline.iter().flat_map(|e| e.payloads.iter()).collect();
    let angles: Vec<f64> = payloads
        .iter()
        .filter_map(|p| match p {
            Payload::Shape {
                motion: Motion::Rotate { angle },
                ..
            } => Some(*angle),
            _ => None,
        })
        .collect();
    assert_eq!(angles, vec![tilt, -tilt, tilt, -tilt]);
    let ground = payloads
        .iter()
        .filter(|p| {
            matches!(
                p,
                Payload::Shape {
                    target: ShapeRef::Ground,
                    motion: Motion::Wiggle
                }
            )
        })
        .count();
    assert_eq!(ground, wiggles);
}

#[test]
fn given_no_effects_dir_when_scheduling_union_then_no_effect_sounds() {
    let mut tower = scene("(())(())");
    let before = tower.clone();
    let plan = TreeOps::default().union(&mut tower);
    let scheduler = scheduler(Arc::new(SilentPlayer));

    let timeline = scheduler.schedule(&before, &tower, &plan, &mut seeded_rng(1));

    assert!(samples(&timeline).is_empty());
    assert_eq!(timeline.count(EventKind::Sound), 2);
}

#[test]
fn given_effects_dir_when_scheduling_union_then_highlights_and_recenter_sound() {
    let mut tower = scene("(())(())");
    let before = tower.clone();
    let plan = TreeOps::default().union(&mut tower);
    let scheduler = scheduler(Arc::new(SilentPlayer)).with_effects("fx");

    let timeline = scheduler.schedule(&before, &tower, &plan, &mut seeded_rng(1));

    let effects = samples(&timeline);
    let zoop = Path::new("fx").join("zoop.wav").to_string_lossy().into_owned();
    let whoosh = Path::new("fx").join("whoosh.wav").to_string_lossy().into_owned();
    assert_eq!(effects.iter().filter(|s| **s == zoop).count(), 2);
    assert_eq!(effects.iter().filter(|s| **s == whoosh).count(), 1);
}

#[test]
fn given_resize_when_scheduling_then_realignment_uses_resize_step() {
    let mut tower = scene("()()()()()()");
    let before = tower.clone();
    let plan = TreeOps::default().resize(&mut tower, &mut seeded_rng(TEST_SEED));
    let timing = Timing::default();

    let timeline =
        scheduler(Arc::new(SilentPlayer)).schedule(&before, &tower, &plan, &mut seeded_rng(1));

    for event in timeline.iter() {
        if event
            .payloads
            .iter()
            .any(|p| matches!(p, Payload::Shape { motion: Motion::AlignTop, .. }))
        {
            assert_eq!(event.duration, timing.resize_step);
        }
    }
}

#[test]
fn given_swap_when_scheduling_then_realignment_uses_step() {
    let mut tower = scene("(())()");
    let before = tower.clone();
    let plan = TreeOps::default().swap_subtowers(&mut tower, 0, 1);
    let timing = Timing::default();

    let timeline =
        scheduler(Arc::new(SilentPlayer)).schedule(&before, &tower, &plan, &mut seeded_rng(1));

    let aligned: Vec<f64> = timeline
        .iter()
        .filter(|e| {
            e.payloads
                .iter()
                .any(|p| matches!(p, Payload::Shape { motion: Motion::AlignTop, .. }))
        })
        .map(|e| e.duration)
        .collect();
    assert_eq!(aligned, vec![timing.step, timing.step]);
}

#[test]
fn given_empty_plan_when_scheduling_then_empty_timeline() {
    let mut tower = scene("()");
    let before = tower.clone();
    let plan = TreeOps::default().swap_subtowers(&mut tower, 0, 3);

    let timeline =
        scheduler(Arc::new(SilentPlayer)).schedule(&before, &tower, &plan, &mut seeded_rng(1));

    assert!(timeline.is_empty());
}

#[test]
fn given_null_panel_when_scheduling_then_no_labels() {
    let scheduler = EventScheduler::new(
        LayoutEngine::default(),
        Timing::default(),
        guitar_player(),
        Arc::new(NullPanel),
    );

    let timeline = raise_timeline(&scheduler, "(()())");

    assert!(!timeline
        .iter()
        .flat_map(|e| e.payloads.iter())
        .any(Payload::is_label));
}

// ============================================================
// bracket strings
// ============================================================

#[test]
fn given_bracket_string_when_sonifying_then_level_follows_nesting_modulo_scale() {
    let instrument = by_name("classic_guitar").unwrap();
    let scheduler = scheduler(Arc::new(SilentPlayer));

    let timeline = scheduler.schedule_string("(()))", &instrument, Path::new("samples"));

    let expected: Vec<String> = ["Ds", "Fs", "Ds", "Cs", "As"]
        .iter()
        .map(|note| {
            Path::new("samples")
                .join("classicguitar")
                .join(note)
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    assert_eq!(samples(&timeline), expected);
    assert_eq!(timeline.count(EventKind::Wait), 5);
    assert!((timeline.total_duration() - 5.0 * 0.2).abs() < 1e-9);
}

// ============================================================
// dispatch
// ============================================================

#[derive(Default)]
struct Recorder {
    renders: Mutex<Vec<(ShapeRef, Motion)>>,
    waits: Mutex<Vec<f64>>,
    sounds: Mutex<Vec<String>>,
    labels: Mutex<Vec<(Indicator, String)>>,
    fail_on_render: bool,
}

impl Renderer for Recorder {
    fn render(&self, shape: &ShapeRef, motion: &Motion, _duration: f64) -> io::Result<()> {
        if self.fail_on_render {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "display gone"));
        }
        self.renders
            .lock()
            .unwrap()
            .push((shape.clone(), motion.clone()));
        Ok(())
    }

    fn wait(&self, duration: f64) -> io::Result<()> {
        self.waits.lock().unwrap().push(duration);
        Ok(())
    }
}

impl AudioDevice for Recorder {
    fn play(&self, sample: &str, _gain: f64) -> io::Result<()> {
        self.sounds.lock().unwrap().push(sample.to_string());
        Ok(())
    }
}

impl LabelSink for Recorder {
    fn show(&self, indicator: Indicator, value: &str, _duration: f64) -> io::Result<()> {
        self.labels
            .lock()
            .unwrap()
            .push((indicator, value.to_string()));
        Ok(())
    }
}

#[test]
fn given_timeline_when_dispatching_then_every_payload_reaches_its_sink() {
    let timeline = raise_timeline(&scheduler(guitar_player()), "(()())");
    let recorder = Recorder::default();

    dispatch(&timeline, &recorder, &recorder, &recorder).expect("dispatch");

    let shapes = timeline
        .iter()
        .flat_map(|e| e.payloads.iter())
        .filter(|p| p.is_shape())
        .count();
    let labels = timeline
        .iter()
        .flat_map(|e| e.payloads.iter())
        .filter(|p| p.is_label())
        .count();
    let timed = timeline.len() - timeline.count(EventKind::Sound);
    assert_eq!(recorder.renders.lock().unwrap().len(), shapes);
    assert_eq!(recorder.labels.lock().unwrap().len(), labels);
    assert_eq!(*recorder.sounds.lock().unwrap(), samples(&timeline));
    assert_eq!(recorder.waits.lock().unwrap().len(), timed);
}

#[test]
fn given_failing_renderer_when_dispatching_then_operation_failed_names_event() {
    let timeline = raise_timeline(&scheduler(Arc::new(SilentPlayer)), "()");
    let recorder = Recorder {
        fail_on_render: true,
        ..Recorder::default()
    };

    let result = dispatch(&timeline, &recorder, &recorder, &recorder);

    match result {
        Err(ApplicationError::OperationFailed { context, .. }) => {
            assert_eq!(context, "render (event 0)");
        }
        other => panic!("expected operation failure, got {other:?}"),
    }
}

#[test]
fn given_raised_leaf_tower_when_scheduling_then_leaf_lands_on_ground() {
    let tower: Tower = scene("()");
    let plan = TreeOps::default().raise_tower(&tower);

    let timeline =
        scheduler(Arc::new(SilentPlayer)).schedule(&tower, &tower, &plan, &mut seeded_rng(1));

    let ground = towers::domain::Geometry::default().ground_level;
    let place = timeline
        .iter()
        .flat_map(|e| e.payloads.iter())
        .find_map(|p| match p {
            Payload::Shape {
                target: ShapeRef::Node(path),
                motion: Motion::Place { bottom, .. },
            } if path == &vec![0] => Some(*bottom),
            _ => None,
        })
        .expect("leaf placed");
    assert_eq!(place, ground);
}
