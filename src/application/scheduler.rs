//! Event scheduler: turns operation plans into timelines and plays timelines.
//!
//! Scheduling is pure apart from the random source handed to the instrument
//! player; the same tower, plan and seed always give the same timeline.

use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::RngCore;
use tracing::{debug, instrument, trace, warn};

use crate::application::error_ext::IoResultExt;
use crate::application::panel::IndicatorPanel;
use crate::application::sonification::{InstrumentPlayer, SoundCue};
use crate::application::timeline::{Event, EventKind, Motion, Payload, ShapeRef, Timeline, Timing};
use crate::application::ApplicationResult;
use crate::domain::palette::{EMPTY_COLOR, HIGHLIGHT_COLOR};
use crate::domain::parser::{is_close, is_open};
use crate::domain::{
    Addressing, Instrument, LayoutEngine, MergeOrder, NodePath, OpKind, OpPlan, PlacedNode, Step,
    Tower,
};
use crate::infrastructure::traits::{AudioDevice, LabelSink, Renderer};

/// Tilt of a child while it is being sonified.
const TILT: f64 = PI / 6.0;

pub const WHOOSH: &str = "whoosh.wav";
pub const ZOOP: &str = "zoop.wav";
pub const LASER: &str = "laser1.wav";
const LASER_GAIN: f64 = -4.0;

/// Placements of the tree a plan addresses.
struct Stage<'a> {
    op: OpKind,
    tower: &'a Tower,
    placed: BTreeMap<NodePath, PlacedNode>,
}

impl Stage<'_> {
    fn at(&self, path: &[usize]) -> Option<&PlacedNode> {
        let placed = self.placed.get(path);
        if placed.is_none() {
            warn!(?path, "no placement for path");
        }
        placed
    }

    fn node(&self, path: &[usize]) -> Option<&Tower> {
        self.tower.get(path).ok()
    }
}

fn sound_payloads(cues: &[SoundCue]) -> Vec<Payload> {
    cues.iter()
        .map(|cue| Payload::Sound {
            sample: cue.sample.clone(),
            gain: cue.gain,
        })
        .collect()
}

pub struct EventScheduler {
    layout: LayoutEngine,
    timing: Timing,
    player: Arc<dyn InstrumentPlayer>,
    panel: Arc<dyn IndicatorPanel>,
    /// Directory of the effect samples; `None` leaves effects out
    effects_dir: Option<PathBuf>,
}

impl EventScheduler {
    pub fn new(
        layout: LayoutEngine,
        timing: Timing,
        player: Arc<dyn InstrumentPlayer>,
        panel: Arc<dyn IndicatorPanel>,
    ) -> Self {
        Self {
            layout,
            timing,
            player,
            panel,
            effects_dir: None,
        }
    }

    pub fn with_effects(mut self, effects_dir: impl Into<PathBuf>) -> Self {
        self.effects_dir = Some(effects_dir.into());
        self
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Builds the timeline of `plan`.
    ///
    /// `before` and `after` are the operated node before and after the edit; the
    /// plan's addressing decides which one its paths refer to.
    #[instrument(level = "debug", skip_all, fields(op = ?plan.op))]
    pub fn schedule(
        &self,
        before: &Tower,
        after: &Tower,
        plan: &OpPlan,
        rng: &mut dyn RngCore,
    ) -> Timeline {
        let tower = match plan.addressing {
            Addressing::Source => before,
            Addressing::Result => after,
        };
        let placed = self
            .layout
            .place_on_stage(tower)
            .into_iter()
            .map(|p| (p.path.clone(), p))
            .collect();
        let stage = Stage {
            op: plan.op,
            tower,
            placed,
        };

        let mut timeline = Timeline::new(Some(plan.op));
        for step in plan.steps() {
            trace!(?step, "schedule step");
            self.schedule_step(step, &stage, rng, &mut timeline);
        }
        debug!(
            events = timeline.len(),
            duration = timeline.total_duration(),
            "timeline ready"
        );
        timeline
    }

    fn ground(&self) -> f64 {
        self.layout.geometry().ground_level
    }

    fn effect(&self, name: &str, gain: f64) -> Option<Event> {
        self.effects_dir.as_ref().map(|dir| {
            Event::sound(vec![Payload::Sound {
                sample: dir.join(name).to_string_lossy().into_owned(),
                gain,
            }])
        })
    }

    fn push_effect(&self, timeline: &mut Timeline, name: &str, gain: f64) {
        if let Some(event) = self.effect(name, gain) {
            timeline.push(event);
        }
    }

    fn schedule_step(
        &self,
        step: &Step,
        stage: &Stage<'_>,
        rng: &mut dyn RngCore,
        timeline: &mut Timeline,
    ) {
        let t = &self.timing;
        match step {
            Step::Ground { path } => {
                let Some(p) = stage.at(path) else { return };
                let mut payloads = vec![
                    Payload::node(path, Motion::Create),
                    Payload::node(
                        path,
                        Motion::Place {
                            left: p.left,
                            bottom: self.ground(),
                        },
                    ),
                ];
                payloads.extend(self.panel.expression("()", EMPTY_COLOR));
                timeline.push(Event::transition(t.transition, payloads));
            }
            Step::BaseEnter { base, order } => self.base_enter(base, *order, stage, timeline),
            Step::Merge {
                base,
                child,
                depth,
                fanout,
                sound_level,
                order,
            } => {
                let (Some(b), Some(c)) = (stage.at(base), stage.at(child)) else {
                    return;
                };
                // Forward merges tilt the other way and keep the base under the child's right edge
                let (tilt, base_left) = match order {
                    MergeOrder::Reverse => (TILT, c.left),
                    MergeOrder::Forward => (-TILT, c.right() - b.width),
                };
                timeline.push(Event::transition(
                    t.transition,
                    vec![Payload::node(
                        child,
                        Motion::Shift {
                            dx: 0.0,
                            dy: b.height,
                        },
                    )],
                ));

                let trigger = self.player.play(*sound_level, *fanout, rng);
                timeline.push(Event::sound(sound_payloads(&trigger.cues)));

                let mut feedback = vec![Payload::node(child, Motion::Rotate { angle: tilt })];
                feedback.extend(self.panel.instruments(&trigger.instruments));
                feedback.extend(self.panel.level(*depth));
                feedback.extend(self.panel.children(*fanout));
                timeline.push(Event::transition(t.transition, feedback));

                timeline.push(Event::wait(t.wiggle_pause));

                let mut settle = vec![
                    Payload::node(child, Motion::Rotate { angle: -tilt }),
                    Payload::node(
                        base,
                        Motion::Place {
                            left: base_left,
                            bottom: self.ground(),
                        },
                    ),
                ];
                if *order == MergeOrder::Reverse {
                    settle.push(Payload::shape(ShapeRef::Ground, Motion::Wiggle));
                }
                timeline.push(Event::transition(t.transition, settle));
            }
            Step::CenterBase { base } => {
                let (Some(b), Some(node)) = (stage.at(base), stage.node(base)) else {
                    return;
                };
                let mut payloads = vec![Payload::node(
                    base,
                    Motion::Place {
                        left: b.left,
                        bottom: self.ground(),
                    },
                )];
                payloads.extend(self.panel.expression(&node.expression(), node.color));
                timeline.push(Event::transition(t.transition, payloads));
                timeline.push(Event::wait(t.transition));
            }
            Step::Highlight { path } => {
                timeline.push(Event::transition(
                    t.step,
                    vec![Payload::node(path, Motion::Indicate)],
                ));
                self.push_effect(timeline, ZOOP, 0.0);
                timeline.push(Event::transition(
                    t.transition,
                    vec![Payload::node(
                        path,
                        Motion::Recolor {
                            color: HIGHLIGHT_COLOR,
                        },
                    )],
                ));
            }
            Step::Pause => timeline.push(Event::wait(t.highlight_pause)),
            Step::Dissolve { path } => {
                timeline.push(Event::transition(
                    t.step,
                    vec![Payload::node(path, Motion::Uncreate { subtree: false })],
                ));
            }
            Step::Drop { path, dy, depth } => {
                timeline.push(Event::transition(
                    t.drop,
                    vec![Payload::node(path, Motion::Shift { dx: 0.0, dy: *dy })],
                ));
                let trigger = self.player.play(*depth, 0, rng);
                timeline.push(Event::sound(sound_payloads(&trigger.cues)));

                let mut feedback = self.panel.instruments(&trigger.instruments);
                feedback.extend(self.panel.level(*depth));
                feedback.push(Payload::shape(ShapeRef::Ground, Motion::Wiggle));
                timeline.push(Event::transition(t.drop, feedback));
            }
            Step::Match { keep, remove } => {
                timeline.push(Event::transition(
                    t.step,
                    vec![Payload::node(keep, Motion::Indicate)],
                ));
                timeline.push(Event::transition(
                    t.step,
                    vec![Payload::node(remove, Motion::Indicate)],
                ));
                self.push_effect(timeline, LASER, LASER_GAIN);
                timeline.push(Event::transition(
                    t.step,
                    vec![Payload::node(remove, Motion::Uncreate { subtree: true })],
                ));
            }
            Step::Inspect { path } => {
                timeline.push(Event::transition(
                    t.step,
                    vec![Payload::node(path, Motion::Indicate)],
                ));
                self.push_effect(timeline, LASER, LASER_GAIN);
            }
            Step::Remove { path } => {
                timeline.push(Event::transition(
                    t.step,
                    vec![Payload::node(path, Motion::Uncreate { subtree: true })],
                ));
            }
            Step::Recenter { path, dx } => {
                self.push_effect(timeline, WHOOSH, 0.0);
                timeline.push(Event::transition(
                    t.recenter,
                    vec![Payload::shape(
                        ShapeRef::Children(path.clone()),
                        Motion::Shift { dx: *dx, dy: 0.0 },
                    )],
                ));
            }
            Step::Swap { first, second } => {
                self.push_effect(timeline, WHOOSH, 0.0);
                timeline.push(Event::transition(
                    t.step,
                    vec![Payload::node(
                        first,
                        Motion::SwapWith {
                            other: second.clone(),
                        },
                    )],
                ));
            }
            Step::ScaleWidth { path, factor } => {
                timeline.push(Event::transition(
                    t.resize_step,
                    vec![Payload::node(path, Motion::ScaleWidth { factor: *factor })],
                ));
            }
            Step::ScaleHeight { path, factor } => {
                timeline.push(Event::transition(
                    t.resize_step,
                    vec![Payload::node(path, Motion::ScaleHeight { factor: *factor })],
                ));
            }
            Step::AlignTop { path } => {
                let duration = match stage.op {
                    OpKind::Resize => t.resize_step,
                    _ => t.step,
                };
                timeline.push(Event::transition(
                    duration,
                    vec![Payload::node(path, Motion::AlignTop)],
                ));
            }
            Step::Shrink { path, factor } => {
                timeline.push(Event::transition(
                    t.transition,
                    vec![Payload::node(path, Motion::Scale { factor: *factor })],
                ));
            }
            Step::Duplicate { from, to } => {
                timeline.push(Event::transition(
                    t.transition,
                    vec![Payload::node(from, Motion::CopyTo { to: to.clone() })],
                ));
            }
            Step::Settle { path } => {
                let Some(node) = stage.node(path) else { return };
                let mut payloads = vec![Payload::node(path, Motion::Indicate)];
                payloads.extend(self.panel.expression(&node.expression(), node.color));
                timeline.push(Event::transition(t.transition, payloads));
                timeline.push(Event::wait(t.settle_pause));
            }
        }
    }

    /// The base appears at the stage edge, then slides next to the towers it is
    /// about to carry: to their right for reverse merges, to their left for
    /// forward ones.
    fn base_enter(
        &self,
        base: &[usize],
        order: MergeOrder,
        stage: &Stage<'_>,
        timeline: &mut Timeline,
    ) {
        let (Some(b), Some(node)) = (stage.at(base), stage.node(base)) else {
            return;
        };
        let spans: Vec<(f64, f64)> = (0..node.fanout())
            .filter_map(|index| {
                let mut path = base.to_vec();
                path.push(index);
                stage.at(&path).map(|p| (p.left, p.right()))
            })
            .collect();
        if spans.is_empty() {
            return;
        }
        let left = spans.iter().map(|s| s.0).fold(f64::INFINITY, f64::min);
        let right = spans.iter().map(|s| s.1).fold(f64::NEG_INFINITY, f64::max);
        let geometry = self.layout.geometry();
        let span = right - left + 2.0 * geometry.spacing;
        let (edge, entry) = match order {
            MergeOrder::Reverse => (geometry.stage_edge, right + span - b.width),
            MergeOrder::Forward => (-geometry.stage_edge - b.width, left - span),
        };
        let t = &self.timing;

        timeline.push(Event::transition(
            t.transition,
            vec![
                Payload::node(base, Motion::Create),
                Payload::node(
                    base,
                    Motion::Place {
                        left: edge,
                        bottom: self.ground(),
                    },
                ),
            ],
        ));
        timeline.push(Event::wait(t.transition));
        timeline.push(Event::transition(
            t.transition,
            vec![Payload::node(
                base,
                Motion::Place {
                    left: entry,
                    bottom: self.ground(),
                },
            )],
        ));
        timeline.push(Event::wait(t.transition));
    }

    /// Sonifies a bracket string character by character.
    ///
    /// An open bracket raises and a close bracket lowers a level kept modulo the
    /// instrument's scale length; every character sounds the note of the
    /// current level and is followed by a pause of `sound_time`.
    #[instrument(level = "debug", skip(self, instrument, samples_dir), fields(instrument = %instrument.name))]
    pub fn schedule_string(&self, text: &str, instrument: &Instrument, samples_dir: &Path) -> Timeline {
        let modulus = instrument.scale.len() as i64;
        let mut level: i64 = 0;
        let mut timeline = Timeline::new(None);
        for c in text.chars() {
            if is_open(c) {
                level += 1;
            } else if is_close(c) {
                level -= 1;
            }
            level = level.rem_euclid(modulus);

            let payloads = instrument
                .samples(level as usize, samples_dir)
                .into_iter()
                .map(|sample| Payload::Sound { sample, gain: 0.0 })
                .collect();
            timeline.push(Event::sound(payloads));
            timeline.push(Event::wait(self.timing.sound_time));
        }
        timeline
    }
}

/// Plays `timeline` in order.
///
/// Shape motions of a transition are started together, its labels are shown
/// for the same duration, and the renderer then waits for the transition to
/// finish. Sounds are fire-and-forget.
pub fn dispatch(
    timeline: &Timeline,
    renderer: &dyn Renderer,
    audio: &dyn AudioDevice,
    labels: &dyn LabelSink,
) -> ApplicationResult<()> {
    for (index, event) in timeline.iter().enumerate() {
        for payload in &event.payloads {
            match payload {
                Payload::Shape { target, motion } => renderer
                    .render(target, motion, event.duration)
                    .with_event_context("render", index)?,
                Payload::Sound { sample, gain } => audio
                    .play(sample, *gain)
                    .with_event_context("play sound", index)?,
                Payload::Label {
                    indicator, value, ..
                } => labels
                    .show(*indicator, value, event.duration)
                    .with_event_context("show label", index)?,
            }
        }
        if event.kind != EventKind::Sound {
            renderer
                .wait(event.duration)
                .with_event_context("wait", index)?;
        }
    }
    debug!("dispatched {} events", timeline.len());
    Ok(())
}
