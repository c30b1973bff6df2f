//! Scene service: parse, operate, schedule
//!
//! Wires the parser, the tree operations and the event scheduler behind one
//! entry point per use case. Operations act on the node at a path of the scene.

use std::path::PathBuf;
use std::sync::Arc;

use rand::RngCore;
use tracing::{debug, info, instrument};

use crate::application::panel::IndicatorPanel;
use crate::application::scheduler::EventScheduler;
use crate::application::sonification::InstrumentPlayer;
use crate::application::timeline::Timeline;
use crate::application::ApplicationResult;
use crate::config::Settings;
use crate::domain::instrument as instruments;
use crate::domain::{
    ExpressionParser, LayoutEngine, MergeOrder, OpKind, OpPlan, Tower, TreeOps,
};

/// Predicates for `select_subtowers`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Keep children deeper than the given depth
    DeeperThan(usize),
    /// Keep children with at least the given number of children
    FanoutAtLeast(usize),
    /// Keep children that are not empty
    NonEmpty,
}

impl Selection {
    pub fn keeps(&self, _node: &Tower, child: &Tower) -> bool {
        match *self {
            Selection::DeeperThan(depth) => child.depth() > depth,
            Selection::FanoutAtLeast(count) => child.fanout() >= count,
            Selection::NonEmpty => !child.is_leaf(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Raise,
    /// Raise the node's children onto a fresh container that replaces the node
    RaiseTowers { height: Option<f64> },
    /// Merge the node's children back onto it in the given order
    Merge { order: MergeOrder },
    Union,
    Dedup,
    DedupRecursive,
    Swap { i: usize, j: usize },
    Select(Selection),
    Resize,
    Successive { height: f64 },
}

/// Result of applying an operation to a scene.
#[derive(Debug, Clone)]
pub struct SceneOutcome {
    pub plan: OpPlan,
    pub timeline: Timeline,
}

pub struct SceneService {
    parser: ExpressionParser,
    ops: TreeOps,
    scheduler: EventScheduler,
    settings: Arc<Settings>,
}

impl SceneService {
    pub fn new(
        settings: Arc<Settings>,
        player: Arc<dyn InstrumentPlayer>,
        panel: Arc<dyn IndicatorPanel>,
    ) -> Self {
        let geometry = settings.geometry;
        let palette = settings.display.palette;
        let mut scheduler = EventScheduler::new(
            LayoutEngine::new(geometry),
            settings.timing,
            player,
            panel,
        );
        if settings.sound.enabled {
            scheduler = scheduler.with_effects(settings.sound.effects_dir.clone());
        }
        Self {
            parser: ExpressionParser::new(geometry, palette),
            ops: TreeOps::new(geometry, palette),
            scheduler,
            settings,
        }
    }

    pub fn scheduler(&self) -> &EventScheduler {
        &self.scheduler
    }

    /// Parse an expression into a laid-out scene standing on the ground base.
    pub fn build(&self, expression: &str) -> ApplicationResult<Tower> {
        let tower = self.parser.parse_expression(expression)?;
        info!(
            "built scene: {} nodes, depth {}",
            tower.count_descendants(),
            tower.depth()
        );
        Ok(tower)
    }

    /// Apply `operation` to the node at `at` and schedule its timeline.
    ///
    /// The scene is changed in place. Paths in the plan and the timeline are
    /// relative to the operated node.
    #[instrument(level = "debug", skip(self, scene, rng))]
    pub fn apply(
        &self,
        scene: &mut Tower,
        at: &[usize],
        operation: &Operation,
        rng: &mut dyn RngCore,
    ) -> ApplicationResult<SceneOutcome> {
        let node = scene.get_mut(at)?;
        let before = node.clone();

        let plan = match operation {
            Operation::Raise => self.ops.raise_tower(node),
            Operation::RaiseTowers { .. } if node.is_leaf() => OpPlan::empty(OpKind::RaiseTowers),
            Operation::RaiseTowers { height } => {
                let towers = std::mem::take(&mut node.children);
                let (container, plan) = self.ops.raise_towers(towers, *height);
                *node = container;
                plan
            }
            Operation::Merge { order } => {
                let children = std::mem::take(&mut node.children);
                let base = std::mem::replace(node, Tower::new(0.0, 0.0));
                let (merged, plan) = self.ops.merge_under_base(children, base, *order);
                *node = merged;
                plan
            }
            Operation::Union => self.ops.union(node),
            Operation::Dedup => self.ops.remove_duplicate_subtowers(node),
            Operation::DedupRecursive => self.ops.remove_duplicate_subtowers_recursively(node),
            Operation::Swap { i, j } => self.ops.swap_subtowers(node, *i, *j),
            Operation::Select(selection) => self
                .ops
                .select_subtowers(node, |parent, child| selection.keeps(parent, child)),
            Operation::Resize => self.ops.resize(node, &mut *rng),
            Operation::Successive { height } => {
                let (chained, plan) = self.ops.successive(node, *height);
                *node = chained;
                plan
            }
        };

        let timeline = self.scheduler.schedule(&before, node, &plan, rng);
        debug!(
            segments = plan.segments.len(),
            events = timeline.len(),
            "operation applied"
        );
        Ok(SceneOutcome { plan, timeline })
    }

    /// Timeline sonifying `text` character by character with one catalog instrument.
    pub fn play_string(&self, text: &str, instrument_name: &str) -> ApplicationResult<Timeline> {
        let instrument = instruments::by_name(instrument_name)?;
        let samples_dir: PathBuf = self.settings.sound.samples_dir.clone();
        Ok(self
            .scheduler
            .schedule_string(text, &instrument, &samples_dir))
    }
}
