//! Service container for dependency injection
//!
//! Selects capability implementations from the settings and wires up services.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::application::services::SceneService;
use crate::application::{
    ApplicationResult, IndicatorPanel, InstrumentPlayer, NullPanel, SilentPlayer,
    SonificationMapper, TowerPanel,
};
use crate::config::{DisplaySettings, Settings, SoundSettings};
use crate::domain::instrument;
use crate::infrastructure::traits::{
    AudioDevice, LabelSink, Renderer, TracingAudioDevice, TracingLabelSink, TracingRenderer,
};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    pub player: Arc<dyn InstrumentPlayer>,
    pub panel: Arc<dyn IndicatorPanel>,

    /// Playback boundary
    pub renderer: Arc<dyn Renderer>,
    pub audio: Arc<dyn AudioDevice>,
    pub labels: Arc<dyn LabelSink>,

    pub scene: SceneService,
}

impl ServiceContainer {
    /// Create a new service container with tracing playback implementations.
    pub fn new(settings: Settings, realtime: bool) -> ApplicationResult<Self> {
        Self::with_deps(
            settings,
            Arc::new(TracingRenderer::new(realtime)),
            Arc::new(TracingAudioDevice),
            Arc::new(TracingLabelSink),
        )
    }

    /// Create a service container with custom playback dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        renderer: Arc<dyn Renderer>,
        audio: Arc<dyn AudioDevice>,
        labels: Arc<dyn LabelSink>,
    ) -> ApplicationResult<Self> {
        let settings = Arc::new(settings);
        let player = build_player(&settings.sound)?;
        let panel = build_panel(&settings.display);
        let scene = SceneService::new(settings.clone(), player.clone(), panel.clone());

        Ok(Self {
            settings,
            player,
            panel,
            renderer,
            audio,
            labels,
            scene,
        })
    }

    /// Random source: the explicit seed, else the configured one, else entropy.
    pub fn rng(&self, seed: Option<u64>) -> StdRng {
        match seed.or(self.settings.sound.seed) {
            Some(seed) => {
                debug!(seed, "seeded random source");
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        }
    }
}

fn build_player(sound: &SoundSettings) -> ApplicationResult<Arc<dyn InstrumentPlayer>> {
    if !sound.enabled || sound.instruments.is_empty() {
        debug!("sound disabled, using silent player");
        return Ok(Arc::new(SilentPlayer));
    }
    let instruments = sound
        .instruments
        .iter()
        .map(|name| instrument::by_name(name))
        .collect::<Result<Vec<_>, _>>()?;
    let mapper = SonificationMapper::new(
        instruments,
        sound.probabilities.clone(),
        sound.gains.clone(),
        sound.mode,
        sound.note_source,
        sound.samples_dir.clone(),
    )?;
    Ok(Arc::new(mapper))
}

fn build_panel(display: &DisplaySettings) -> Arc<dyn IndicatorPanel> {
    if !(display.level || display.children || display.expression) {
        return Arc::new(NullPanel);
    }
    Arc::new(TowerPanel {
        level: display.level,
        children: display.children,
        expression: display.expression,
    })
}
