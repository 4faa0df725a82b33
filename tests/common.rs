#![allow(unused)]
use std::cell::RefCell;
use std::sync::Once;
use std::time::{Duration, Instant};

use vqc::{Bitrate, ConfigurationRanker, Encoder, EncoderError, Resolution, Source};
use vqc::{VideoConfiguration, VideoStream};

pub const QVGA: Resolution = Resolution::new(320, 240);
pub const VGA: Resolution = Resolution::new(640, 480);
pub const HD: Resolution = Resolution::new(1280, 720);

pub fn init_log() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    static START: Once = Once::new();

    START.call_once(|| {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(env_filter)
            .init();
    });
}

pub fn conf(resolution: Resolution, fps: f32, required_kbps: u64, limit_kbps: u64) -> VideoConfiguration {
    VideoConfiguration::new(
        resolution,
        fps,
        Bitrate::kbps(required_kbps),
        Bitrate::kbps(limit_kbps),
    )
}

/// A small ladder, highest quality first.
pub fn ladder() -> Vec<VideoConfiguration> {
    vec![
        conf(HD, 30.0, 1_000, 1_500),
        conf(VGA, 30.0, 500, 800),
        conf(VGA, 15.0, 350, 500),
        conf(QVGA, 15.0, 150, 300),
    ]
}

/// A ranking request seen by [`LadderRanker`].
#[derive(Debug, Clone, PartialEq)]
pub enum Ranked {
    /// Resolution search.
    ByBitrate(Bitrate),
    /// Frame rate and bitrate search at a fixed resolution.
    BySize(Resolution, Bitrate),
}

/// Picks the first candidate whose required bitrate fits, falling back to the last one.
#[derive(Default)]
pub struct LadderRanker {
    pub calls: RefCell<Vec<Ranked>>,
}

impl LadderRanker {
    pub fn take_calls(&self) -> Vec<Ranked> {
        self.calls.borrow_mut().drain(..).collect()
    }
}

impl ConfigurationRanker for LadderRanker {
    fn best_for_bitrate(
        &self,
        configs: &[VideoConfiguration],
        bitrate: Bitrate,
        _cpu_count: usize,
    ) -> VideoConfiguration {
        self.calls.borrow_mut().push(Ranked::ByBitrate(bitrate));
        configs
            .iter()
            .find(|c| c.required_bitrate <= bitrate)
            .or_else(|| configs.last())
            .copied()
            .expect("non-empty configuration list")
    }

    fn best_for_resolution_and_bitrate(
        &self,
        configs: &[VideoConfiguration],
        resolution: Resolution,
        _cpu_count: usize,
        bitrate: Bitrate,
    ) -> VideoConfiguration {
        self.calls
            .borrow_mut()
            .push(Ranked::BySize(resolution, bitrate));
        let same_size: Vec<_> = configs
            .iter()
            .filter(|c| c.resolution == resolution)
            .collect();
        same_size
            .iter()
            .find(|c| c.required_bitrate <= bitrate)
            .or_else(|| same_size.last())
            .map(|c| **c)
            .unwrap_or(configs[0])
    }
}

/// Something the controller did to the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ResolutionChange(Resolution, f32),
    SourceFps(f32),
    ConfiguredFps(f32),
    Applied(VideoConfiguration),
    Rejected(VideoConfiguration),
}

pub struct TestEncoder {
    pub list: Vec<VideoConfiguration>,
    pub current: VideoConfiguration,
    pub reject: bool,
    actions: Vec<Action>,
}

impl Encoder for TestEncoder {
    fn configurations(&self) -> Vec<VideoConfiguration> {
        self.list.clone()
    }

    fn configuration(&self) -> VideoConfiguration {
        self.current
    }

    fn set_configuration(&mut self, config: &VideoConfiguration) -> Result<(), EncoderError> {
        if self.reject {
            self.actions.push(Action::Rejected(*config));
            return Err(EncoderError::Rejected("busy".into()));
        }
        self.current = *config;
        self.actions.push(Action::Applied(*config));
        Ok(())
    }
}

#[derive(Default)]
pub struct TestSource {
    actions: Vec<Action>,
}

impl Source for TestSource {
    fn set_fps(&mut self, fps: f32) {
        self.actions.push(Action::SourceFps(fps));
    }
}

pub struct TestStream {
    pub encoder: TestEncoder,
    pub source: TestSource,
    actions: Vec<Action>,
}

impl TestStream {
    pub fn new(current: VideoConfiguration) -> Self {
        Self::with_list(current, ladder())
    }

    pub fn with_list(current: VideoConfiguration, list: Vec<VideoConfiguration>) -> Self {
        TestStream {
            encoder: TestEncoder {
                list,
                current,
                reject: false,
                actions: vec![],
            },
            source: TestSource::default(),
            actions: vec![],
        }
    }

    /// Mimic the source restarting at the requested resolution.
    pub fn switch_to(&mut self, resolution: Resolution, fps: f32) {
        self.encoder.current.resolution = resolution;
        self.encoder.current.fps = fps;
    }

    /// All actions since last call, in the order stream, source, encoder.
    pub fn take_actions(&mut self) -> Vec<Action> {
        let mut all: Vec<Action> = self.actions.drain(..).collect();
        all.extend(self.source.actions.drain(..));
        all.extend(self.encoder.actions.drain(..));
        all
    }

    pub fn resolution_changes(&self) -> Vec<(Resolution, f32)> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                Action::ResolutionChange(r, f) => Some((*r, *f)),
                _ => None,
            })
            .collect()
    }
}

impl VideoStream for TestStream {
    type Encoder = TestEncoder;
    type Source = TestSource;

    fn encoder(&mut self) -> &mut TestEncoder {
        &mut self.encoder
    }

    fn source(&mut self) -> &mut TestSource {
        &mut self.source
    }

    fn cpu_count(&self) -> usize {
        4
    }

    fn request_resolution_change(&mut self, resolution: Resolution, fps: f32) {
        self.actions.push(Action::ResolutionChange(resolution, fps));
    }

    fn set_configured_fps(&mut self, fps: f32) {
        self.actions.push(Action::ConfiguredFps(fps));
    }
}

/// Tick once a second from `from` (exclusive) for `secs` seconds.
pub fn ticks(from: Instant, secs: u64) -> impl Iterator<Item = Instant> {
    (1..=secs).map(move |s| from + Duration::from_secs(s))
}
