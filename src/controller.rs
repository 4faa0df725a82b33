//! Bitrate driven video quality control.
//!
//! Reacts to receiver bandwidth feedback (TMMBR) by retuning the encoder. A drop in bandwidth is
//! acted on immediately and may shrink the resolution. A rise only retunes frame rate and bitrate
//! at the current resolution; the resolution is allowed to grow once the bandwidth has stayed up
//! for a full cooldown and then only with a safety margin.

use std::cmp::Ordering;
use std::time::{Duration, Instant};

use crate::pipeline::{ConfigurationRanker, Encoder, Source, VideoStream};
use crate::{Bitrate, Resolution};

/// How long bandwidth must stay elevated before resolution is allowed to grow.
const INCREASE_DELAY: Duration = Duration::from_secs(10);

/// Safety margin the bandwidth must exceed a candidate's required bitrate by before
/// resolution is allowed to grow.
const INCREASE_THRESHOLD: f64 = 1.3;

/// Outcome of one adjustment of the encoder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Adjustment {
    /// The encoder has no candidate configurations and cannot be reconfigured.
    Unsupported,

    /// The stream was asked to change resolution. Frame rate and bitrate are left for the next
    /// adjustment.
    ResolutionChanged {
        /// The new resolution.
        resolution: Resolution,
        /// The frame rate forced along with it.
        fps: f32,
    },

    /// Frame rate and bitrate were tuned at the current resolution.
    Tuned {
        /// The frame rate of the applied configuration.
        fps: f32,
        /// The output bitrate of the applied configuration.
        bitrate: Bitrate,
        /// Whether the frame rate differs from what the encoder ran at before.
        fps_changed: bool,
        /// Whether the encoder accepted the configuration.
        applied: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    /// No bandwidth feedback yet.
    NoFeedback,
    /// At least one feedback received.
    Tracking {
        last: Bitrate,
        /// Set while waiting out the cooldown before a resolution increase.
        increase_started: Option<Instant>,
    },
}

/// Adapts a video stream's encoder to the available bandwidth.
///
/// The controller has no internal threads or timers. The host feeds it bandwidth feedback via
/// [`QualityController::on_bandwidth_feedback`] and lets time move forward via
/// [`QualityController::on_tick`]. Calls for one controller must not overlap.
///
/// ```
/// # use std::time::{Duration, Instant};
/// # use vqc::*;
/// # struct Fixed;
/// # impl ConfigurationRanker for Fixed {
/// #     fn best_for_bitrate(&self, c: &[VideoConfiguration], _: Bitrate, _: usize) -> VideoConfiguration { c[0] }
/// #     fn best_for_resolution_and_bitrate(&self, c: &[VideoConfiguration], _: Resolution, _: usize, _: Bitrate) -> VideoConfiguration { c[0] }
/// # }
/// # struct Enc(VideoConfiguration);
/// # impl Encoder for Enc {
/// #     fn configurations(&self) -> Vec<VideoConfiguration> { vec![self.0] }
/// #     fn configuration(&self) -> VideoConfiguration { self.0 }
/// #     fn set_configuration(&mut self, c: &VideoConfiguration) -> Result<(), EncoderError> { self.0 = *c; Ok(()) }
/// # }
/// # struct Cam;
/// # impl Source for Cam { fn set_fps(&mut self, _: f32) {} }
/// # struct Stream(Enc, Cam);
/// # impl VideoStream for Stream {
/// #     type Encoder = Enc;
/// #     type Source = Cam;
/// #     fn encoder(&mut self) -> &mut Enc { &mut self.0 }
/// #     fn source(&mut self) -> &mut Cam { &mut self.1 }
/// #     fn cpu_count(&self) -> usize { 4 }
/// #     fn request_resolution_change(&mut self, _: Resolution, _: f32) {}
/// #     fn set_configured_fps(&mut self, _: f32) {}
/// # }
/// # let vga = VideoConfiguration::new(Resolution::new(640, 480), 30.0, Bitrate::kbps(500), Bitrate::kbps(800));
/// # let mut stream = Stream(Enc(vga), Cam);
/// let mut controller = QualityController::new(Fixed);
/// let start = Instant::now();
///
/// controller.on_bandwidth_feedback(&mut stream, Bitrate::kbps(600), start);
/// assert!(controller.is_increase_pending());
///
/// // Drive time forward until the cooldown fires.
/// while let Some(at) = controller.poll_timeout() {
///     controller.on_tick(&mut stream, at);
/// }
/// assert!(!controller.is_increase_pending());
/// ```
#[derive(Debug)]
pub struct QualityController<R> {
    ranker: R,
    state: State,
    /// Resolution last asked of the stream by us, the encoder may have moved since.
    last_requested_size: Option<Resolution>,
}

impl<R: ConfigurationRanker> QualityController<R> {
    /// Creates a controller picking configurations with `ranker`.
    pub fn new(ranker: R) -> Self {
        QualityController {
            ranker,
            state: State::NoFeedback,
            last_requested_size: None,
        }
    }

    /// The ranker used to pick configurations.
    pub fn ranker(&self) -> &R {
        &self.ranker
    }

    /// The last bandwidth feedback, `None` until the first arrives.
    pub fn last_bandwidth(&self) -> Option<Bitrate> {
        match self.state {
            State::NoFeedback => None,
            State::Tracking { last, .. } => Some(last),
        }
    }

    /// The resolution this controller last asked the stream for.
    pub fn last_requested_size(&self) -> Option<Resolution> {
        self.last_requested_size
    }

    /// Whether a resolution increase is waiting out its cooldown.
    pub fn is_increase_pending(&self) -> bool {
        self.increase_started().is_some()
    }

    fn increase_started(&self) -> Option<Instant> {
        match self.state {
            State::NoFeedback => None,
            State::Tracking {
                increase_started, ..
            } => increase_started,
        }
    }

    /// Handle new bandwidth feedback from the receiver.
    ///
    /// Returns the adjustment made, if one was attempted.
    pub fn on_bandwidth_feedback<S: VideoStream>(
        &mut self,
        stream: &mut S,
        tmmbr: Bitrate,
        now: Instant,
    ) -> Option<Adjustment> {
        let (last, increase_started) = match self.state {
            State::NoFeedback => {
                let current = stream.encoder().configuration();

                if tmmbr < current.required_bitrate {
                    info!(
                        "First TMMBR ({}) below required bitrate of current configuration ({}), reducing video quality",
                        tmmbr, current.required_bitrate
                    );
                    let adjustment = self.adjust_for_bitrate(stream, tmmbr, 1.0, false);
                    self.state = State::Tracking {
                        last: tmmbr,
                        increase_started: None,
                    };
                    return Some(adjustment);
                }

                // Any bandwidth is more than no bandwidth.
                (None, None)
            }
            State::Tracking {
                last,
                increase_started,
            } => (Some(last), increase_started),
        };

        let (increase_started, adjustment) = match last.map(|l| tmmbr.cmp(&l)) {
            None | Some(Ordering::Greater) => {
                debug!("TMMBR increased to {}, (re)starting increase cooldown", tmmbr);
                let adjustment = self.adjust_for_bitrate(stream, tmmbr, 1.0, true);
                (Some(now), Some(adjustment))
            }
            Some(Ordering::Less) => {
                if increase_started.is_some() {
                    debug!("Cancelling increase cooldown");
                }
                info!("Congestion detected ({}), reducing video quality", tmmbr);
                let adjustment = self.adjust_for_bitrate(stream, tmmbr, 1.0, false);
                (None, Some(adjustment))
            }
            Some(Ordering::Equal) => (increase_started, None),
        };

        self.state = State::Tracking {
            last: tmmbr,
            increase_started,
        };

        adjustment
    }

    /// Handle time moving forward.
    ///
    /// Should be called periodically, once a second is plenty, or at the instant given by
    /// [`QualityController::poll_timeout`].
    pub fn on_tick<S: VideoStream>(&mut self, stream: &mut S, now: Instant) -> Option<Adjustment> {
        let State::Tracking {
            last,
            increase_started: Some(started),
        } = self.state
        else {
            return None;
        };

        if now.saturating_duration_since(started) < INCREASE_DELAY {
            return None;
        }

        info!(
            "No further TMMBR ({}) received after {:?}, increasing video quality",
            last,
            INCREASE_DELAY
        );

        let adjustment = self.adjust_for_bitrate(stream, last, INCREASE_THRESHOLD, false);

        self.state = State::Tracking {
            last,
            increase_started: None,
        };

        Some(adjustment)
    }

    /// Alias of [`QualityController::on_tick`].
    pub fn handle_timeout<S: VideoStream>(
        &mut self,
        stream: &mut S,
        now: Instant,
    ) -> Option<Adjustment> {
        self.on_tick(stream, now)
    }

    /// The instant the pending resolution increase is due, if any.
    pub fn poll_timeout(&self) -> Option<Instant> {
        self.increase_started()?.checked_add(INCREASE_DELAY)
    }

    fn adjust_for_bitrate<S: VideoStream>(
        &mut self,
        stream: &mut S,
        bitrate: Bitrate,
        threshold: f64,
        fps_only: bool,
    ) -> Adjustment {
        let configs = stream.encoder().configurations();
        if configs.is_empty() {
            return Adjustment::Unsupported;
        }

        let mut current = stream.encoder().configuration();
        let cpu_count = stream.cpu_count();

        if !fps_only {
            // tmmbr >= required * threshold is the same as tmmbr / threshold >= required
            let target = bitrate.div_threshold(threshold);
            let best = self.ranker.best_for_bitrate(&configs, target, cpu_count);

            let resolution = best.resolution;
            if self.last_requested_size != Some(resolution)
                && resolution.pixels() != current.resolution.pixels()
            {
                info!(
                    "Changing video definition to {} at {} fps",
                    resolution, best.fps
                );

                stream.request_resolution_change(resolution, best.fps);
                self.last_requested_size = Some(resolution);

                return Adjustment::ResolutionChanged {
                    resolution,
                    fps: best.fps,
                };
            }
        }

        let best = self.ranker.best_for_resolution_and_bitrate(
            &configs,
            current.resolution,
            cpu_count,
            bitrate,
        );

        let fps_changed = current.fps != best.fps;
        if fps_changed {
            debug!("Bitrate update changes fps from {} to {}", current.fps, best.fps);
            current.fps = best.fps;
            stream.source().set_fps(best.fps);
            stream.set_configured_fps(best.fps);
        }

        let limit = bitrate.min(best.bitrate_limit);
        debug!("Changing video encoder's output bitrate to {}", limit);
        current.required_bitrate = limit;

        let applied = match stream.encoder().set_configuration(&current) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to apply fps and bitrate constraint: {}", e);
                false
            }
        };

        Adjustment::Tuned {
            fps: current.fps,
            bitrate: limit,
            fps_changed,
            applied,
        }
    }
}
