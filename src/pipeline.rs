//! The media pipeline the controller drives.
//!
//! The controller owns none of these objects. The host passes its stream into every call, which
//! keeps the controller free of references that could outlive the stream.

use crate::{Bitrate, EncoderError, Resolution, VideoConfiguration};

/// A video encoder that supports reconfiguration of its operating point.
pub trait Encoder {
    /// The candidate configurations this encoder can run at.
    ///
    /// An empty list means the encoder does not support dynamic reconfiguration.
    fn configurations(&self) -> Vec<VideoConfiguration>;

    /// The configuration the encoder is currently running at.
    fn configuration(&self) -> VideoConfiguration;

    /// Apply a new configuration.
    fn set_configuration(&mut self, config: &VideoConfiguration) -> Result<(), EncoderError>;
}

/// The video source (camera, screen capture, …) feeding the encoder.
pub trait Source {
    /// Set the capture frame rate. Fire and forget.
    fn set_fps(&mut self, fps: f32);
}

/// A video stream under quality control.
pub trait VideoStream {
    /// Encoder type of this stream.
    type Encoder: Encoder;

    /// Source type of this stream.
    type Source: Source;

    /// The stream's encoder.
    fn encoder(&mut self) -> &mut Self::Encoder;

    /// The stream's source.
    fn source(&mut self) -> &mut Self::Source;

    /// Processing capacity available to the encoder, as a CPU count.
    fn cpu_count(&self) -> usize;

    /// Change the sent and preview resolution and force the frame rate.
    ///
    /// This restarts the source with the new definition. The stream's current bitrate is kept,
    /// the next adjustment will tune it for the new resolution.
    fn request_resolution_change(&mut self, resolution: Resolution, fps: f32);

    /// Record the frame rate the stream is now configured for.
    fn set_configured_fps(&mut self, fps: f32);
}

/// Picks the best configuration from an encoder's candidates.
pub trait ConfigurationRanker {
    /// Best configuration, any resolution, that fits `bitrate` given `cpu_count`.
    fn best_for_bitrate(
        &self,
        configs: &[VideoConfiguration],
        bitrate: Bitrate,
        cpu_count: usize,
    ) -> VideoConfiguration;

    /// Best configuration at a fixed `resolution` that fits `bitrate` given `cpu_count`.
    fn best_for_resolution_and_bitrate(
        &self,
        configs: &[VideoConfiguration],
        resolution: Resolution,
        cpu_count: usize,
        bitrate: Bitrate,
    ) -> VideoConfiguration;
}
