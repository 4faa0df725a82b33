use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Bitrate;

/// A video definition in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Resolution {
    /// Creates a new resolution.
    pub const fn new(width: u32, height: u32) -> Self {
        Resolution { width, height }
    }

    /// Total number of pixels, `width * height`.
    ///
    /// Two resolutions with swapped orientation (portrait/landscape) have the same pixel count.
    pub fn pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// An encoder operating point.
///
/// Owned by the encoder. The controller receives a fresh list of these on every query and
/// never keeps them between adjustments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoConfiguration {
    /// Encoded resolution.
    pub resolution: Resolution,
    /// Frame rate.
    pub fps: f32,
    /// The bitrate the encoder needs to produce this resolution at acceptable quality. When
    /// the configuration is applied this is the output bitrate the encoder targets.
    pub required_bitrate: Bitrate,
    /// Upper bound for the output bitrate at this operating point.
    pub bitrate_limit: Bitrate,
}

impl VideoConfiguration {
    /// Creates a new configuration.
    pub const fn new(
        resolution: Resolution,
        fps: f32,
        required_bitrate: Bitrate,
        bitrate_limit: Bitrate,
    ) -> Self {
        VideoConfiguration {
            resolution,
            fps,
            required_bitrate,
            bitrate_limit,
        }
    }
}

impl fmt::Display for VideoConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {} fps (required: {}, limit: {})",
            self.resolution, self.fps, self.required_bitrate, self.bitrate_limit
        )
    }
}
