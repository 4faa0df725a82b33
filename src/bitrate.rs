use std::fmt;

use serde::{Deserialize, Serialize};

/// A data rate expressed as bits per second (bps).
///
/// Bandwidth feedback arrives as whole bits per second and the encoder is configured in the
/// same unit, so unlike an estimator's internal rate this is kept as an integer.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Bitrate(u64);

impl Bitrate {
    /// Zero bits per second.
    pub const ZERO: Self = Self::bps(0);

    /// Create a bitrate from bits per second.
    pub const fn bps(bps: u64) -> Self {
        Bitrate(bps)
    }

    /// Create a bitrate from kilobits per second, saturating at `u64::MAX` bits.
    pub const fn kbps(kbps: u64) -> Self {
        Self::bps(kbps.saturating_mul(1_000))
    }

    /// Create a bitrate from megabits per second, saturating at `u64::MAX` bits.
    pub const fn mbps(mbps: u64) -> Self {
        Self::bps(mbps.saturating_mul(1_000_000))
    }

    /// The rate in bits per second.
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// The rate in bits per second as a float.
    pub fn as_f64(&self) -> f64 {
        self.0 as f64
    }

    /// Divide by a conservatism threshold, truncating toward zero.
    ///
    /// `tmmbr >= required * threshold` is the same as `tmmbr / threshold >= required`,
    /// which is the form the resolution search is fed.
    pub fn div_threshold(&self, threshold: f64) -> Self {
        Bitrate((self.0 as f64 / threshold) as u64)
    }
}

impl From<u64> for Bitrate {
    fn from(value: u64) -> Self {
        Self::bps(value)
    }
}

impl fmt::Display for Bitrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rate = self.0 as f64;
        // log10 of 0 is -inf, which saturates to 0 in the cast.
        let log = rate.log10().floor() as u64;

        match log {
            0..=2 => write!(f, "{rate}bit/s"),
            3..=5 => write!(f, "{:.3}kbit/s", rate / 10.0_f64.powf(3.0)),
            6..=8 => write!(f, "{:.3}Mbit/s", rate / 10.0_f64.powf(6.0)),
            9.. => write!(f, "{:.3}Gbit/s", rate / 10.0_f64.powf(9.0)),
        }
    }
}
