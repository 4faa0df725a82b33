//! Adaptive video quality control in Sans I/O style.
//!
//! A [`QualityController`] keeps an encoded video stream within the bandwidth the receiver reports
//! as sustainable (TMMBR, Temporary Maximum Media Stream Bit Rate Request). It retunes the
//! encoder's resolution, frame rate and output bitrate as the feedback moves.
//!
//! The controller does no I/O, reads no clock and has no internal threads. The host calls it from
//! its media loop:
//!
//! * [`QualityController::on_bandwidth_feedback`] whenever a new bandwidth value arrives.
//! * [`QualityController::on_tick`] periodically, or at [`QualityController::poll_timeout`].
//!
//! Both take the current [`Instant`][std::time::Instant] and the stream being controlled.
//!
//! # Hysteresis
//!
//! Congestion is acted on at once: a lower bandwidth may shrink the resolution straight away.
//! Higher bandwidth only tunes frame rate and bitrate at the current resolution and starts a
//! cooldown of 10 seconds. Each further increase restarts it, a decrease cancels it.
//! When the cooldown runs out the resolution may grow, but only to a configuration whose
//! required bitrate the bandwidth exceeds by 30%.
//!
//! A resolution change is a complete adjustment on its own. Frame rate and bitrate are tuned
//! by the next one, once the encoder runs at the new resolution.
//!
//! # Collaborators
//!
//! The host describes its pipeline to the controller through [`VideoStream`], [`Encoder`] and
//! [`Source`]. Choosing the best candidate configuration is up to a [`ConfigurationRanker`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

use thiserror::Error;

mod bitrate;
pub use bitrate::Bitrate;

mod video;
pub use video::{Resolution, VideoConfiguration};

mod pipeline;
pub use pipeline::{ConfigurationRanker, Encoder, Source, VideoStream};

mod controller;
pub use controller::{Adjustment, QualityController};

/// Errors reported by an [`Encoder`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EncoderError {
    /// The encoder refused the configuration.
    #[error("configuration rejected: {0}")]
    Rejected(String),
}
