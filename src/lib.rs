//! `mixdown`: the numeric core of a voice-over/music mixing pipeline.
//!
//! This crate provides:
//! - Voice activity detection on decoded sample buffers
//! - Ducking plans (volume keyframes) derived from voice activity
//! - Volume automation with linear, exponential, Bézier and logarithmic curves
//! - Crossfades with power-preserving curve pairs
//! - Silence-gap detection and filling for finished timelines
//! - A voice + music mixer with peak safety
//!
//! Everything is batch, synchronous and stateless: callers hand in `f64` samples plus a
//! sample rate and get structured, serializable results back. Decoding, persistence and
//! any CLI/HTTP surface live in the host application.

// High-level API (most consumers should start here).
pub mod config;
pub mod mixdown;

// Sample containers and crate-wide errors.
pub mod buffer;
pub mod error;

// Analysis and automation stages, leaves first.
pub mod vad;
pub mod keyframes;
pub mod automation;

// Timeline utilities.
pub mod crossfade;
pub mod gaps;

// Voice + music mixdown.
pub mod mixer;

// Key/value records for persistence layers.
pub mod record;

// Logging configuration and control.
#[cfg(feature = "logging")]
pub mod logging;

pub use buffer::{AudioBuffer, AudioTrack};
pub use config::MixConfig;
pub use error::{Error, Result};
pub use mixdown::Mixdown;
