//! High-level API for running mixing operations with one shared configuration.
//!
//! We expose a single, ergonomic entry point (`Mixdown`) that wraps the lower-level
//! component functions:
//! - Construct once with a validated [`MixConfig`].
//! - Call any operation many times, from any number of threads (`Mixdown` is immutable).
//! - Each method forwards to its module function, so the pieces stay testable on their own.

use crate::automation::{self, ContinuityReport};
use crate::buffer::{AudioBuffer, AudioTrack};
use crate::config::MixConfig;
use crate::crossfade::{self, CrossfadeResult, CrossfadeSequenceResult, CrossfadeSpec};
use crate::error::Result;
use crate::gaps::{self, FillResult, FillSpec, Gap};
use crate::keyframes::{self, AudioKeyframe};
use crate::mixer::{self, MixResult};
use crate::vad::{self, VoiceSegment};

/// The main high-level mixing entry point.
#[derive(Debug, Clone, Default)]
pub struct Mixdown {
    config: MixConfig,
}

impl Mixdown {
    /// Create a `Mixdown` after validating `config`.
    ///
    /// We fail fast here so every later call can rely on sane settings.
    pub fn new(config: MixConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MixConfig {
        &self.config
    }

    /// Voice-active segments of `track`.
    pub fn detect_voice(&self, track: &AudioTrack) -> Result<Vec<VoiceSegment>> {
        vad::detect_voice_activity(track, &self.config.vad)
    }

    /// Ducking plan for `segments` over `total_duration` seconds.
    pub fn generate_keyframes(
        &self,
        segments: &[VoiceSegment],
        total_duration: f64,
    ) -> Vec<AudioKeyframe> {
        keyframes::generate_ducking_keyframes(segments, &self.config.ducking, total_duration)
    }

    /// Apply a keyframe plan to a mono buffer.
    pub fn apply_automation(&self, buffer: &AudioBuffer, plan: &[AudioKeyframe]) -> AudioBuffer {
        automation::apply_volume_automation(buffer, plan)
    }

    /// Check a keyframe plan for hard steps at `sample_rate`.
    pub fn check_continuity(
        &self,
        plan: &[AudioKeyframe],
        sample_rate: u32,
        tolerance: f64,
    ) -> ContinuityReport {
        automation::check_interpolation_continuity(plan, sample_rate, tolerance)
    }

    /// Crossfade two clips using the configured duration and curve.
    pub fn crossfade(&self, clip_a: &AudioTrack, clip_b: &AudioTrack) -> Result<CrossfadeResult> {
        crossfade::apply_crossfade(clip_a, clip_b, &self.crossfade_spec())
    }

    /// Crossfade two clips with an explicit spec.
    pub fn crossfade_with(
        &self,
        clip_a: &AudioTrack,
        clip_b: &AudioTrack,
        spec: &CrossfadeSpec,
    ) -> Result<CrossfadeResult> {
        crossfade::apply_crossfade(clip_a, clip_b, spec)
    }

    /// Crossfade an ordered list of clips using the configured duration and curve.
    pub fn crossfade_sequence(&self, clips: &[AudioTrack]) -> Result<CrossfadeSequenceResult> {
        crossfade::crossfade_sequence(clips, &self.crossfade_spec())
    }

    /// Silence gaps of at least `threshold_ms` in `buffer`.
    pub fn detect_gaps(&self, buffer: &AudioBuffer, threshold_ms: f64) -> Vec<Gap> {
        gaps::detect_gaps(buffer, threshold_ms, &self.config.gaps)
    }

    /// Detect and fill gaps in a finished timeline.
    pub fn fill_gaps(&self, timeline: &AudioTrack, spec: &FillSpec) -> Result<FillResult> {
        gaps::fill_gaps(timeline, spec, &self.config.gaps)
    }

    /// Duck `music` under `voice` and mix them.
    pub fn mix(&self, voice: &AudioTrack, music: &AudioTrack) -> Result<MixResult> {
        mixer::create_voice_music_mix(voice, music, &self.config)
    }

    fn crossfade_spec(&self) -> CrossfadeSpec {
        CrossfadeSpec::from(&self.config.crossfade)
    }
}
