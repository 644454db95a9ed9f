//! Voice + music mixdown with automatic ducking.
//!
//! Pipeline: VAD on the voice → ducking keyframes → volume automation on the music →
//! zero-pad both to a common length → sum → peak safety.
//!
//! Peak safety only ever scales down: when the summed mix peaks above the configured
//! ceiling (0.95 by default) the whole mix is scaled so its peak lands exactly on the
//! ceiling, which keeps the relative dynamics intact.

use serde::Serialize;
use tracing::debug;

use crate::automation::apply_volume_automation;
use crate::buffer::{AudioBuffer, AudioTrack, peak};
use crate::config::MixConfig;
use crate::error::{Error, Result};
use crate::keyframes::{AudioKeyframe, generate_ducking_keyframes};
use crate::vad::{VoiceSegment, detect_voice_in_buffer};

/// Result of [`create_voice_music_mix`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MixResult {
    pub mixed_samples: Vec<f64>,
    pub sample_rate: u32,
    pub duration: f64,

    /// Voice activity found in the voice track.
    pub voice_segments: Vec<VoiceSegment>,

    /// Ducking plan applied to the music track.
    pub keyframes: Vec<AudioKeyframe>,

    /// Peak of the raw sum, before any scaling.
    pub peak_before_normalization: f64,

    /// Gain applied for peak safety (`1.0` when the raw sum was already under the ceiling).
    pub normalization_gain: f64,
}

impl MixResult {
    pub fn into_buffer(self) -> AudioBuffer {
        AudioBuffer::new(self.mixed_samples, self.sample_rate)
    }
}

/// Mix `voice` over `music`, ducking the music wherever voice is active.
///
/// Both tracks are downmixed to mono and must share a sample rate. The ducking plan spans
/// the music track's duration.
pub fn create_voice_music_mix(
    voice: &AudioTrack,
    music: &AudioTrack,
    cfg: &MixConfig,
) -> Result<MixResult> {
    if voice.sample_rate() != music.sample_rate() {
        return Err(Error::SampleRateMismatch {
            left: voice.sample_rate(),
            right: music.sample_rate(),
        });
    }
    let sample_rate = voice.sample_rate();
    if sample_rate == 0 {
        return Err(Error::config("sample rate must be positive"));
    }

    let voice = voice.require_mono("voice")?;
    let music = music.require_mono("music")?;

    let voice_segments = detect_voice_in_buffer(&voice, &cfg.vad)?;
    let keyframes = generate_ducking_keyframes(&voice_segments, &cfg.ducking, music.duration());
    let ducked = apply_volume_automation(&music, &keyframes);

    let mut mixed = sum_padded(voice.samples(), ducked.samples());

    let peak_before_normalization = peak(&mixed);
    let ceiling = cfg.mixer.peak_ceiling;
    let normalization_gain = if peak_before_normalization > ceiling {
        ceiling / peak_before_normalization
    } else {
        1.0
    };
    if normalization_gain != 1.0 {
        mixed.iter_mut().for_each(|s| *s *= normalization_gain);
    }

    let mixed = AudioBuffer::new(mixed, sample_rate);
    debug!(
        voice = voice.len(),
        music = music.len(),
        segments = voice_segments.len(),
        keyframes = keyframes.len(),
        normalization_gain,
        "voice/music mix complete"
    );

    Ok(MixResult {
        duration: mixed.duration(),
        mixed_samples: mixed.into_samples(),
        sample_rate,
        voice_segments,
        keyframes,
        peak_before_normalization,
        normalization_gain,
    })
}

/// Element-wise sum, treating the shorter input as zero-padded.
fn sum_padded(a: &[f64], b: &[f64]) -> Vec<f64> {
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut out = long.to_vec();
    for (o, s) in out.iter_mut().zip(short) {
        *o += s;
    }
    out
}
